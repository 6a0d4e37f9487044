use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::stores::{CohortStore, StoreError};

/// Members whose profile changed within the lookback window. `company_id` is
/// compared as text so the tenant bind works for integer and text columns.
const ACTIVE_MEMBERS_QUERY: &str = r#"
    SELECT user_uuid::text
    FROM user_profile
    WHERE company_id::text = $1
      AND updated_at >= now()::date - interval '15 days'
    LIMIT $2
"#;

pub struct PgCohortStore {
    pool: PgPool,
}

impl PgCohortStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CohortStore for PgCohortStore {
    async fn active_members(&self, tenant: &str, limit: u32) -> Result<Vec<String>, StoreError> {
        if self.pool.is_closed() {
            return Err(StoreError::Closed);
        }

        let members: Vec<String> = sqlx::query_scalar(ACTIVE_MEMBERS_QUERY)
            .bind(tenant)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(members)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Cohort store connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_compared_as_text() {
        assert!(ACTIVE_MEMBERS_QUERY.contains("company_id::text = $1"));
        assert!(ACTIVE_MEMBERS_QUERY.contains("interval '15 days'"));
        assert!(ACTIVE_MEMBERS_QUERY.contains("LIMIT $2"));
    }
}
