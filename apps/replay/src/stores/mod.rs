//! Store adapters the pipeline reads from.
//!
//! The driver only sees the [`CohortStore`] and [`EventStore`] traits; the
//! Postgres-backed implementations live in the submodules.

use async_trait::async_trait;
use thiserror::Error;

use crate::events::RawEvent;

pub mod cohort;
pub mod events;

pub use cohort::PgCohortStore;
pub use events::PgEventStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Malformed event message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Store connection is closed")]
    Closed,
}

/// Source of the members to replay for a tenant.
#[async_trait]
pub trait CohortStore: Send + Sync {
    /// Up to `limit` recently active members, in the store's order.
    async fn active_members(&self, tenant: &str, limit: u32) -> Result<Vec<String>, StoreError>;

    /// Releases the connection. Called exactly once, at teardown.
    async fn close(&self);
}

/// Source of raw member event histories.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Up to `limit` events for `key`, newest first.
    async fn recent_events(&self, key: &str, limit: u32) -> Result<Vec<RawEvent>, StoreError>;

    /// Releases the connection. Called exactly once, at teardown.
    async fn close(&self);
}

/// Event store key for a member: `<memberId>_<tenant>`.
pub fn composite_key(member_id: &str, tenant: &str) -> String {
    format!("{member_id}_{tenant}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_key() {
        assert_eq!(composite_key("u1", "4894"), "u1_4894");
        assert_eq!(composite_key("a_b", "7"), "a_b_7");
    }
}
