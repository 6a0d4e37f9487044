use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::events::RawEvent;
use crate::stores::{EventStore, StoreError};

/// Newest-first event messages for one member key. `message` holds the JSON
/// event body; the cast lets the column be `text`, `json` or `jsonb`.
const RECENT_EVENTS_QUERY: &str = r#"
    SELECT message::text
    FROM user_events
    WHERE user_key = $1
    ORDER BY time DESC
    LIMIT $2
"#;

pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn recent_events(&self, key: &str, limit: u32) -> Result<Vec<RawEvent>, StoreError> {
        if self.pool.is_closed() {
            return Err(StoreError::Closed);
        }

        let messages: Vec<String> = sqlx::query_scalar(RECENT_EVENTS_QUERY)
            .bind(key)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        decode_messages(&messages)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Event store connection closed");
    }
}

/// Decodes every message, failing on the first malformed one.
fn decode_messages(messages: &[String]) -> Result<Vec<RawEvent>, StoreError> {
    messages
        .iter()
        .map(|m| serde_json::from_str::<RawEvent>(m).map_err(StoreError::from))
        .collect()
}
