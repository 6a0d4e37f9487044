use thiserror::Error;

use crate::scoring_client::ScoringError;
use crate::stores::StoreError;

/// Fatal pipeline errors. Unparseable timestamps never appear here; the
/// encoder recovers from those on its own.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Store connection failed ({store}): {source}")]
    Connection {
        store: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Cohort query failed for tenant {tenant}: {source}")]
    Cohort {
        tenant: String,
        #[source]
        source: StoreError,
    },

    #[error("Event query failed for member {member_id}: {source}")]
    Events {
        member_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transmission failed for member {member_id}: {source}")]
    Transmission {
        member_id: String,
        #[source]
        source: ScoringError,
    },
}

impl PipelineError {
    /// Errors that stop the run even when per-member isolation is enabled.
    pub fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::Connection { .. } | PipelineError::Cohort { .. }
        )
    }
}
