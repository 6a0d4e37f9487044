/// Scoring client: the only code that talks to the transform endpoint.
///
/// One call = one POST of an already-serialized payload. Latency is measured
/// from just before the request goes out until the response body has been
/// fully drained. There is no retry.
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The call completed, so `elapsed` is still a valid latency sample.
    #[error("Scoring service returned status {status} ({drained_bytes} bytes drained)")]
    Status {
        status: u16,
        drained_bytes: usize,
        elapsed: Duration,
    },
}

/// Outcome of one successful call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transmission {
    pub elapsed: Duration,
    pub status: u16,
    pub drained_bytes: usize,
}

#[async_trait]
pub trait ScoringClient: Send + Sync {
    /// Sends `body` (a JSON payload) to the tenant's transform endpoint.
    async fn transform(&self, tenant: &str, body: Vec<u8>) -> Result<Transmission, ScoringError>;
}

#[derive(Clone)]
pub struct HttpScoringClient {
    client: Client,
    base_url: String,
}

impl HttpScoringClient {
    /// `timeout` of `None` leaves the transport's own behaviour in place.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ScoringError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, tenant: &str) -> String {
        format!("{}/transform_{}", self.base_url, tenant)
    }
}

#[async_trait]
impl ScoringClient for HttpScoringClient {
    async fn transform(&self, tenant: &str, body: Vec<u8>) -> Result<Transmission, ScoringError> {
        let request = self
            .client
            .post(self.endpoint(tenant))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .build()?;

        let start = Instant::now();

        let mut response = self.client.execute(request).await?;
        let status = response.status();

        let mut drained_bytes = 0;
        while let Some(chunk) = response.chunk().await? {
            drained_bytes += chunk.len();
        }

        let elapsed = start.elapsed();

        if !status.is_success() {
            return Err(ScoringError::Status {
                status: status.as_u16(),
                drained_bytes,
                elapsed,
            });
        }

        debug!(
            "Transform call succeeded: status={}, drained_bytes={}, elapsed={:?}",
            status, drained_bytes, elapsed
        );

        Ok(Transmission {
            elapsed,
            status: status.as_u16(),
            drained_bytes,
        })
    }
}
