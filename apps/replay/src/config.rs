use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// What the driver does when a single member's retrieval or transmission fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole run on the first failing member.
    #[default]
    FailFast,
    /// Log the failure, record it in the run summary and move on.
    Isolate,
}

impl FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fail_fast" => Ok(FailurePolicy::FailFast),
            "isolate" => Ok(FailurePolicy::Isolate),
            other => bail!("Unknown failure policy '{other}' (expected 'fail_fast' or 'isolate')"),
        }
    }
}

/// Runtime configuration loaded from environment variables.
/// The two store connection strings are required; everything else has a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub cohort_database_url: String,
    pub event_database_url: String,
    pub scoring_base_url: String,
    pub scoring_timeout: Option<Duration>,
    pub statsd_addr: String,
    pub metric_prefix: String,
    pub metric_name: String,
    pub default_tenant: String,
    pub cohort_limit: u32,
    pub event_limit: u32,
    pub rows_per_payload: usize,
    pub failure_policy: FailurePolicy,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let rows_per_payload = or_default("ROWS_PER_PAYLOAD", "1")
            .parse::<usize>()
            .context("ROWS_PER_PAYLOAD must be a positive integer")?;
        if rows_per_payload == 0 {
            bail!("ROWS_PER_PAYLOAD must be at least 1");
        }

        let scoring_timeout = var("SCORING_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>().map(Duration::from_secs))
            .transpose()
            .context("SCORING_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Config {
            cohort_database_url: require("COHORT_DATABASE_URL")?,
            event_database_url: require("EVENT_DATABASE_URL")?,
            scoring_base_url: or_default("SCORING_BASE_URL", "http://localhost:65327"),
            scoring_timeout,
            statsd_addr: or_default("STATSD_ADDR", "127.0.0.1:8125"),
            metric_prefix: or_default("METRIC_PREFIX", ""),
            metric_name: or_default("METRIC_NAME", "mleap.gauge"),
            default_tenant: or_default("DEFAULT_TENANT", "4894"),
            cohort_limit: or_default("COHORT_LIMIT", "1000")
                .parse::<u32>()
                .context("COHORT_LIMIT must be a non-negative integer")?,
            event_limit: or_default("EVENT_LIMIT", "1000")
                .parse::<u32>()
                .context("EVENT_LIMIT must be a non-negative integer")?,
            rows_per_payload,
            failure_policy: or_default("FAILURE_POLICY", "fail_fast").parse()?,
            rust_log: or_default("RUST_LOG", "info"),
        })
    }
}
