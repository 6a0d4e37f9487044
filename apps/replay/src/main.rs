mod config;
mod db;
mod errors;
mod events;
mod metrics;
mod payload;
mod pipeline;
mod scoring_client;
mod stores;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::errors::PipelineError;
use crate::metrics::{GaugeSink, NoopSink, StatsdSink};
use crate::pipeline::{Pipeline, RunOptions};
use crate::scoring_client::HttpScoringClient;
use crate::stores::{PgCohortStore, PgEventStore, StoreError};

/// Replays recent member event histories against the scoring service's
/// transform endpoint and reports round-trip latency.
#[derive(Parser)]
#[command(name = "replay", version, about)]
struct Cli {
    /// Tenant whose cohort is replayed (defaults to DEFAULT_TENANT).
    tenant: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Logs go to stderr; stdout carries the per-member report.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting replay v{}", env!("CARGO_PKG_VERSION"));

    let tenant = cli.tenant.unwrap_or_else(|| config.default_tenant.clone());
    info!("Replaying cohort for tenant {tenant}");

    let scoring = HttpScoringClient::new(&config.scoring_base_url, config.scoring_timeout)?;
    info!("Scoring endpoint: {}", scoring.endpoint(&tenant));

    let metrics: Box<dyn GaugeSink> =
        match StatsdSink::connect(&config.statsd_addr, &config.metric_prefix).await {
            Ok(sink) => Box::new(sink),
            Err(e) => {
                warn!("StatsD sink unavailable, latency gauges disabled: {e}");
                Box::new(NoopSink)
            }
        };

    let (cohort, events) = match open_stores(&config).await {
        Ok(stores) => stores,
        Err(e) => {
            metrics.close().await;
            return Err(e.into());
        }
    };

    let outcome = Pipeline::new(
        &cohort,
        &events,
        &scoring,
        metrics.as_ref(),
        RunOptions::from_config(&config, tenant),
    )
    .execute()
    .await;

    metrics.close().await;

    let summary = outcome?;
    info!(
        "Run complete: {} members, {} payloads sent, {} tokens, {} timestamp fallbacks, {} failures, mean latency {:?}",
        summary.members,
        summary.payloads_sent,
        summary.tokens,
        summary.timestamp_fallbacks,
        summary.failures.len(),
        summary.mean_latency().unwrap_or_default()
    );
    for failure in &summary.failures {
        warn!(
            "Skipped {}: {}",
            failure.member_ids.join(","),
            failure.error
        );
    }

    Ok(())
}

/// Opens both store pools. If the second fails the first is closed again.
async fn open_stores(config: &Config) -> Result<(PgCohortStore, PgEventStore), PipelineError> {
    let cohort_pool = create_pool("cohort", &config.cohort_database_url)
        .await
        .map_err(|e| PipelineError::Connection {
            store: "cohort",
            source: StoreError::Database(e),
        })?;

    let event_pool = match create_pool("event", &config.event_database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            cohort_pool.close().await;
            return Err(PipelineError::Connection {
                store: "event",
                source: StoreError::Database(e),
            });
        }
    };

    Ok((PgCohortStore::new(cohort_pool), PgEventStore::new(event_pool)))
}
