//! Pipeline driver: runs one tenant's cohort through the scoring service.
//!
//! `RetrieveCohort -> (RetrieveEvents -> Filter -> Encode -> Transmit)* -> Teardown`
//!
//! Members are handled one at a time in the order the cohort store returns
//! them. Under [`FailurePolicy::FailFast`] the first failing member ends the
//! run; teardown (closing both stores) happens on every path through
//! [`Pipeline::execute`].

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{Config, FailurePolicy};
use crate::errors::PipelineError;
use crate::events::retain_recognized;
use crate::metrics::GaugeSink;
use crate::payload::{build_row, encode_payload, Row};
use crate::pipeline::summary::{MemberFailure, RunSummary};
use crate::scoring_client::{ScoringClient, ScoringError};
use crate::stores::{composite_key, CohortStore, EventStore};

const GAUGE_SAMPLE_RATE: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub tenant: String,
    pub cohort_limit: u32,
    pub event_limit: u32,
    pub rows_per_payload: usize,
    pub failure_policy: FailurePolicy,
    pub metric_name: String,
}

impl RunOptions {
    pub fn from_config(config: &Config, tenant: String) -> Self {
        Self {
            tenant,
            cohort_limit: config.cohort_limit,
            event_limit: config.event_limit,
            rows_per_payload: config.rows_per_payload,
            failure_policy: config.failure_policy,
            metric_name: config.metric_name.clone(),
        }
    }
}

pub struct Pipeline<'a> {
    cohort: &'a dyn CohortStore,
    events: &'a dyn EventStore,
    scoring: &'a dyn ScoringClient,
    metrics: &'a dyn GaugeSink,
    options: RunOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        cohort: &'a dyn CohortStore,
        events: &'a dyn EventStore,
        scoring: &'a dyn ScoringClient,
        metrics: &'a dyn GaugeSink,
        options: RunOptions,
    ) -> Self {
        Self {
            cohort,
            events,
            scoring,
            metrics,
            options,
        }
    }

    /// Runs the pipeline, then closes both stores whatever the outcome.
    pub async fn execute(self) -> Result<RunSummary, PipelineError> {
        let result = self.run().await;

        self.cohort.close().await;
        self.events.close().await;

        result
    }

    async fn run(&self) -> Result<RunSummary, PipelineError> {
        let tenant = &self.options.tenant;

        let members = self
            .cohort
            .active_members(tenant, self.options.cohort_limit)
            .await
            .map_err(|source| PipelineError::Cohort {
                tenant: tenant.clone(),
                source,
            })?;

        info!("Retrieved {} members for tenant {}", members.len(), tenant);

        let mut summary = RunSummary {
            members: members.len(),
            ..Default::default()
        };
        let batch_size = self.options.rows_per_payload.max(1);
        let mut batch: Vec<Row> = Vec::with_capacity(batch_size);

        for member_id in &members {
            let row = match self.member_row(member_id).await {
                Ok(row) => row,
                Err(err) => {
                    self.handle_failure(err, vec![member_id.clone()], &mut summary)?;
                    continue;
                }
            };

            batch.push(row);

            if batch.len() >= batch_size {
                self.flush(std::mem::take(&mut batch), &mut summary).await?;
            }
        }

        if !batch.is_empty() {
            self.flush(batch, &mut summary).await?;
        }

        Ok(summary)
    }

    /// Retrieves, filters and encodes one member's history.
    async fn member_row(&self, member_id: &str) -> Result<Row, PipelineError> {
        let key = composite_key(member_id, &self.options.tenant);

        let raw = self
            .events
            .recent_events(&key, self.options.event_limit)
            .await
            .map_err(|source| PipelineError::Events {
                member_id: member_id.to_string(),
                source,
            })?;

        let retrieved = raw.len();
        let recognized = retain_recognized(raw);
        info!(
            "Retrieved {} events for member {} ({} recognized)",
            retrieved,
            member_id,
            recognized.len()
        );

        Ok(build_row(member_id, &recognized))
    }

    /// Sends one payload built from `rows` and reports each member in it.
    async fn flush(&self, rows: Vec<Row>, summary: &mut RunSummary) -> Result<(), PipelineError> {
        let counts: Vec<(String, usize, usize)> = rows
            .iter()
            .map(|r| (r.member_id.clone(), r.tokens.len(), r.timestamp_fallbacks))
            .collect();

        match self.transmit(rows).await {
            Ok(elapsed) => {
                summary.payloads_sent += 1;
                summary.total_latency += elapsed;
                for (member_id, tokens, fallbacks) in counts {
                    summary.tokens += tokens;
                    summary.timestamp_fallbacks += fallbacks;
                    println!(
                        "member: {}_{}, events: {}, transform time: {:?}",
                        member_id, self.options.tenant, tokens, elapsed
                    );
                }
                Ok(())
            }
            Err(err) => {
                let member_ids = counts.into_iter().map(|(id, _, _)| id).collect();
                self.handle_failure(err, member_ids, summary)
            }
        }
    }

    async fn transmit(&self, rows: Vec<Row>) -> Result<Duration, PipelineError> {
        let member_id = rows
            .iter()
            .map(|r| r.member_id.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let body = encode_payload(rows).to_json_bytes()?;

        let transmission = match self.scoring.transform(&self.options.tenant, body).await {
            Ok(transmission) => transmission,
            Err(source) => {
                // A non-success status still completed a round trip.
                if let ScoringError::Status { elapsed, .. } = &source {
                    self.report_latency(*elapsed).await;
                }
                return Err(PipelineError::Transmission { member_id, source });
            }
        };

        debug!(
            "Transform responded {} ({} bytes drained)",
            transmission.status, transmission.drained_bytes
        );

        self.report_latency(transmission.elapsed).await;
        Ok(transmission.elapsed)
    }

    async fn report_latency(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        if let Err(e) = self
            .metrics
            .gauge(&self.options.metric_name, nanos, GAUGE_SAMPLE_RATE)
            .await
        {
            warn!("Failed to report latency gauge: {e}");
        }
    }

    /// Fail-fast returns the error; isolate records it and lets the run go on.
    fn handle_failure(
        &self,
        err: PipelineError,
        member_ids: Vec<String>,
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        if self.options.failure_policy == FailurePolicy::FailFast || err.is_run_fatal() {
            return Err(err);
        }

        warn!("Skipping member(s) {}: {err}", member_ids.join(","));
        summary.failures.push(MemberFailure {
            member_ids,
            error: err.to_string(),
        });
        Ok(())
    }
}
