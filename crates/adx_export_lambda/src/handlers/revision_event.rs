use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::adapters::data_exchange::DataExchange;
use crate::adapters::publisher::CompletionPublisher;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::handlers::intake::{decode_invocation_event, is_sqs_event};
use crate::handlers::notify::{notify_completion, NotificationSettings};
use crate::handlers::poll::poll_until_terminal;
use crate::handlers::submit::submit_export_jobs;

pub const ALL_JOBS_COMPLETED: &str = "All jobs completed.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON-encoded human-readable status.
    pub body: String,
}

/// Runs one invocation: decode the event, start export jobs, wait for them,
/// and publish one completion notice per finished job.
///
/// Any failure aborts the invocation and is returned to the runtime, which
/// applies the event source's retry and redrive policy. Notices already sent
/// stay sent.
pub fn handle_revision_event(
    event: &Value,
    config: &RelayConfig,
    data_exchange: &dyn DataExchange,
    publisher: &dyn CompletionPublisher,
    pause: &dyn Fn(Duration),
) -> Result<InvocationResponse, RelayError> {
    let started_at = Instant::now();
    let batches = decode_invocation_event(event)?;
    let source = if is_sqs_event(event) { "sqs" } else { "direct" };
    info!(
        source,
        inbound_queue = %config.inbound_queue,
        batches = batches.len(),
        revisions = batches.iter().map(|batch| batch.revision_ids.len()).sum::<usize>(),
        "revision event received"
    );

    let jobs = submit_export_jobs(
        &batches,
        &config.destination,
        config.asset_batch_size,
        data_exchange,
    )?;

    let settings = NotificationSettings::from(config);
    let summary = poll_until_terminal(
        &jobs,
        data_exchange,
        &config.poll_policy,
        &mut |job| notify_completion(job, &settings, publisher).map(|_| ()),
        pause,
    )?;

    info!(
        jobs = summary.completed_jobs.len(),
        rounds = summary.rounds,
        outbound = %config.outbound.describe(),
        duration_ms = started_at.elapsed().as_millis() as u64,
        "all export jobs completed"
    );

    Ok(InvocationResponse {
        status_code: 200,
        body: serde_json::to_string(ALL_JOBS_COMPLETED)?,
    })
}
