use adx_export_core::contract::{
    build_completion_message, CompletionMessage, ExportDestination, MessageShape, SubmittedJob,
    COMPLETION_SUBJECT,
};
use tracing::info;

use crate::adapters::publisher::{CompletionPublisher, OutboundMessage};
use crate::config::RelayConfig;
use crate::error::NotifyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSettings {
    pub destination: ExportDestination,
    pub shape: MessageShape,
    pub table_name: String,
}

impl From<&RelayConfig> for NotificationSettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            destination: config.destination.clone(),
            shape: config.message_shape,
            table_name: config.table_name.clone(),
        }
    }
}

pub fn completion_message_for(
    job: &SubmittedJob,
    settings: &NotificationSettings,
) -> CompletionMessage {
    build_completion_message(
        &job.revision,
        &job.assets,
        settings.shape,
        &settings.destination,
        &settings.table_name,
    )
}

/// Publishes the completion notice for `job`. No idempotency key is
/// attached; redelivered invocations can notify twice.
pub fn notify_completion(
    job: &SubmittedJob,
    settings: &NotificationSettings,
    publisher: &dyn CompletionPublisher,
) -> Result<CompletionMessage, NotifyError> {
    let message = completion_message_for(job, settings);
    let outbound = OutboundMessage {
        subject: COMPLETION_SUBJECT.to_string(),
        body: serde_json::to_string(&message)?,
        group_id: job.revision.dataset_id.clone(),
    };

    publisher.publish(&outbound)?;
    info!(
        job_id = %job.job_id,
        dataset_id = %job.revision.dataset_id,
        revision_id = %job.revision.revision_id,
        "completion notice published"
    );
    Ok(message)
}
