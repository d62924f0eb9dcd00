//! Error types for the export relay.

use adx_export_core::contract::ValidationError;
use thiserror::Error;

/// Inbound event could not be turned into revision batches.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("invocation event must be a JSON object")]
    NotAnObject,

    #[error("record {index} body must be a string")]
    MissingBody { index: usize },

    #[error("record {index} body is not valid JSON: {reason}")]
    MalformedBody { index: usize, reason: String },

    #[error("event does not carry a revision notification: {reason}")]
    UnrecognizedEvent { reason: String },

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
}

/// Required configuration is missing or unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),

    #[error("{name}='{value}' is invalid: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// A provider API call failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{operation} failed: {message}")]
pub struct ProviderError {
    pub operation: &'static str,
    pub message: String,
}

impl ProviderError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Job submission failed before polling could start.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("invalid asset batching: {0}")]
    Batching(#[from] ValidationError),
}

/// The polling loop stopped before every job completed.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("JobId: {job_id} failed with errors: {errors:?}")]
    JobFailed { job_id: String, errors: Vec<String> },

    #[error("{} job(s) still pending after {rounds} polling rounds: {pending:?}", .pending.len())]
    Exhausted { rounds: u32, pending: Vec<String> },

    #[error("status query for job {job_id} failed: {source}")]
    Provider {
        job_id: String,
        #[source]
        source: ProviderError,
    },

    #[error("completion notice for job {job_id} failed: {source}")]
    Notify {
        job_id: String,
        #[source]
        source: NotifyError,
    },
}

/// A completion notice could not be built or delivered.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to serialize completion message: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Invocation-level failure surfaced to the Lambda runtime.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("failed to serialize invocation response: {0}")]
    Serialization(#[from] serde_json::Error),
}
