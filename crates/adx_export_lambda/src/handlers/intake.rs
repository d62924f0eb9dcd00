use adx_export_core::contract::RevisionBatch;
use serde::Deserialize;
use serde_json::Value;

use crate::error::IntakeError;

#[derive(Debug, Deserialize)]
struct RevisionNotification {
    #[serde(default)]
    resources: Vec<String>,
    detail: RevisionDetail,
}

#[derive(Debug, Deserialize)]
struct RevisionDetail {
    #[serde(rename = "RevisionIds", default)]
    revision_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct InitialInit {
    data_set_id: String,
    #[serde(rename = "RevisionIds")]
    revision_ids: OneOrMany,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// Decodes a Lambda invocation event into the revision batches it announces.
///
/// Accepts an SQS record set (bodies optionally wrapped in an SNS
/// notification envelope), a bare EventBridge revision event, or a manual
/// `InitialInit` bootstrap event. Each SQS record yields one batch.
pub fn decode_invocation_event(event: &Value) -> Result<Vec<RevisionBatch>, IntakeError> {
    let Some(object) = event.as_object() else {
        return Err(IntakeError::NotAnObject);
    };

    if let Some(initial) = object.get("InitialInit") {
        return decode_initial_init(initial).map(|batch| vec![batch]);
    }

    if let Some(records) = object.get("Records") {
        return decode_records(records);
    }

    revision_batch_from_notification(event.clone()).map(|batch| vec![batch])
}

pub fn is_sqs_event(event: &Value) -> bool {
    event
        .get("Records")
        .and_then(Value::as_array)
        .map(|records| {
            !records.is_empty()
                && records.iter().all(|record| {
                    record
                        .get("eventSource")
                        .and_then(Value::as_str)
                        .map(|source| source == "aws:sqs")
                        .unwrap_or(false)
                })
        })
        .unwrap_or(false)
}

fn decode_records(records: &Value) -> Result<Vec<RevisionBatch>, IntakeError> {
    let records = records
        .as_array()
        .ok_or_else(|| IntakeError::UnrecognizedEvent {
            reason: "Records must be an array".to_string(),
        })?;
    if records.is_empty() {
        return Err(IntakeError::EmptyField { field: "Records" });
    }

    let mut batches = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let body = record
            .get("body")
            .and_then(Value::as_str)
            .ok_or(IntakeError::MissingBody { index })?;
        let decoded: Value =
            serde_json::from_str(body).map_err(|error| IntakeError::MalformedBody {
                index,
                reason: error.to_string(),
            })?;
        let notification = unwrap_notification_envelope(index, decoded)?;
        batches.push(revision_batch_from_notification(notification)?);
    }

    Ok(batches)
}

/// Bodies delivered through an SNS subscription carry the original event as
/// a JSON string under `Message`.
fn unwrap_notification_envelope(index: usize, body: Value) -> Result<Value, IntakeError> {
    if body.get("resources").is_some() {
        return Ok(body);
    }

    match body.get("Message") {
        Some(Value::String(message)) => {
            serde_json::from_str(message).map_err(|error| IntakeError::MalformedBody {
                index,
                reason: format!("notification Message: {error}"),
            })
        }
        _ => Ok(body),
    }
}

fn revision_batch_from_notification(value: Value) -> Result<RevisionBatch, IntakeError> {
    let notification: RevisionNotification =
        serde_json::from_value(value).map_err(|error| IntakeError::UnrecognizedEvent {
            reason: error.to_string(),
        })?;

    let dataset_id = notification
        .resources
        .into_iter()
        .next()
        .ok_or(IntakeError::EmptyField { field: "resources" })?;

    build_batch(dataset_id, notification.detail.revision_ids)
}

fn decode_initial_init(value: &Value) -> Result<RevisionBatch, IntakeError> {
    let initial: InitialInit =
        serde_json::from_value(value.clone()).map_err(|error| IntakeError::UnrecognizedEvent {
            reason: format!("InitialInit: {error}"),
        })?;

    build_batch(initial.data_set_id, initial.revision_ids.into_vec())
}

fn build_batch(
    dataset_id: String,
    revision_ids: Vec<String>,
) -> Result<RevisionBatch, IntakeError> {
    let dataset_id = dataset_id.trim().to_string();
    if dataset_id.is_empty() {
        return Err(IntakeError::EmptyField {
            field: "dataset id",
        });
    }

    if revision_ids.is_empty() {
        return Err(IntakeError::EmptyField {
            field: "RevisionIds",
        });
    }

    let revision_ids: Vec<String> = revision_ids
        .into_iter()
        .map(|revision_id| revision_id.trim().to_string())
        .collect();
    if revision_ids.iter().any(String::is_empty) {
        return Err(IntakeError::EmptyField {
            field: "revision id",
        });
    }

    Ok(RevisionBatch {
        dataset_id,
        revision_ids,
    })
}
