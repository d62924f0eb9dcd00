use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::storage_keys::asset_object_key;

pub const DEFAULT_ASSET_BATCH_SIZE: usize = 10_000;
pub const DEFAULT_TABLE_NAME: &str = "world_bank_cpi";
pub const DEFAULT_DESTINATION_PREFIX: &str = "adx-cpi/";
pub const COMPLETION_SUBJECT: &str = "ADX revision export completed";

/// Identifies one revision of a data set. Supplied by the inbound event and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RevisionReference {
    pub dataset_id: String,
    pub revision_id: String,
}

impl RevisionReference {
    pub fn new(dataset_id: impl Into<String>, revision_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            revision_id: revision_id.into(),
        }
    }
}

/// All revisions announced by a single inbound record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevisionBatch {
    pub dataset_id: String,
    pub revision_ids: Vec<String>,
}

impl RevisionBatch {
    pub fn revisions(&self) -> impl Iterator<Item = RevisionReference> + '_ {
        self.revision_ids
            .iter()
            .map(|revision_id| RevisionReference::new(self.dataset_id.clone(), revision_id.clone()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asset {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDestination {
    pub bucket: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportJobState {
    Submitted,
    Completed,
    Error,
}

impl ExportJobState {
    /// Maps a provider job state onto the two-terminal-state lifecycle.
    /// Cancelled and timed out jobs never deliver their assets, so they are
    /// failures. Unrecognized states are treated as still running.
    pub fn from_provider_state(state: &str) -> Self {
        match state {
            "COMPLETED" => Self::Completed,
            "ERROR" | "CANCELLED" | "TIMED_OUT" => Self::Error,
            _ => Self::Submitted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJobStatus {
    pub state: ExportJobState,
    pub errors: Vec<String>,
}

/// An export job started during the current invocation together with the
/// assets it copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    pub job_id: String,
    pub revision: RevisionReference,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetLocation {
    pub bucket: String,
    pub key: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageShape {
    /// `{dataset_id, revision_id}` only.
    Revision,
    /// Adds `dataFilesMap` with one location per exported asset.
    #[default]
    DataFiles,
}

impl MessageShape {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "revision" => Ok(Self::Revision),
            "data_files" => Ok(Self::DataFiles),
            other => Err(ValidationError::new(format!(
                "unknown message shape '{other}', expected 'revision' or 'data_files'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionMessage {
    pub dataset_id: String,
    pub revision_id: String,
    #[serde(rename = "dataFilesMap", skip_serializing_if = "Option::is_none", default)]
    pub data_files_map: Option<BTreeMap<String, Vec<AssetLocation>>>,
}

pub fn build_completion_message(
    revision: &RevisionReference,
    assets: &[Asset],
    shape: MessageShape,
    destination: &ExportDestination,
    table_name: &str,
) -> CompletionMessage {
    let data_files_map = match shape {
        MessageShape::Revision => None,
        MessageShape::DataFiles => {
            let locations = assets
                .iter()
                .map(|asset| AssetLocation {
                    bucket: destination.bucket.clone(),
                    key: asset_object_key(
                        &destination.prefix,
                        &revision.dataset_id,
                        &revision.revision_id,
                        &asset.name,
                    ),
                    version: None,
                })
                .collect();
            Some(BTreeMap::from([(table_name.to_string(), locations)]))
        }
    };

    CompletionMessage {
        dataset_id: revision.dataset_id.clone(),
        revision_id: revision.revision_id.clone(),
        data_files_map,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}
