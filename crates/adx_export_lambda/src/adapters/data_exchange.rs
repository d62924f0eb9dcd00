use adx_export_core::contract::{Asset, ExportJobStatus, RevisionReference};

use crate::error::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDestination {
    pub asset_id: String,
    pub bucket: String,
    pub key: String,
}

/// One export-to-storage job covering a chunk of a revision's assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJobRequest {
    pub revision: RevisionReference,
    pub destinations: Vec<AssetDestination>,
}

/// The subset of the data-exchange job API the relay drives.
pub trait DataExchange {
    /// Returns every asset of the revision, following pagination.
    fn list_revision_assets(&self, revision: &RevisionReference)
        -> Result<Vec<Asset>, ProviderError>;

    /// Creates an export job and returns its identifier.
    fn create_export_job(&self, request: &ExportJobRequest) -> Result<String, ProviderError>;

    fn start_job(&self, job_id: &str) -> Result<(), ProviderError>;

    fn get_job(&self, job_id: &str) -> Result<ExportJobStatus, ProviderError>;
}
