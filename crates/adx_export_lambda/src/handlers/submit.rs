use adx_export_core::batching::chunk_assets;
use adx_export_core::contract::{ExportDestination, RevisionBatch, SubmittedJob};
use adx_export_core::storage_keys::{asset_object_key, revision_key_pattern};
use tracing::{info, warn};

use crate::adapters::data_exchange::{AssetDestination, DataExchange, ExportJobRequest};
use crate::error::SubmitError;

/// Lists, batches, and starts export jobs for every revision in `batches`.
///
/// Returns the started jobs in submission order. The first failing create or
/// start call aborts the whole submission; no chunk is retried.
pub fn submit_export_jobs(
    batches: &[RevisionBatch],
    destination: &ExportDestination,
    asset_batch_size: usize,
    data_exchange: &dyn DataExchange,
) -> Result<Vec<SubmittedJob>, SubmitError> {
    let mut jobs = Vec::new();

    for batch in batches {
        for revision in batch.revisions() {
            let assets = data_exchange.list_revision_assets(&revision)?;
            if assets.is_empty() {
                warn!(
                    dataset_id = %revision.dataset_id,
                    revision_id = %revision.revision_id,
                    "revision has no assets; nothing to export"
                );
                continue;
            }

            let chunks = chunk_assets(&assets, asset_batch_size)?;
            info!(
                dataset_id = %revision.dataset_id,
                revision_id = %revision.revision_id,
                assets = assets.len(),
                chunks = chunks.len(),
                key_pattern = %revision_key_pattern(&destination.prefix, &revision.dataset_id),
                "submitting export jobs"
            );

            for chunk in chunks {
                let request = ExportJobRequest {
                    revision: revision.clone(),
                    destinations: chunk
                        .iter()
                        .map(|asset| AssetDestination {
                            asset_id: asset.id.clone(),
                            bucket: destination.bucket.clone(),
                            key: asset_object_key(
                                &destination.prefix,
                                &revision.dataset_id,
                                &revision.revision_id,
                                &asset.name,
                            ),
                        })
                        .collect(),
                };

                let job_id = data_exchange.create_export_job(&request)?;
                data_exchange.start_job(&job_id)?;
                info!(
                    job_id = %job_id,
                    revision_id = %revision.revision_id,
                    assets = chunk.len(),
                    "export job started"
                );

                jobs.push(SubmittedJob {
                    job_id,
                    revision: revision.clone(),
                    assets: chunk,
                });
            }
        }
    }

    Ok(jobs)
}
