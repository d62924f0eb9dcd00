use std::collections::HashMap;
use std::sync::Mutex;

use adx_export_lambda::adapters::data_exchange::{DataExchange, ExportJobRequest};
use adx_export_lambda::adapters::publisher::{CompletionPublisher, OutboundMessage};
use adx_export_lambda::config::RelayConfig;
use adx_export_lambda::error::ProviderError;
use adx_export_lambda::runtime::contract::{
    Asset, ExportJobState, ExportJobStatus, RevisionReference,
};

/// In-memory data exchange: each revision has a fixed asset list and every
/// job reports `IN_PROGRESS` for `polls_before_terminal` queries, then
/// `terminal_state`.
pub struct FakeDataExchange {
    assets: HashMap<String, Vec<Asset>>,
    polls_before_terminal: usize,
    terminal_state: &'static str,
    jobs: Mutex<Vec<ExportJobRequest>>,
    started: Mutex<Vec<String>>,
    polls: Mutex<HashMap<String, usize>>,
}

impl FakeDataExchange {
    pub fn new(polls_before_terminal: usize, terminal_state: &'static str) -> Self {
        Self {
            assets: HashMap::new(),
            polls_before_terminal,
            terminal_state,
            jobs: Mutex::new(Vec::new()),
            started: Mutex::new(Vec::new()),
            polls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_assets(mut self, revision_id: &str, names: &[&str]) -> Self {
        let assets = names
            .iter()
            .enumerate()
            .map(|(index, name)| Asset {
                id: format!("{revision_id}-asset-{index}"),
                name: name.to_string(),
            })
            .collect();
        self.assets.insert(revision_id.to_string(), assets);
        self
    }

    pub fn jobs(&self) -> Vec<ExportJobRequest> {
        self.jobs.lock().expect("poisoned mutex").clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().expect("poisoned mutex").clone()
    }
}

impl DataExchange for FakeDataExchange {
    fn list_revision_assets(
        &self,
        revision: &RevisionReference,
    ) -> Result<Vec<Asset>, ProviderError> {
        self.assets
            .get(&revision.revision_id)
            .cloned()
            .ok_or_else(|| ProviderError::new("ListRevisionAssets", "ResourceNotFoundException"))
    }

    fn create_export_job(&self, request: &ExportJobRequest) -> Result<String, ProviderError> {
        let mut jobs = self.jobs.lock().expect("poisoned mutex");
        jobs.push(request.clone());
        Ok(format!("job-{}", jobs.len()))
    }

    fn start_job(&self, job_id: &str) -> Result<(), ProviderError> {
        self.started
            .lock()
            .expect("poisoned mutex")
            .push(job_id.to_string());
        Ok(())
    }

    fn get_job(&self, job_id: &str) -> Result<ExportJobStatus, ProviderError> {
        let mut polls = self.polls.lock().expect("poisoned mutex");
        let count = polls.entry(job_id.to_string()).or_insert(0);
        *count += 1;

        let state = if *count > self.polls_before_terminal {
            self.terminal_state
        } else {
            "IN_PROGRESS"
        };
        let errors = if state == "ERROR" {
            vec!["INSUFFICIENT_S3_BUCKET_POLICY: bucket policy denies export".to_string()]
        } else {
            Vec::new()
        };
        Ok(ExportJobStatus {
            state: ExportJobState::from_provider_state(state),
            errors,
        })
    }
}

#[derive(Default)]
pub struct CapturingPublisher {
    messages: Mutex<Vec<OutboundMessage>>,
}

impl CapturingPublisher {
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().expect("poisoned mutex").clone()
    }
}

impl CompletionPublisher for CapturingPublisher {
    fn publish(&self, message: &OutboundMessage) -> Result<(), ProviderError> {
        self.messages
            .lock()
            .expect("poisoned mutex")
            .push(message.clone());
        Ok(())
    }
}

pub fn relay_config(overrides: &[(&str, &str)]) -> RelayConfig {
    let mut values: HashMap<String, String> = [
        ("AWS_REGION", "us-east-1"),
        ("S3_BUCKET", "adx-exports"),
        ("INBOUND_SQS_QUEUE", "https://sqs.us-east-1.amazonaws.com/1/adx-inbound"),
        (
            "OUTBOUND_SQS_QUEUE",
            "https://sqs.us-east-1.amazonaws.com/1/adx-outbound.fifo",
        ),
        ("POLL_INTERVAL_MS", "0"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect();
    for (key, value) in overrides {
        values.insert(key.to_string(), value.to_string());
    }

    RelayConfig::from_lookup(|name| values.get(name).cloned()).expect("config should load")
}
