use std::collections::HashSet;
use std::time::Duration;

use adx_export_core::contract::{ExportJobState, SubmittedJob};
use tracing::{debug, error, info};

use crate::adapters::data_exchange::DataExchange;
use crate::error::{NotifyError, PollError};

/// Pause between polling rounds; keeps status queries under the provider's
/// rate limit.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);
/// Roughly fifteen minutes of polling at the default interval.
pub const DEFAULT_MAX_POLL_ROUNDS: u32 = 4_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_rounds: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_rounds: DEFAULT_MAX_POLL_ROUNDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSummary {
    pub rounds: u32,
    /// Job ids in the order their completion was observed.
    pub completed_jobs: Vec<String>,
}

/// Polls every job until all of them complete.
///
/// `on_completed` runs exactly once per job, as soon as its completion is
/// observed. The first job found in a failed state ends polling with
/// [`PollError::JobFailed`], even when other jobs already completed. Each
/// round queries the not-yet-completed jobs in submission order, then calls
/// `pause` with the policy interval if work remains and another round is
/// allowed.
pub fn poll_until_terminal(
    jobs: &[SubmittedJob],
    data_exchange: &dyn DataExchange,
    policy: &PollPolicy,
    on_completed: &mut dyn FnMut(&SubmittedJob) -> Result<(), NotifyError>,
    pause: &dyn Fn(Duration),
) -> Result<PollSummary, PollError> {
    let outstanding: HashSet<&str> = jobs.iter().map(|job| job.job_id.as_str()).collect();
    let mut completed: HashSet<&str> = HashSet::with_capacity(outstanding.len());
    let mut completed_jobs = Vec::with_capacity(outstanding.len());
    let mut rounds = 0u32;

    while completed != outstanding {
        if rounds >= policy.max_rounds {
            let pending = jobs
                .iter()
                .filter(|job| !completed.contains(job.job_id.as_str()))
                .map(|job| job.job_id.clone())
                .collect::<Vec<_>>();
            error!(rounds, pending = pending.len(), "polling budget exhausted");
            return Err(PollError::Exhausted { rounds, pending });
        }
        rounds += 1;

        for job in jobs {
            if completed.contains(job.job_id.as_str()) {
                continue;
            }

            let status =
                data_exchange
                    .get_job(&job.job_id)
                    .map_err(|source| PollError::Provider {
                        job_id: job.job_id.clone(),
                        source,
                    })?;

            match status.state {
                ExportJobState::Completed => {
                    info!(
                        job_id = %job.job_id,
                        revision_id = %job.revision.revision_id,
                        round = rounds,
                        "export job completed"
                    );
                    completed.insert(job.job_id.as_str());
                    completed_jobs.push(job.job_id.clone());
                    on_completed(job).map_err(|source| PollError::Notify {
                        job_id: job.job_id.clone(),
                        source,
                    })?;
                }
                ExportJobState::Error => {
                    error!(
                        job_id = %job.job_id,
                        revision_id = %job.revision.revision_id,
                        errors = ?status.errors,
                        "export job failed"
                    );
                    return Err(PollError::JobFailed {
                        job_id: job.job_id.clone(),
                        errors: status.errors,
                    });
                }
                ExportJobState::Submitted => {}
            }
        }

        debug_assert!(completed.is_subset(&outstanding));
        if completed != outstanding && rounds < policy.max_rounds {
            debug!(
                round = rounds,
                pending = outstanding.len() - completed.len(),
                "waiting for export jobs"
            );
            pause(policy.interval);
        }
    }

    Ok(PollSummary {
        rounds,
        completed_jobs,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use adx_export_core::contract::{Asset, ExportJobStatus, RevisionReference};

    use super::*;
    use crate::adapters::data_exchange::ExportJobRequest;
    use crate::error::ProviderError;

    /// Replays a scripted sequence of states per job; the last state repeats.
    struct ScriptedDataExchange {
        scripts: Mutex<HashMap<String, VecDeque<&'static str>>>,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedDataExchange {
        fn new(scripts: Vec<(&str, Vec<&'static str>)>) -> Self {
            Self {
                scripts: Mutex::new(
                    scripts
                        .into_iter()
                        .map(|(job_id, states)| (job_id.to_string(), states.into()))
                        .collect(),
                ),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().expect("poisoned mutex").clone()
        }
    }

    impl DataExchange for ScriptedDataExchange {
        fn list_revision_assets(
            &self,
            _revision: &RevisionReference,
        ) -> Result<Vec<Asset>, ProviderError> {
            unreachable!("polling never lists assets")
        }

        fn create_export_job(&self, _request: &ExportJobRequest) -> Result<String, ProviderError> {
            unreachable!("polling never creates jobs")
        }

        fn start_job(&self, _job_id: &str) -> Result<(), ProviderError> {
            unreachable!("polling never starts jobs")
        }

        fn get_job(&self, job_id: &str) -> Result<ExportJobStatus, ProviderError> {
            self.queries
                .lock()
                .expect("poisoned mutex")
                .push(job_id.to_string());
            let mut scripts = self.scripts.lock().expect("poisoned mutex");
            let script = scripts
                .get_mut(job_id)
                .ok_or_else(|| ProviderError::new("GetJob", "ResourceNotFoundException"))?;
            let state = if script.len() > 1 {
                script.pop_front().expect("script should not be empty")
            } else {
                script[0]
            };
            let errors = if state == "ERROR" {
                vec!["AccessDeniedException: bucket policy denies export".to_string()]
            } else {
                Vec::new()
            };
            Ok(ExportJobStatus {
                state: ExportJobState::from_provider_state(state),
                errors,
            })
        }
    }

    fn job(job_id: &str, revision_id: &str) -> SubmittedJob {
        SubmittedJob {
            job_id: job_id.to_string(),
            revision: RevisionReference::new("ds1", revision_id),
            assets: Vec::new(),
        }
    }

    fn policy_with_rounds(max_rounds: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(200),
            max_rounds,
        }
    }

    #[test]
    fn notifies_each_job_once_as_it_completes() {
        let data_exchange = ScriptedDataExchange::new(vec![
            ("job-1", vec!["IN_PROGRESS", "COMPLETED"]),
            ("job-2", vec!["COMPLETED"]),
        ]);
        let jobs = vec![job("job-1", "rev1"), job("job-2", "rev2")];
        let mut notified = Vec::new();
        let pauses = RefCell::new(Vec::new());

        let summary = poll_until_terminal(
            &jobs,
            &data_exchange,
            &policy_with_rounds(10),
            &mut |job| {
                notified.push(job.revision.revision_id.clone());
                Ok(())
            },
            &|interval| pauses.borrow_mut().push(interval),
        )
        .expect("polling should pass");

        assert_eq!(notified, vec!["rev2", "rev1"]);
        assert_eq!(summary.rounds, 2);
        assert_eq!(summary.completed_jobs, vec!["job-2", "job-1"]);
        assert_eq!(*pauses.borrow(), vec![Duration::from_millis(200)]);
        assert_eq!(data_exchange.queries(), vec!["job-1", "job-2", "job-1"]);
    }

    #[test]
    fn first_error_aborts_without_polling_later_jobs() {
        let data_exchange = ScriptedDataExchange::new(vec![
            ("job-1", vec!["COMPLETED"]),
            ("job-2", vec!["ERROR"]),
            ("job-3", vec!["COMPLETED"]),
        ]);
        let jobs = vec![job("job-1", "rev1"), job("job-2", "rev1"), job("job-3", "rev1")];
        let mut notified = 0;

        let error = poll_until_terminal(
            &jobs,
            &data_exchange,
            &policy_with_rounds(10),
            &mut |_| {
                notified += 1;
                Ok(())
            },
            &|_| {},
        )
        .expect_err("polling should fail");

        match error {
            PollError::JobFailed { job_id, errors } => {
                assert_eq!(job_id, "job-2");
                assert_eq!(errors.len(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(notified, 1);
        assert_eq!(data_exchange.queries(), vec!["job-1", "job-2"]);
    }

    #[test]
    fn cancelled_job_is_a_failure() {
        let data_exchange =
            ScriptedDataExchange::new(vec![("job-1", vec!["WAITING", "CANCELLED"])]);

        let error = poll_until_terminal(
            &[job("job-1", "rev1")],
            &data_exchange,
            &policy_with_rounds(10),
            &mut |_| Ok(()),
            &|_| {},
        )
        .expect_err("polling should fail");

        assert!(matches!(error, PollError::JobFailed { .. }));
    }

    #[test]
    fn exhausting_round_budget_reports_pending_jobs() {
        let data_exchange = ScriptedDataExchange::new(vec![
            ("job-1", vec!["COMPLETED"]),
            ("job-2", vec!["IN_PROGRESS"]),
        ]);
        let pauses = RefCell::new(0u32);

        let error = poll_until_terminal(
            &[job("job-1", "rev1"), job("job-2", "rev2")],
            &data_exchange,
            &policy_with_rounds(3),
            &mut |_| Ok(()),
            &|_| *pauses.borrow_mut() += 1,
        )
        .expect_err("polling should fail");

        match error {
            PollError::Exhausted { rounds, pending } => {
                assert_eq!(rounds, 3);
                assert_eq!(pending, vec!["job-2"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*pauses.borrow(), 2);
    }

    #[test]
    fn single_round_budget_never_pauses() {
        let data_exchange = ScriptedDataExchange::new(vec![("job-1", vec!["IN_PROGRESS"])]);

        let error = poll_until_terminal(
            &[job("job-1", "rev1")],
            &data_exchange,
            &policy_with_rounds(1),
            &mut |_| Ok(()),
            &|_| panic!("no pause expected after the last round"),
        )
        .expect_err("polling should fail");

        assert!(matches!(error, PollError::Exhausted { rounds: 1, .. }));
        assert_eq!(data_exchange.queries(), vec!["job-1"]);
    }

    #[test]
    fn no_jobs_completes_immediately() {
        let data_exchange = ScriptedDataExchange::new(Vec::new());

        let summary = poll_until_terminal(
            &[],
            &data_exchange,
            &policy_with_rounds(1),
            &mut |_| Ok(()),
            &|_| panic!("no pause expected"),
        )
        .expect("polling should pass");

        assert_eq!(summary.rounds, 0);
        assert!(data_exchange.queries().is_empty());
    }

    #[test]
    fn status_query_failure_names_the_job() {
        let data_exchange = ScriptedDataExchange::new(Vec::new());

        let error = poll_until_terminal(
            &[job("job-missing", "rev1")],
            &data_exchange,
            &policy_with_rounds(5),
            &mut |_| Ok(()),
            &|_| {},
        )
        .expect_err("polling should fail");

        assert!(matches!(
            error,
            PollError::Provider { ref job_id, .. } if job_id == "job-missing"
        ));
    }
}
