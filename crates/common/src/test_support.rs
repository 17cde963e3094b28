//! In-memory remote used by unit tests

use crate::api::WorkspaceApi;
use crate::error::{Error, Result};
use crate::types::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// One scripted answer to a status poll
#[derive(Debug, Clone)]
pub enum PollReply {
    Status(RunStatus),
    /// Raw response body, decoded the way the HTTP client decodes it
    Json(String),
    Fail,
}

#[derive(Default)]
struct StubState {
    records: Vec<FsRecord>,
    suites: Vec<Suite>,
    replies: VecDeque<PollReply>,
    status_fetches: Vec<(String, ProjectId)>,
    submissions: Vec<(ProjectId, Vec<String>, RunConfig)>,
    cancelled: Vec<String>,
    fail_submit: bool,
    fail_cancel: bool,
    cancel_delay: Option<Duration>,
    results_per_poll: usize,
}

#[derive(Default)]
pub struct StubApi {
    state: Mutex<StubState>,
}

impl StubApi {
    pub fn with_records(records: Vec<FsRecord>) -> Self {
        let stub = Self::default();
        stub.state.lock().records = records;
        stub
    }

    pub fn set_records(&self, records: Vec<FsRecord>) {
        self.state.lock().records = records;
    }

    /// Queue poll answers; once exhausted every poll reports `running`.
    pub fn script<I: IntoIterator<Item = PollReply>>(&self, replies: I) {
        self.state.lock().replies.extend(replies);
    }

    pub fn fail_submissions(&self) {
        self.state.lock().fail_submit = true;
    }

    pub fn fail_cancellations(&self) {
        self.state.lock().fail_cancel = true;
    }

    /// Make `cancel_run` wait this long before answering.
    pub fn delay_cancellations(&self, delay: Duration) {
        self.state.lock().cancel_delay = Some(delay);
    }

    pub fn status_fetches(&self) -> usize {
        self.state.lock().status_fetches.len()
    }

    pub fn status_fetch_log(&self) -> Vec<(String, ProjectId)> {
        self.state.lock().status_fetches.clone()
    }

    pub fn submissions(&self) -> Vec<(ProjectId, Vec<String>, RunConfig)> {
        self.state.lock().submissions.clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.state.lock().cancelled.clone()
    }
}

#[async_trait]
impl WorkspaceApi for StubApi {
    async fn fetch_tree(&self, _project: &ProjectId) -> Result<Vec<FsRecord>> {
        Ok(self.state.lock().records.clone())
    }

    async fn submit_batch_run(
        &self,
        project: &ProjectId,
        file_ids: &[String],
        config: &RunConfig,
    ) -> Result<RunTicket> {
        let mut state = self.state.lock();
        if state.fail_submit {
            return Err(Error::Remote {
                status: 500,
                message: "runner unavailable".into(),
            });
        }
        state
            .submissions
            .push((project.clone(), file_ids.to_vec(), config.clone()));
        Ok(RunTicket {
            run_id: format!("run-{}", state.submissions.len()),
        })
    }

    async fn run_status(&self, run_id: &str, project: &ProjectId) -> Result<RunSnapshot> {
        let mut state = self.state.lock();
        state
            .status_fetches
            .push((run_id.to_string(), project.clone()));
        state.results_per_poll += 1;
        let reply = state
            .replies
            .pop_front()
            .unwrap_or(PollReply::Status(RunStatus::Running));

        match reply {
            PollReply::Fail => Err(Error::Transport("connection refused".into())),
            PollReply::Json(body) => Ok(serde_json::from_str(&body)?),
            PollReply::Status(status) => Ok(RunSnapshot {
                id: run_id.to_string(),
                status,
                logs: vec![format!("poll {}", state.status_fetches.len())],
                results: (0..state.results_per_poll)
                    .map(|i| TestResult {
                        test_name: format!("test-{}", i),
                        status: "passed".into(),
                        ..Default::default()
                    })
                    .collect(),
            }),
        }
    }

    async fn cancel_run(&self, run_id: &str, _project: &ProjectId) -> Result<()> {
        let delay = self.state.lock().cancel_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.fail_cancel {
            return Err(Error::Remote {
                status: 409,
                message: "run is not cancellable".into(),
            });
        }
        state.cancelled.push(run_id.to_string());
        Ok(())
    }

    async fn list_runs(&self, _project: &ProjectId) -> Result<Vec<RunSnapshot>> {
        Ok(Vec::new())
    }

    async fn rescan(&self, _project: &ProjectId) -> Result<usize> {
        Ok(self.state.lock().records.len())
    }

    async fn list_suites(&self, project: &ProjectId) -> Result<Vec<Suite>> {
        Ok(self
            .state
            .lock()
            .suites
            .iter()
            .filter(|s| s.project_id.as_deref() == Some(project.as_str()))
            .cloned()
            .collect())
    }

    async fn create_suite(&self, project: &ProjectId, draft: &SuiteDraft) -> Result<Suite> {
        let suite = Suite {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            file_ids: draft.file_ids.clone(),
            project_id: Some(project.to_string()),
            created_at: Some(chrono::Utc::now()),
            updated_at: None,
        };
        self.state.lock().suites.push(suite.clone());
        Ok(suite)
    }

    async fn delete_suite(&self, _project: &ProjectId, suite_id: &str) -> Result<()> {
        let mut state = self.state.lock();
        let before = state.suites.len();
        state.suites.retain(|s| s.id != suite_id);
        if state.suites.len() == before {
            return Err(Error::not_found("suite", suite_id));
        }
        Ok(())
    }
}
