//! Remote collaborator contract
//!
//! The test hub backend owns file records, suites and the execution engine. This
//! trait is the only way the workspace core talks to it; the CLI provides the
//! HTTP implementation.

use crate::error::Result;
use crate::types::{FsRecord, ProjectId, RunConfig, RunSnapshot, RunTicket, Suite, SuiteDraft};
use async_trait::async_trait;

#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    /// Flat file records of a project.
    async fn fetch_tree(&self, project: &ProjectId) -> Result<Vec<FsRecord>>;

    /// Start a batch run over `file_ids`.
    async fn submit_batch_run(
        &self,
        project: &ProjectId,
        file_ids: &[String],
        config: &RunConfig,
    ) -> Result<RunTicket>;

    /// Current snapshot of a run.
    async fn run_status(&self, run_id: &str, project: &ProjectId) -> Result<RunSnapshot>;

    /// Ask the remote to stop a run.
    async fn cancel_run(&self, run_id: &str, project: &ProjectId) -> Result<()>;

    /// Past runs of a project.
    async fn list_runs(&self, project: &ProjectId) -> Result<Vec<RunSnapshot>>;

    /// Rescan the project's files on disk. Returns the number of files found.
    async fn rescan(&self, project: &ProjectId) -> Result<usize>;

    async fn list_suites(&self, project: &ProjectId) -> Result<Vec<Suite>>;

    async fn create_suite(&self, project: &ProjectId, draft: &SuiteDraft) -> Result<Suite>;

    async fn delete_suite(&self, project: &ProjectId, suite_id: &str) -> Result<()>;
}
