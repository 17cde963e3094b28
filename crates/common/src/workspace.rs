//! Test-selection view state
//!
//! A [`Workspace`] is one view instance over one project: the current tree
//! snapshot, the selection built against it, saved suites and a single run
//! coordinator. Dropping the workspace stops any run observation it owns.

use crate::api::WorkspaceApi;
use crate::coordinator::RunCoordinator;
use crate::error::Result;
use crate::selection::SelectionModel;
use crate::suites::SuiteStore;
use crate::tree::{FileNode, FileTree};
use crate::types::{ProjectId, RunConfig, RunSnapshot, Suite};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct Workspace {
    api: Arc<dyn WorkspaceApi>,
    project: ProjectId,
    tree: FileTree,
    selection: SelectionModel,
    suites: SuiteStore,
    coordinator: RunCoordinator,
    run_config: RunConfig,
}

impl Workspace {
    pub fn new(api: Arc<dyn WorkspaceApi>, project: ProjectId) -> Self {
        Self {
            suites: SuiteStore::new(api.clone(), project.clone()),
            coordinator: RunCoordinator::new(api.clone(), project.clone()),
            api,
            project,
            tree: FileTree::default(),
            selection: SelectionModel::new(),
            run_config: RunConfig::default(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.coordinator = self.coordinator.with_interval(interval);
        self
    }

    pub fn with_run_config(mut self, config: RunConfig) -> Self {
        self.run_config = config;
        self
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn suites(&self) -> &SuiteStore {
        &self.suites
    }

    pub fn coordinator(&self) -> &RunCoordinator {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut RunCoordinator {
        &mut self.coordinator
    }

    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    pub fn set_run_config(&mut self, config: RunConfig) {
        self.run_config = config;
    }

    /// Fetch the project's records and rebuild the tree under a new generation.
    pub async fn refresh_tree(&mut self) -> Result<&FileTree> {
        let records = self.api.fetch_tree(&self.project).await?;
        let generation = self.tree.generation() + 1;
        self.tree = FileTree::build(&records, generation);
        self.selection.reconcile(&self.tree);
        info!(
            "Loaded {} nodes for project {} (generation {})",
            self.tree.len(),
            self.project,
            generation
        );
        Ok(&self.tree)
    }

    /// Ask the remote to rescan disk, then refetch the tree.
    pub async fn rescan(&mut self) -> Result<usize> {
        let count = self.api.rescan(&self.project).await?;
        info!("Rescan found {} files", count);
        self.refresh_tree().await?;
        Ok(count)
    }

    pub fn toggle(&mut self, node_id: &str, checked: bool) -> usize {
        self.selection.toggle(node_id, checked, &self.tree)
    }

    /// Drop one file from the execution queue.
    pub fn remove_from_queue(&mut self, node_id: &str) -> bool {
        self.selection.remove(node_id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Selected files in tree order, as shown in the execution queue.
    pub fn queue(&self) -> Vec<&FileNode> {
        self.selection.selected_files(&self.tree)
    }

    pub fn selected_count(&self) -> usize {
        self.selection.selected_file_count(&self.tree)
    }

    pub fn can_run(&self) -> bool {
        self.selected_count() > 0 && !self.coordinator.is_running()
    }

    /// Submit the current queue. `Ok(None)` when there is nothing to run or a run
    /// is already tracked.
    pub async fn run_batch(&mut self) -> Result<Option<String>> {
        let file_ids = self.selection.selected_file_ids(&self.tree);
        self.coordinator.run_batch(file_ids, &self.run_config).await
    }

    pub async fn list_suites(&self) -> Result<Vec<Suite>> {
        self.suites.list().await
    }

    pub async fn save_suite(&self, name: &str, description: Option<String>) -> Result<Suite> {
        self.suites.save(name, description, &self.selection).await
    }

    pub fn load_suite(&mut self, suite: &Suite) {
        self.suites.load(suite, &mut self.selection);
    }

    pub async fn delete_suite(&self, suite_id: &str) -> Result<()> {
        self.suites.delete(suite_id).await
    }

    pub async fn history(&self) -> Result<Vec<RunSnapshot>> {
        self.api.list_runs(&self.project).await
    }

    /// Point the view at another project and reload its tree.
    ///
    /// The selection is cleared since ids from the previous project mean nothing
    /// in the new one.
    pub async fn switch_project(&mut self, project: ProjectId) -> Result<()> {
        self.coordinator.switch_project(project.clone());
        self.suites.set_project(project.clone());
        self.project = project;
        self.selection.clear();
        self.refresh_tree().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::RunPhase;
    use crate::test_support::{PollReply, StubApi};
    use crate::types::{FsRecord, RunStatus};

    fn records() -> Vec<FsRecord> {
        vec![
            FsRecord::folder("suite", None, "checkout"),
            FsRecord::file("cart", Some("suite"), "cart.spec.ts"),
            FsRecord::file("pay", Some("suite"), "pay.spec.ts"),
            FsRecord::file("home", None, "home.spec.ts"),
        ]
    }

    async fn workspace(api: &Arc<StubApi>) -> Workspace {
        let mut ws = Workspace::new(api.clone(), ProjectId::new("p1"));
        ws.refresh_tree().await.unwrap();
        ws
    }

    #[tokio::test]
    async fn test_cascade_add_then_single_remove() {
        let api = Arc::new(StubApi::with_records(records()));
        let mut ws = workspace(&api).await;

        assert_eq!(ws.toggle("suite", true), 3);
        assert_eq!(ws.selection().len(), 3);

        assert!(ws.remove_from_queue("cart"));
        assert_eq!(ws.selection().len(), 2);
        assert!(ws.selection().contains("suite"));
        assert!(ws.selection().contains("pay"));
        let queue: Vec<&str> = ws.queue().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(queue, vec!["pay"]);
    }

    #[tokio::test]
    async fn test_refresh_bumps_generation_and_prunes_selection() {
        let api = Arc::new(StubApi::with_records(records()));
        let mut ws = workspace(&api).await;
        assert_eq!(ws.tree().generation(), 1);
        ws.toggle("suite", true);

        api.set_records(vec![
            FsRecord::folder("suite", None, "checkout"),
            FsRecord::file("pay", Some("suite"), "pay.spec.ts"),
        ]);
        ws.refresh_tree().await.unwrap();

        assert_eq!(ws.tree().generation(), 2);
        assert_eq!(ws.selection().generation(), 2);
        assert!(!ws.selection().contains("cart"));
        assert_eq!(ws.selected_count(), 1);
    }

    #[tokio::test]
    async fn test_rescan_refetches_tree() {
        let api = Arc::new(StubApi::with_records(records()));
        let mut ws = Workspace::new(api.clone(), ProjectId::new("p1"));

        assert_eq!(ws.rescan().await.unwrap(), 4);
        assert_eq!(ws.tree().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_batch_submits_queue_in_tree_order() {
        let api = Arc::new(StubApi::with_records(records()));
        api.script([PollReply::Status(RunStatus::Passed)]);
        let mut ws = workspace(&api).await;

        assert!(!ws.can_run());
        assert_eq!(ws.run_batch().await.unwrap(), None);

        ws.toggle("home", true);
        ws.toggle("suite", true);
        assert!(ws.can_run());

        let mut state = ws.coordinator().subscribe();
        ws.run_batch().await.unwrap();
        assert!(!ws.can_run());

        let submitted = &api.submissions()[0];
        assert_eq!(submitted.1, vec!["cart", "pay", "home"]);

        let done = state
            .wait_for(|s| matches!(s.phase, RunPhase::Completed { .. }))
            .await
            .unwrap()
            .clone();
        assert_eq!(done.session.unwrap().status, RunStatus::Passed);
        assert!(ws.can_run());
    }

    #[tokio::test]
    async fn test_suite_round_trip_through_workspace() {
        let api = Arc::new(StubApi::with_records(records()));
        let mut ws = workspace(&api).await;

        ws.toggle("suite", true);
        let suite = ws.save_suite("checkout", None).await.unwrap();
        ws.clear_selection();
        assert_eq!(ws.selected_count(), 0);

        ws.load_suite(&suite);
        assert_eq!(ws.selected_count(), 2);

        ws.delete_suite(&suite.id).await.unwrap();
        assert!(ws.list_suites().await.unwrap().is_empty());
        assert_eq!(ws.selected_count(), 2);
    }

    #[tokio::test]
    async fn test_switch_project_clears_selection() {
        let api = Arc::new(StubApi::with_records(records()));
        let mut ws = workspace(&api).await;
        ws.toggle("suite", true);

        ws.switch_project(ProjectId::new("p2")).await.unwrap();

        assert_eq!(ws.project(), &ProjectId::new("p2"));
        assert_eq!(ws.suites().project(), &ProjectId::new("p2"));
        assert!(ws.selection().is_empty());
        assert_eq!(ws.tree().generation(), 2);
    }
}
