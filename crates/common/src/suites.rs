//! Saved suites
//!
//! A suite is a snapshot of the selection at save time. Loading one replaces the
//! live selection; neither side keeps a reference to the other afterwards.

use crate::api::WorkspaceApi;
use crate::error::{Error, Result};
use crate::selection::SelectionModel;
use crate::types::{ProjectId, Suite, SuiteDraft};
use std::sync::Arc;
use tracing::info;

/// Suite persistence bound to one project
pub struct SuiteStore {
    api: Arc<dyn WorkspaceApi>,
    project: ProjectId,
}

impl SuiteStore {
    pub fn new(api: Arc<dyn WorkspaceApi>, project: ProjectId) -> Self {
        Self { api, project }
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn set_project(&mut self, project: ProjectId) {
        self.project = project;
    }

    pub async fn list(&self) -> Result<Vec<Suite>> {
        self.api.list_suites(&self.project).await
    }

    /// Persist the current selection under `name`.
    pub async fn save(
        &self,
        name: &str,
        description: Option<String>,
        selection: &SelectionModel,
    ) -> Result<Suite> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("suite name must not be empty".into()));
        }
        if selection.is_empty() {
            return Err(Error::InvalidInput("nothing selected to save".into()));
        }

        let draft = SuiteDraft {
            name: name.to_string(),
            description,
            file_ids: selection.ids(),
        };
        let suite = self.api.create_suite(&self.project, &draft).await?;
        info!("Saved suite '{}' with {} ids", suite.name, draft.file_ids.len());
        Ok(suite)
    }

    /// Replace `selection` with the suite's ids.
    pub fn load(&self, suite: &Suite, selection: &mut SelectionModel) {
        selection.replace(suite.file_ids.iter().cloned());
        info!("Loaded suite '{}' ({} ids)", suite.name, suite.file_ids.len());
    }

    pub async fn delete(&self, suite_id: &str) -> Result<()> {
        self.api.delete_suite(&self.project, suite_id).await?;
        info!("Deleted suite {}", suite_id);
        Ok(())
    }

    /// Look up a suite by id or, failing that, by exact name.
    pub async fn find(&self, key: &str) -> Result<Suite> {
        let suites = self.list().await?;
        suites
            .iter()
            .find(|s| s.id == key)
            .or_else(|| suites.iter().find(|s| s.name == key))
            .cloned()
            .ok_or_else(|| Error::not_found("suite", key))
    }
}
