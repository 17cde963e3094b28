//! CLI Commands

pub mod config;
pub mod history;
pub mod queue;
pub mod run;
pub mod suite;
pub mod tree;

use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use testdeck_common::{ProjectId, Workspace, WorkspaceApi};

use crate::config::ClientConfig;
use crate::output::print_warning;

/// Selection flags shared by `queue`, `run` and `suite save`
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Start from a saved suite (id or name); replaces any prior selection
    #[arg(long)]
    pub suite: Option<String>,

    /// Select a node and everything below it
    #[arg(short = 's', long = "select", value_name = "NODE_ID")]
    pub select: Vec<String>,

    /// Deselect a node and everything below it
    #[arg(long = "deselect", value_name = "NODE_ID")]
    pub deselect: Vec<String>,

    /// Drop a single file from the queue, leaving its folder selected
    #[arg(long = "drop", value_name = "NODE_ID")]
    pub drop: Vec<String>,
}

impl SelectionArgs {
    /// Apply suite load, cascading toggles and single drops, in that order.
    pub async fn apply(&self, ws: &mut Workspace) -> Result<()> {
        if let Some(key) = &self.suite {
            let suite = ws.suites().find(key).await?;
            ws.load_suite(&suite);
        }
        for id in &self.select {
            if ws.toggle(id, true) == 0 {
                print_warning(&format!("Node '{}' is not in the project tree", id));
            }
        }
        for id in &self.deselect {
            ws.toggle(id, false);
        }
        for id in &self.drop {
            ws.remove_from_queue(id);
        }
        Ok(())
    }
}

/// Open a workspace for the configured project with its tree loaded
pub async fn open_workspace(
    api: Arc<dyn WorkspaceApi>,
    config: &ClientConfig,
    project: ProjectId,
) -> Result<Workspace> {
    let mut ws = Workspace::new(api, project)
        .with_poll_interval(config.poll_interval())
        .with_run_config(config.run.clone());
    ws.refresh_tree().await?;
    Ok(ws)
}
