//! Run history

use anyhow::Result;
use std::sync::Arc;
use testdeck_common::{ProjectId, WorkspaceApi};

use crate::commands::run::RunDisplay;
use crate::output::{print_list, OutputFormat};

pub async fn execute(
    api: Arc<dyn WorkspaceApi>,
    project: ProjectId,
    format: OutputFormat,
) -> Result<()> {
    let runs = api.list_runs(&project).await?;
    let displays: Vec<RunDisplay> = runs.iter().map(RunDisplay::from).collect();
    print_list(&displays, format);
    Ok(())
}
