//! Queue Command

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use testdeck_common::{FileNode, ProjectId, WorkspaceApi};

use crate::commands::{open_workspace, SelectionArgs};
use crate::config::ClientConfig;
use crate::output::{print_info, print_list, OutputFormat, TableDisplay};

/// Queued file display wrapper
#[derive(Serialize)]
pub struct QueueEntry {
    pub position: usize,
    pub id: String,
    pub name: String,
    pub language: Option<String>,
}

impl QueueEntry {
    pub fn new(position: usize, node: &FileNode) -> Self {
        Self {
            position,
            id: node.id.clone(),
            name: node.name.clone(),
            language: node.language.clone(),
        }
    }
}

impl TableDisplay for QueueEntry {
    fn headers() -> Vec<&'static str> {
        vec!["#", "File", "ID", "Language"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.position.to_string(),
            self.name.clone(),
            self.id.clone(),
            self.language.clone().unwrap_or_default(),
        ]
    }
}

pub async fn execute(
    args: SelectionArgs,
    api: Arc<dyn WorkspaceApi>,
    config: &ClientConfig,
    project: ProjectId,
    format: OutputFormat,
) -> Result<()> {
    let mut ws = open_workspace(api, config, project).await?;
    args.apply(&mut ws).await?;

    let entries: Vec<QueueEntry> = ws
        .queue()
        .into_iter()
        .enumerate()
        .map(|(i, node)| QueueEntry::new(i + 1, node))
        .collect();
    print_list(&entries, format);

    if matches!(format, OutputFormat::Table) {
        print_info(&format!(
            "{} files queued ({} ids selected)",
            entries.len(),
            ws.selection().len()
        ));
    }
    Ok(())
}
