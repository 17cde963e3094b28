//! Tree Commands

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;
use testdeck_common::{FileNode, FileTree, ProjectId, WorkspaceApi};

use crate::commands::open_workspace;
use crate::config::ClientConfig;
use crate::output::{print_list, print_success, OutputFormat, TableDisplay};

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Only show nodes up to this depth (0 = roots)
    #[arg(long)]
    pub depth: Option<usize>,

    /// Rescan the project on disk before listing
    #[arg(long)]
    pub rescan: bool,
}

/// Tree node display wrapper for serialization
#[derive(Serialize)]
pub struct NodeDisplay {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub depth: usize,
    pub language: Option<String>,
    pub children: usize,
}

impl NodeDisplay {
    pub fn new(node: &FileNode, depth: usize) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind.to_string(),
            depth,
            language: node.language.clone(),
            children: node.child_count(),
        }
    }
}

impl TableDisplay for NodeDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "ID", "Type", "Language"]
    }

    fn row(&self) -> Vec<String> {
        let marker = if self.kind == "folder" { "▸ " } else { "" };
        vec![
            format!("{}{}{}", "  ".repeat(self.depth), marker, self.name),
            self.id.clone(),
            self.kind.clone(),
            self.language.clone().unwrap_or_default(),
        ]
    }
}

/// Flatten `tree` in display order, cut at `max_depth`
pub fn flatten(tree: &FileTree, max_depth: Option<usize>) -> Vec<NodeDisplay> {
    tree.preorder()
        .filter(|(_, depth)| max_depth.map_or(true, |max| *depth <= max))
        .map(|(node, depth)| NodeDisplay::new(node, depth))
        .collect()
}

pub async fn execute(
    args: TreeArgs,
    api: Arc<dyn WorkspaceApi>,
    config: &ClientConfig,
    project: ProjectId,
    format: OutputFormat,
) -> Result<()> {
    let mut ws = open_workspace(api, config, project).await?;

    if args.rescan {
        let count = ws.rescan().await?;
        print_success(&format!("Found {} files", count));
    }

    let rows = flatten(ws.tree(), args.depth);
    print_list(&rows, format);
    Ok(())
}
