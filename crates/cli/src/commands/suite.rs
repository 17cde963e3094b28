//! Suite Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use std::sync::Arc;
use testdeck_common::{ProjectId, Suite, SuiteStore, WorkspaceApi};

use crate::commands::{open_workspace, SelectionArgs};
use crate::config::ClientConfig;
use crate::output::{print_item, print_list, print_success, OutputFormat, TableDisplay};

#[derive(Subcommand, Debug)]
pub enum SuiteCommands {
    /// List saved suites
    List,

    /// Show a suite and the files it would queue
    Show {
        /// Suite ID or name
        suite: String,
    },

    /// Save the given selection as a suite
    Save {
        /// Suite name
        #[arg(short, long)]
        name: String,

        /// Optional description
        #[arg(short, long)]
        description: Option<String>,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Delete a saved suite
    Delete {
        /// Suite ID or name
        suite: String,
    },
}

/// Suite display wrapper for serialization
#[derive(Serialize)]
pub struct SuiteDisplay {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub entries: usize,
    pub updated: Option<String>,
}

impl From<&Suite> for SuiteDisplay {
    fn from(suite: &Suite) -> Self {
        Self {
            id: suite.id.clone(),
            name: suite.name.clone(),
            description: suite.description.clone(),
            entries: suite.file_ids.len(),
            updated: suite
                .updated_at
                .or(suite.created_at)
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
        }
    }
}

impl TableDisplay for SuiteDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Name", "Entries", "Updated", "Description"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.entries.to_string(),
            self.updated.clone().unwrap_or_default(),
            self.description.clone().unwrap_or_default(),
        ]
    }
}

pub async fn execute(
    cmd: SuiteCommands,
    api: Arc<dyn WorkspaceApi>,
    config: &ClientConfig,
    project: ProjectId,
    format: OutputFormat,
) -> Result<()> {
    match cmd {
        SuiteCommands::List => {
            let store = SuiteStore::new(api, project);
            let suites = store.list().await?;
            let displays: Vec<SuiteDisplay> = suites.iter().map(SuiteDisplay::from).collect();
            print_list(&displays, format);
        }

        SuiteCommands::Show { suite } => {
            let mut ws = open_workspace(api, config, project).await?;
            let suite = ws.suites().find(&suite).await?;
            print_item(&SuiteDisplay::from(&suite), format);

            ws.load_suite(&suite);
            let queued: Vec<super::queue::QueueEntry> = ws
                .queue()
                .into_iter()
                .enumerate()
                .map(|(i, node)| super::queue::QueueEntry::new(i + 1, node))
                .collect();
            print_list(&queued, format);
        }

        SuiteCommands::Save {
            name,
            description,
            selection,
        } => {
            let mut ws = open_workspace(api, config, project).await?;
            selection.apply(&mut ws).await?;
            if ws.selected_count() == 0 {
                anyhow::bail!("No files selected; nothing to save");
            }

            let suite = ws.save_suite(&name, description).await?;
            print_success(&format!("Suite '{}' saved", suite.name));
            print_item(&SuiteDisplay::from(&suite), format);
        }

        SuiteCommands::Delete { suite } => {
            let store = SuiteStore::new(api, project);
            let found = store.find(&suite).await?;
            store.delete(&found.id).await?;
            print_success(&format!("Suite '{}' deleted", found.name));
        }
    }

    Ok(())
}
