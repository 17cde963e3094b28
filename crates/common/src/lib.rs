//! TestDeck Common Library
//!
//! Workspace tree, selection, saved suites and batch-run coordination shared by
//! the TestDeck front ends.

pub mod api;
pub mod coordinator;
pub mod error;
pub mod selection;
pub mod suites;
pub mod tree;
pub mod types;
pub mod workspace;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use api::WorkspaceApi;
pub use coordinator::{RunCoordinator, RunEvent, RunPhase, RunState, DEFAULT_POLL_INTERVAL};
pub use error::{Error, Result};
pub use selection::SelectionModel;
pub use suites::SuiteStore;
pub use tree::{FileNode, FileTree};
pub use types::*;
pub use workspace::Workspace;

/// TestDeck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default directory for client state
pub fn default_store_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".testdeck")
}

/// Default configuration file path
pub fn default_config_path() -> std::path::PathBuf {
    default_store_path().join("config.toml")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
