//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use testdeck_common::{ProjectId, RunConfig};

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the test hub API
    pub api_url: String,

    /// Project used when none is given on the command line
    pub project_id: Option<String>,

    /// Delay between run status polls
    pub poll_interval_ms: u64,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// Defaults for batch runs
    pub run: RunConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8081".to_string(),
            project_id: None,
            poll_interval_ms: 1000,
            request_timeout_secs: 30,
            run: RunConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            anyhow::bail!("api_url must be an http(s) URL, got '{}'", self.api_url);
        }
        if self.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than zero");
        }
        if self.run.parallel == 0 {
            anyhow::bail!("run.parallel must be at least 1");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The configured project, or an error naming how to set one
    pub fn project(&self) -> anyhow::Result<ProjectId> {
        self.project_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(ProjectId::from)
            .ok_or_else(|| {
                anyhow::anyhow!("No project selected; pass --project or set TESTDECK_PROJECT")
            })
    }
}

/// Resolve `~/` in a user-supplied path
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        Err(_) => path.to_path_buf(),
    }
}
