//! Core types for TestDeck

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Project identifier as issued by the remote
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Folder,
    File,
}

impl NodeKind {
    /// Sort rank: folders sort before files
    pub fn rank(self) -> u8 {
        match self {
            NodeKind::Folder => 0,
            NodeKind::File => 1,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Folder => write!(f, "folder"),
            NodeKind::File => write!(f, "file"),
        }
    }
}

/// Flat file-system record as delivered by the remote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsRecord {
    pub id: String,
    #[serde(rename = "parent_id", alias = "parentId", default)]
    pub parent_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FsRecord {
    pub fn folder(id: &str, parent_id: Option<&str>, name: &str) -> Self {
        Self::new(id, parent_id, name, NodeKind::Folder)
    }

    pub fn file(id: &str, parent_id: Option<&str>, name: &str) -> Self {
        Self::new(id, parent_id, name, NodeKind::File)
    }

    fn new(id: &str, parent_id: Option<&str>, name: &str, kind: NodeKind) -> Self {
        Self {
            id: id.to_string(),
            parent_id: parent_id.map(str::to_string),
            name: name.to_string(),
            kind,
            language: None,
            content: None,
        }
    }
}

/// Target environment for a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Prod,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Local => write!(f, "local"),
            Environment::Staging => write!(f, "staging"),
            Environment::Prod => write!(f, "prod"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "prod" => Ok(Environment::Prod),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// Browser used by the remote runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Browser {
    #[default]
    Chrome,
    Firefox,
    Edge,
}

impl std::fmt::Display for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Browser::Chrome => write!(f, "chrome"),
            Browser::Firefox => write!(f, "firefox"),
            Browser::Edge => write!(f, "edge"),
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "chrome" => Ok(Browser::Chrome),
            "firefox" => Ok(Browser::Firefox),
            "edge" => Ok(Browser::Edge),
            other => Err(format!("unknown browser '{}'", other)),
        }
    }
}

/// Batch run configuration passed through to the remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub browser: Browser,
    #[serde(default)]
    pub headless: bool,
    #[serde(default = "default_parallel")]
    pub parallel: u32,
}

fn default_parallel() -> u32 {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            browser: Browser::Chrome,
            headless: false,
            parallel: 1,
        }
    }
}

/// Run status as reported by the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Error,
    Cancelled,
    Completed,
    /// A status string this client does not know
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Any status other than `running` ends observation.
    pub fn is_terminal(self) -> bool {
        self != RunStatus::Running
    }

    /// Whether the remote reported the run as finished without failures.
    pub fn is_success(self) -> bool {
        matches!(self, RunStatus::Passed | RunStatus::Completed)
    }
}

impl Default for RunStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Passed => write!(f, "passed"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Error => write!(f, "error"),
            RunStatus::Cancelled => write!(f, "cancelled"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Outcome of a single test file within a run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    #[serde(default)]
    pub test_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

/// Response to a batch submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTicket {
    pub run_id: String,
}

/// Full run snapshot returned by a status poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub results: Vec<TestResult>,
}

impl RunSnapshot {
    /// Approximate completion ratio in `[0, 1]` given the number of queued files.
    ///
    /// Depends on how the remote fills `results`, so treat it as an estimate.
    pub fn progress(&self, total: usize) -> f64 {
        let ratio = self.results.len() as f64 / total.max(1) as f64;
        ratio.min(1.0)
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status == "passed").count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status == "failed").count()
    }
}

/// Persisted named selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suite {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub file_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body sent when creating a suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub file_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_record_accepts_both_parent_spellings() {
        let snake: FsRecord =
            serde_json::from_str(r#"{"id":"2","parent_id":"1","name":"a.ts","type":"file"}"#)
                .unwrap();
        let camel: FsRecord =
            serde_json::from_str(r#"{"id":"2","parentId":"1","name":"a.ts","type":"file"}"#)
                .unwrap();
        assert_eq!(snake, camel);
        assert_eq!(snake.parent_id.as_deref(), Some("1"));

        let root: FsRecord =
            serde_json::from_str(r#"{"id":"1","parent_id":null,"name":"b","type":"folder"}"#)
                .unwrap();
        assert_eq!(root.parent_id, None);
        assert_eq!(root.kind, NodeKind::Folder);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!RunStatus::Running.is_terminal());
        for status in [
            RunStatus::Pending,
            RunStatus::Passed,
            RunStatus::Failed,
            RunStatus::Error,
            RunStatus::Cancelled,
            RunStatus::Completed,
            RunStatus::Unknown,
        ] {
            assert!(status.is_terminal(), "{} should be terminal", status);
        }
    }

    #[test]
    fn test_unlisted_status_strings_decode() {
        let done: RunSnapshot =
            serde_json::from_str(r#"{"id":"r1","status":"completed"}"#).unwrap();
        assert_eq!(done.status, RunStatus::Completed);
        assert!(done.status.is_success());

        let odd: RunSnapshot =
            serde_json::from_str(r#"{"id":"r1","status":"timed_out"}"#).unwrap();
        assert_eq!(odd.status, RunStatus::Unknown);
        assert!(odd.status.is_terminal());
        assert!(!odd.status.is_success());
    }

    #[test]
    fn test_snapshot_decodes_partial_results() {
        let snapshot: RunSnapshot = serde_json::from_str(
            r#"{"id":"r1","status":"running","results":[{"testName":"login.spec.ts"}]}"#,
        )
        .unwrap();
        assert!(snapshot.logs.is_empty());
        assert_eq!(snapshot.results[0].test_name, "login.spec.ts");
        assert_eq!(snapshot.progress(4), 0.25);
        assert_eq!(snapshot.progress(0), 1.0);
    }

    #[test]
    fn test_run_config_wire_format() {
        let config = RunConfig {
            environment: Environment::Staging,
            browser: Browser::Firefox,
            headless: true,
            parallel: 4,
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["environment"], "staging");
        assert_eq!(value["browser"], "firefox");
        assert_eq!(value["parallel"], 4);
    }

    #[test]
    fn test_suite_uses_camel_case_file_ids() {
        let suite: Suite =
            serde_json::from_str(r#"{"id":"s1","name":"smoke","fileIds":["a","b"]}"#).unwrap();
        assert_eq!(suite.file_ids, vec!["a".to_string(), "b".to_string()]);
        assert!(suite.created_at.is_none());
    }
}
