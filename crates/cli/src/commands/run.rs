//! Run Commands

use anyhow::Result;
use clap::{Args, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use testdeck_common::{
    Browser, Environment, ProjectId, RunConfig, RunPhase, RunSnapshot, RunState, RunStatus,
    TestResult, WorkspaceApi,
};

use crate::commands::{open_workspace, SelectionArgs};
use crate::config::ClientConfig;
use crate::output::{
    print_info, print_item, print_list, print_success, print_warning, status_label, OutputFormat,
    TableDisplay,
};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Target environment
    #[arg(long)]
    pub env: Option<Environment>,

    /// Browser for the remote runner
    #[arg(long)]
    pub browser: Option<Browser>,

    /// Run the browser headless
    #[arg(long)]
    pub headless: bool,

    /// Parallel workers on the remote
    #[arg(long)]
    pub parallel: Option<u32>,

    /// Submit and return without waiting for the outcome
    #[arg(long)]
    pub no_wait: bool,

    /// Cancel the remote run on Ctrl-C instead of just detaching
    #[arg(long)]
    pub cancel_on_interrupt: bool,

    /// Print remote log lines as they arrive
    #[arg(long)]
    pub logs: bool,
}

impl RunArgs {
    fn run_config(&self, defaults: &RunConfig) -> RunConfig {
        RunConfig {
            environment: self.env.unwrap_or(defaults.environment),
            browser: self.browser.unwrap_or(defaults.browser),
            headless: self.headless || defaults.headless,
            parallel: self.parallel.unwrap_or(defaults.parallel).max(1),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum RunCommands {
    /// Get the current snapshot of a run
    Status {
        /// Run ID
        id: String,
    },

    /// Ask the remote to cancel a run
    Cancel {
        /// Run ID
        id: String,
    },
}

/// Test result display wrapper
#[derive(Serialize)]
pub struct ResultDisplay {
    pub test_name: String,
    pub status: String,
    pub duration: f64,
    pub error: Option<String>,
}

impl From<TestResult> for ResultDisplay {
    fn from(result: TestResult) -> Self {
        Self {
            test_name: result.test_name,
            status: result.status,
            duration: result.duration,
            error: result.error,
        }
    }
}

impl TableDisplay for ResultDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Test", "Status", "Duration", "Error"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.test_name.clone(),
            self.status.clone(),
            format!("{:.2}s", self.duration),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

/// Run summary display wrapper
#[derive(Serialize)]
pub struct RunDisplay {
    pub id: String,
    pub status: RunStatus,
    pub results: usize,
    pub passed: usize,
    pub failed: usize,
}

impl From<&RunSnapshot> for RunDisplay {
    fn from(run: &RunSnapshot) -> Self {
        Self {
            id: run.id.clone(),
            status: run.status,
            results: run.results.len(),
            passed: run.passed_count(),
            failed: run.failed_count(),
        }
    }
}

impl TableDisplay for RunDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Status", "Results", "Passed", "Failed"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            status_label(self.status),
            self.results.to_string(),
            self.passed.to_string(),
            self.failed.to_string(),
        ]
    }
}

/// Tracks which remote log lines have been echoed.
///
/// Every poll replaces the whole log, so a shorter log than last time means the
/// remote restarted it and printing starts over. The locally seeded session is
/// replaced by the first remote snapshot, which also starts over.
#[derive(Default)]
struct LogCursor {
    printed: usize,
    remote: bool,
}

impl LogCursor {
    fn fresh<'a>(&mut self, logs: &'a [String], from_remote: bool) -> &'a [String] {
        if from_remote && !self.remote {
            self.remote = true;
            self.printed = 0;
        }
        if logs.len() < self.printed {
            self.printed = 0;
        }
        let fresh = &logs[self.printed..];
        self.printed = logs.len();
        fresh
    }
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn render(bar: &ProgressBar, state: &RunState, cursor: &mut LogCursor, echo_logs: bool) {
    let Some(session) = state.session.as_ref() else {
        return;
    };
    bar.set_position(session.results.len().min(state.total) as u64);
    bar.set_message(format!("{} ({:.0}%)", session.status, state.progress() * 100.0));
    if echo_logs {
        // Only the seed is pending while polling; a polled pending is terminal.
        let from_remote = session.status != RunStatus::Pending
            || matches!(state.phase, RunPhase::Completed { .. });
        for line in cursor.fresh(&session.logs, from_remote) {
            bar.println(line);
        }
    }
}

/// What to report after Ctrl-C asked for a cancel
fn interrupt_outcome(run_id: &str, cancelled: bool, status: Option<RunStatus>) -> String {
    if cancelled {
        return format!("Run {} cancelled", run_id);
    }
    match status {
        Some(status) => format!(
            "Run {} already finished with status {}; nothing to cancel",
            run_id, status
        ),
        None => format!("Run {} is no longer tracked; nothing to cancel", run_id),
    }
}

pub async fn execute(
    args: RunArgs,
    api: Arc<dyn WorkspaceApi>,
    config: &ClientConfig,
    project: ProjectId,
    format: OutputFormat,
) -> Result<()> {
    let run_config = args.run_config(&config.run);
    let mut ws = open_workspace(api, config, project).await?;
    ws.set_run_config(run_config.clone());
    args.selection.apply(&mut ws).await?;

    let total = ws.selected_count();
    if total == 0 {
        print_warning("Nothing queued; select files with --select or --suite");
        return Ok(());
    }

    print_info(&format!(
        "Starting batch run with {} tests ({} / {}, headless: {})",
        total, run_config.environment, run_config.browser, run_config.headless
    ));
    let mut state = ws.coordinator().subscribe();
    let Some(run_id) = ws.run_batch().await? else {
        print_warning("A run is already active");
        return Ok(());
    };
    print_success(&format!("Run {} started", run_id));

    if args.no_wait {
        ws.coordinator_mut().detach();
        print_info(&format!("Follow with: testdeck runs status {}", run_id));
        return Ok(());
    }

    let bar = progress_bar(total);
    let mut cursor = LogCursor::default();

    let interrupted = loop {
        {
            let current = state.borrow_and_update();
            render(&bar, &current, &mut cursor, args.logs);
            if matches!(current.phase, RunPhase::Completed { .. }) {
                break false;
            }
        }

        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break false;
                }
            }
            _ = tokio::signal::ctrl_c() => break true,
        }
    };
    bar.finish_and_clear();

    if interrupted {
        if args.cancel_on_interrupt {
            let cancelled = ws.coordinator_mut().cancel_run().await?;
            let status = ws.coordinator().state().session.map(|s| s.status);
            print_warning(&interrupt_outcome(&run_id, cancelled, status));
        } else {
            ws.coordinator_mut().detach();
            print_warning(&format!(
                "Stopped watching run {}; it continues on the remote",
                run_id
            ));
        }
        return Ok(());
    }

    let final_state = ws.coordinator().state();
    let Some(session) = final_state.session else {
        anyhow::bail!("Run {} ended without a snapshot", run_id);
    };

    let results: Vec<ResultDisplay> = session
        .results
        .iter()
        .cloned()
        .map(ResultDisplay::from)
        .collect();
    print_list(&results, format);

    match session.status {
        RunStatus::Passed | RunStatus::Completed => print_success("All tests passed"),
        RunStatus::Failed => print_warning("Some tests failed"),
        other => print_warning(&format!("Run finished with status {}", other)),
    }

    if !session.status.is_success() {
        anyhow::bail!("Run {} finished with status {}", run_id, session.status);
    }
    Ok(())
}

pub async fn execute_command(
    cmd: RunCommands,
    api: Arc<dyn WorkspaceApi>,
    project: ProjectId,
    format: OutputFormat,
) -> Result<()> {
    match cmd {
        RunCommands::Status { id } => {
            let run = api.run_status(&id, &project).await?;
            print_item(&RunDisplay::from(&run), format);
            let results: Vec<ResultDisplay> =
                run.results.into_iter().map(ResultDisplay::from).collect();
            if !results.is_empty() {
                print_list(&results, format);
            }
        }

        RunCommands::Cancel { id } => {
            api.cancel_run(&id, &project).await?;
            print_success(&format!("Run {} cancelled", id));
        }
    }

    Ok(())
}
