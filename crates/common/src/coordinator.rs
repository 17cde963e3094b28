//! Batch-run coordination
//!
//! Submits a batch run and observes it until the remote reports a terminal status.
//!
//! ```text
//! Idle ──run_batch──▶ Submitting ──{runId}──▶ Polling ──status != running──▶ Completed
//!   ▲                     │                                                     │
//!   └──── submit error ───┘◀──────────────────── next run_batch ────────────────┘
//! ```
//!
//! Observation runs in a spawned poller task owned by the coordinator through a
//! cancellation token. Dropping the coordinator, detaching, or switching project
//! cancels the poller; the remote job itself keeps running.

use crate::api::WorkspaceApi;
use crate::error::Result;
use crate::types::{ProjectId, RunConfig, RunSnapshot, RunStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default delay between status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

const EVENT_CAPACITY: usize = 64;

/// Where the coordinator is in a run's lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Submitting,
    Polling { run_id: String },
    Completed { run_id: String, status: RunStatus },
}

impl RunPhase {
    /// Submitting or polling; a new batch is refused while this holds.
    pub fn is_active(&self) -> bool {
        matches!(self, RunPhase::Submitting | RunPhase::Polling { .. })
    }
}

/// Published view of the coordinator
#[derive(Debug, Clone)]
pub struct RunState {
    pub phase: RunPhase,
    /// Latest snapshot. Replaced wholesale on every poll.
    pub session: Option<RunSnapshot>,
    /// Files submitted with the current run
    pub total: usize,
    epoch: u64,
}

impl RunState {
    fn idle() -> Self {
        Self {
            phase: RunPhase::Idle,
            session: None,
            total: 0,
            epoch: 0,
        }
    }

    pub fn progress(&self) -> f64 {
        self.session
            .as_ref()
            .map_or(0.0, |session| session.progress(self.total))
    }
}

/// Notifications surfaced to the owning view
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Started { run_id: String, total: usize },
    PollFailed { run_id: String, message: String },
    Completed { run_id: String, status: RunStatus },
    Detached { run_id: String },
}

struct Poller {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Single-flight batch-run coordinator for one view
pub struct RunCoordinator {
    api: Arc<dyn WorkspaceApi>,
    project: ProjectId,
    interval: Duration,
    state: Arc<watch::Sender<RunState>>,
    events: broadcast::Sender<RunEvent>,
    poller: Option<Poller>,
    epoch: u64,
}

impl RunCoordinator {
    pub fn new(api: Arc<dyn WorkspaceApi>, project: ProjectId) -> Self {
        let (state, _) = watch::channel(RunState::idle());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            project,
            interval: DEFAULT_POLL_INTERVAL,
            state: Arc::new(state),
            events,
            poller: None,
            epoch: 0,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn state(&self) -> RunState {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> RunPhase {
        self.state.borrow().phase.clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().phase.is_active()
    }

    pub fn active_run_id(&self) -> Option<String> {
        match &self.state.borrow().phase {
            RunPhase::Polling { run_id } => Some(run_id.clone()),
            _ => None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<RunEvent> {
        self.events.subscribe()
    }

    /// Submit `file_ids` as one batch run and start observing it.
    ///
    /// Returns `Ok(None)` without contacting the remote when `file_ids` is empty or
    /// a run is already tracked. A submission error leaves the coordinator idle.
    pub async fn run_batch(
        &mut self,
        file_ids: Vec<String>,
        config: &RunConfig,
    ) -> Result<Option<String>> {
        if file_ids.is_empty() {
            debug!("Ignoring batch run with empty selection");
            return Ok(None);
        }
        if self.is_running() {
            debug!("Ignoring batch run, another run is active");
            return Ok(None);
        }

        let total = file_ids.len();
        self.state.send_modify(|s| {
            s.phase = RunPhase::Submitting;
            s.session = None;
            s.total = total;
        });
        info!("Starting batch run with {} tests", total);

        let ticket = match self
            .api
            .submit_batch_run(&self.project, &file_ids, config)
            .await
        {
            Ok(ticket) => ticket,
            Err(e) => {
                error!("Batch run submission failed: {}", e);
                self.state.send_modify(|s| {
                    s.phase = RunPhase::Idle;
                    s.total = 0;
                });
                return Err(e);
            }
        };

        let run_id = ticket.run_id;
        let seed = RunSnapshot {
            id: run_id.clone(),
            status: RunStatus::Pending,
            logs: vec![
                format!(
                    "[System] Initializing run in {} environment...",
                    config.environment
                ),
                format!(
                    "[System] Browser: {} (Headless: {})",
                    config.browser, config.headless
                ),
            ],
            results: Vec::new(),
        };
        self.state.send_modify(|s| {
            s.phase = RunPhase::Polling {
                run_id: run_id.clone(),
            };
            s.session = Some(seed);
        });
        info!("Run {} started", run_id);
        let _ = self.events.send(RunEvent::Started {
            run_id: run_id.clone(),
            total,
        });

        self.start_poller(run_id.clone());
        Ok(Some(run_id))
    }

    /// Ask the remote to cancel the observed run, then stop observing it.
    ///
    /// Polling is paused while the request is in flight so no terminal snapshot can
    /// land alongside the cancellation. Returns `Ok(false)` when nothing is being
    /// polled. On error polling resumes.
    pub async fn cancel_run(&mut self) -> Result<bool> {
        let Some(run_id) = self.active_run_id() else {
            return Ok(false);
        };

        self.stop_poller();
        if self.active_run_id().as_deref() != Some(run_id.as_str()) {
            // The last poll finished the run before the poller stopped.
            return Ok(false);
        }

        if let Err(e) = self.api.cancel_run(&run_id, &self.project).await {
            warn!("Cancelling run {} failed: {}", run_id, e);
            self.start_poller(run_id);
            return Err(e);
        }

        self.state.send_modify(|s| {
            s.phase = RunPhase::Completed {
                run_id: run_id.clone(),
                status: RunStatus::Cancelled,
            };
            if let Some(session) = s.session.as_mut() {
                session.status = RunStatus::Cancelled;
            }
        });
        info!("Run {} cancelled", run_id);
        let _ = self.events.send(RunEvent::Completed {
            run_id,
            status: RunStatus::Cancelled,
        });
        Ok(true)
    }

    /// Stop observing without touching the remote job.
    pub fn detach(&mut self) {
        self.stop_poller();
        let run_id = self.active_run_id();
        self.state.send_modify(|s| {
            if s.phase.is_active() {
                s.phase = RunPhase::Idle;
                s.session = None;
                s.total = 0;
            }
        });
        if let Some(run_id) = run_id {
            info!("Detached from run {}", run_id);
            let _ = self.events.send(RunEvent::Detached { run_id });
        }
    }

    /// Rebind to another project.
    ///
    /// The current poller is cancelled first; an observed run is then polled again
    /// under the new project key. Must be called from within a Tokio runtime.
    pub fn switch_project(&mut self, project: ProjectId) {
        if project == self.project {
            return;
        }
        self.stop_poller();
        info!("Switching project {} -> {}", self.project, project);
        self.project = project;

        if let Some(run_id) = self.active_run_id() {
            self.start_poller(run_id);
        }
    }

    fn start_poller(&mut self, run_id: String) {
        self.stop_poller();

        self.epoch += 1;
        let epoch = self.epoch;
        self.state.send_modify(|s| s.epoch = epoch);

        let token = CancellationToken::new();
        let task = PollTask {
            api: self.api.clone(),
            project: self.project.clone(),
            run_id,
            interval: self.interval,
            state: self.state.clone(),
            events: self.events.clone(),
            token: token.clone(),
            epoch,
        };
        let handle = tokio::spawn(task.run());
        self.poller = Some(Poller { token, handle });
    }

    fn stop_poller(&mut self) {
        if let Some(poller) = self.poller.take() {
            if !poller.handle.is_finished() {
                debug!("Cancelling poller (epoch {})", self.epoch);
            }
        }
    }
}

/// State owned by one spawned poller
struct PollTask {
    api: Arc<dyn WorkspaceApi>,
    project: ProjectId,
    run_id: String,
    interval: Duration,
    state: Arc<watch::Sender<RunState>>,
    events: broadcast::Sender<RunEvent>,
    token: CancellationToken,
    epoch: u64,
}

impl PollTask {
    async fn run(self) {
        debug!("Polling run {} for project {}", self.run_id, self.project);

        if self.tick().await {
            return;
        }

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.token.cancelled() => {
                    debug!("Poller for run {} cancelled", self.run_id);
                    return;
                }
                _ = ticker.tick() => {
                    if self.tick().await {
                        return;
                    }
                }
            }
        }
    }

    /// One status fetch. Returns true once polling should stop.
    async fn tick(&self) -> bool {
        let result = tokio::select! {
            _ = self.token.cancelled() => return true,
            result = self.api.run_status(&self.run_id, &self.project) => result,
        };

        match result {
            Ok(snapshot) => self.publish(snapshot),
            Err(e) => {
                warn!("Polling error for run {}: {}", self.run_id, e);
                let _ = self.events.send(RunEvent::PollFailed {
                    run_id: self.run_id.clone(),
                    message: e.to_string(),
                });
                false
            }
        }
    }

    fn publish(&self, snapshot: RunSnapshot) -> bool {
        let status = snapshot.status;
        let terminal = status.is_terminal();

        let applied = self.state.send_if_modified(|s| {
            if s.epoch != self.epoch || self.token.is_cancelled() {
                return false;
            }
            s.session = Some(snapshot);
            if terminal {
                s.phase = RunPhase::Completed {
                    run_id: self.run_id.clone(),
                    status,
                };
            }
            true
        });

        if !applied {
            debug!("Discarding stale snapshot for run {}", self.run_id);
            return true;
        }

        if terminal {
            if status.is_success() {
                info!("Run {} finished with status {}", self.run_id, status);
            } else {
                warn!("Run {} finished with status {}", self.run_id, status);
            }
            let _ = self.events.send(RunEvent::Completed {
                run_id: self.run_id.clone(),
                status,
            });
        }
        terminal
    }
}
