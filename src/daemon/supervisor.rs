// Daemon lifecycle supervisor
//
// Owns the probe/launch/health-check/shutdown state machine for the local
// storage node. Only one supervisor should own a launched handle per host
// process; `ensure_running` and `shutdown` are mutually exclusive under
// the state mutex so two callers cannot both decide to launch.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::probe::{ProcessProbe, SysinfoProbe};
use crate::api::NodeApi;
use crate::config::ClientConfig;
use crate::errors::{ApiError, DaemonError};

/// How long a freshly launched daemon gets to become reachable.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
/// Poll interval while waiting for a launched daemon.
const STARTUP_POLL: Duration = Duration::from_millis(500);
/// How long graceful termination gets before escalating to kill.
const TERMINATE_TIMEOUT: Duration = Duration::from_secs(3);
/// Poll interval while waiting for a terminating daemon to exit.
const TERMINATE_POLL: Duration = Duration::from_millis(100);

/// Launches the daemon process as a detached child.
pub trait DaemonSpawner: Send + Sync {
    fn spawn(&self, binary: &str) -> Result<Child, DaemonError>;
}

/// Stock spawner: `<binary> daemon`, detached, with output appended to
/// `~/.ipfs-stac/daemon.log`.
#[derive(Debug, Default)]
pub struct CommandSpawner;

impl CommandSpawner {
    fn log_file(&self) -> Option<std::fs::File> {
        let path: PathBuf = dirs::home_dir()?.join(".ipfs-stac").join("daemon.log");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok()?;
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok()
    }
}

impl DaemonSpawner for CommandSpawner {
    fn spawn(&self, binary: &str) -> Result<Child, DaemonError> {
        let mut command = Command::new(binary);
        command.arg("daemon").stdin(Stdio::null());

        // Log redirection is best-effort; a missing home directory must
        // not stop the launch.
        match self.log_file() {
            Some(log) => {
                let stderr_log = log.try_clone().ok();
                command.stdout(Stdio::from(log));
                match stderr_log {
                    Some(log) => command.stderr(Stdio::from(log)),
                    None => command.stderr(Stdio::null()),
                };
            }
            None => {
                command.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        info!(binary = %binary, "Spawning storage-node daemon");
        command.spawn().map_err(|source| DaemonError::SpawnFailed {
            binary: binary.to_string(),
            source,
        })
    }
}

/// Where the supervisor last left the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorStatus {
    NotChecked,
    Running,
    Failed,
    Stopped,
}

struct DaemonState {
    launched: Option<Child>,
    status: SupervisorStatus,
}

/// Supervises the local storage-node daemon.
pub struct DaemonSupervisor {
    api: Arc<NodeApi>,
    api_url: String,
    binary: String,
    probe: Box<dyn ProcessProbe>,
    spawner: Box<dyn DaemonSpawner>,
    state: Mutex<DaemonState>,
}

impl DaemonSupervisor {
    pub fn new(config: &ClientConfig, api: Arc<NodeApi>) -> Self {
        Self::with_parts(config, api, Box::new(SysinfoProbe), Box::new(CommandSpawner))
    }

    /// Construct with explicit probe/spawner implementations.
    pub fn with_parts(
        config: &ClientConfig,
        api: Arc<NodeApi>,
        probe: Box<dyn ProcessProbe>,
        spawner: Box<dyn DaemonSpawner>,
    ) -> Self {
        Self {
            api,
            api_url: config.api_url(),
            binary: config.daemon_binary.clone(),
            probe,
            spawner,
            state: Mutex::new(DaemonState {
                launched: None,
                status: SupervisorStatus::NotChecked,
            }),
        }
    }

    pub async fn status(&self) -> SupervisorStatus {
        self.state.lock().await.status
    }

    /// Ensure a reachable daemon exists, launching one if needed.
    ///
    /// Idempotent: when this supervisor already launched a daemon that is
    /// still alive, the call skips probe and launch and only re-runs the
    /// health check. A non-success health response from a confirmed
    /// process is a warning, not a failure; an unreachable node is fatal.
    pub async fn ensure_running(&self) -> Result<(), DaemonError> {
        let mut state = self.state.lock().await;

        let launched_alive = match state.launched.as_mut() {
            Some(child) => child.try_wait().ok().flatten().is_none(),
            None => false,
        };

        if launched_alive {
            debug!("Daemon already launched by this supervisor; re-checking health");
            return self.health_check_existing(&mut state).await;
        }
        state.launched = None;

        if self.probe.is_process_running(&self.binary) {
            debug!(binary = %self.binary, "Existing daemon process found");
            return self.health_check_existing(&mut state).await;
        }

        info!(binary = %self.binary, "No daemon process found, launching");
        let child = self.spawner.spawn(&self.binary)?;
        state.launched = Some(child);

        match self.wait_until_reachable().await {
            Ok(()) => {
                state.status = SupervisorStatus::Running;
                info!("Daemon started and reachable");
                Ok(())
            }
            Err(err) => {
                // The launch is our side effect; do not leak a child that
                // never became a usable node.
                if let Some(mut child) = state.launched.take() {
                    child.kill().ok();
                    child.wait().ok();
                }
                state.status = SupervisorStatus::Failed;
                Err(err)
            }
        }
    }

    /// Terminate the daemon if this supervisor launched it.
    ///
    /// No-op when nothing was launched. The handle is cleared on every
    /// path, including when termination itself fails.
    pub async fn shutdown(&self) -> Result<(), DaemonError> {
        let mut state = self.state.lock().await;

        let Some(mut child) = state.launched.take() else {
            debug!("No daemon launched by this supervisor; shutdown is a no-op");
            return Ok(());
        };

        let pid = child.id();
        info!(pid = pid, "Shutting down launched daemon");

        request_graceful_termination(&mut child);
        if wait_for_exit(&mut child, TERMINATE_TIMEOUT).await {
            state.status = SupervisorStatus::Stopped;
            return Ok(());
        }

        warn!(pid = pid, "Daemon did not exit gracefully, escalating to kill");
        child.kill().ok();
        if wait_for_exit(&mut child, TERMINATE_TIMEOUT).await {
            state.status = SupervisorStatus::Stopped;
            return Ok(());
        }

        state.status = SupervisorStatus::Failed;
        Err(DaemonError::ShutdownFailed { pid })
    }

    /// Health-check a node whose process is confirmed present.
    async fn health_check_existing(
        &self,
        state: &mut DaemonState,
    ) -> Result<(), DaemonError> {
        match self.api.id().await {
            Ok(_) => {
                state.status = SupervisorStatus::Running;
                Ok(())
            }
            Err(ApiError::UnexpectedStatus { status, .. }) => {
                // Process is there but answering badly: likely still
                // initializing or misconfigured. Operation continues.
                state.status = SupervisorStatus::Running;
                warn!(
                    status = status,
                    "{}",
                    DaemonError::UnhealthyButRunning { status }
                );
                Ok(())
            }
            Err(err) => {
                debug!(error = %err, "Daemon unreachable during health check");
                state.status = SupervisorStatus::Failed;
                Err(DaemonError::FailedToStart {
                    api_url: self.api_url.clone(),
                })
            }
        }
    }

    /// Poll a freshly launched daemon until it answers the identity
    /// request, within the startup timeout.
    async fn wait_until_reachable(&self) -> Result<(), DaemonError> {
        let deadline = tokio::time::Instant::now() + STARTUP_TIMEOUT;

        loop {
            match self.api.id().await {
                Ok(_) => return Ok(()),
                Err(ApiError::UnexpectedStatus { status, .. }) => {
                    warn!(
                        status = status,
                        "{}",
                        DaemonError::UnhealthyButRunning { status }
                    );
                    return Ok(());
                }
                Err(_) if tokio::time::Instant::now() < deadline => {
                    tokio::time::sleep(STARTUP_POLL).await;
                }
                Err(err) => {
                    debug!(error = %err, "Launched daemon never became reachable");
                    return Err(DaemonError::FailedToStart {
                        api_url: self.api_url.clone(),
                    });
                }
            }
        }
    }
}

impl Drop for DaemonSupervisor {
    /// Best-effort safety net only; explicit [`DaemonSupervisor::shutdown`]
    /// is the primary release path.
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_lock() {
            if let Some(mut child) = state.launched.take() {
                warn!(pid = child.id(), "Supervisor dropped with live daemon; killing");
                child.kill().ok();
                child.wait().ok();
            }
        }
    }
}

#[cfg(unix)]
fn request_graceful_termination(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).is_err() {
        // Already gone or unsignalable; the wait loop will sort it out.
        child.kill().ok();
    }
}

#[cfg(not(unix))]
fn request_graceful_termination(child: &mut Child) {
    child.kill().ok();
}

async fn wait_for_exit(child: &mut Child, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return true,
            Err(_) => return true,
            Ok(None) => {
                if tokio::time::Instant::now() >= deadline {
                    return false;
                }
                tokio::time::sleep(TERMINATE_POLL).await;
            }
        }
    }
}
