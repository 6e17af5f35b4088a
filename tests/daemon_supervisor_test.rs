// Integration tests for daemon supervision
//
// The probe and spawner seams are replaced with counting fakes; the
// health-check endpoint is a mock HTTP server. No real IPFS node is
// needed.

use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ipfs_stac::api::NodeApi;
use ipfs_stac::config::ClientConfig;
use ipfs_stac::daemon::{DaemonSpawner, DaemonSupervisor, ProcessProbe, SupervisorStatus};
use ipfs_stac::errors::DaemonError;

struct FixedProbe {
    running: bool,
}

impl ProcessProbe for FixedProbe {
    fn is_process_running(&self, _name: &str) -> bool {
        self.running
    }
}

/// Spawner that launches a harmless long-lived process and counts how
/// often it was asked to.
struct CountingSpawner {
    launches: Arc<AtomicUsize>,
}

impl CountingSpawner {
    fn new() -> (Self, Arc<AtomicUsize>) {
        let launches = Arc::new(AtomicUsize::new(0));
        (
            Self {
                launches: Arc::clone(&launches),
            },
            launches,
        )
    }
}

impl DaemonSpawner for CountingSpawner {
    fn spawn(&self, _binary: &str) -> Result<Child, DaemonError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Command::new("sleep")
            .arg("60")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| DaemonError::SpawnFailed {
                binary: "sleep".to_string(),
                source,
            })
    }
}

fn test_config() -> ClientConfig {
    ClientConfig::builder()
        .request_timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}

fn supervisor_against(
    api_base: &str,
    probe_running: bool,
) -> (DaemonSupervisor, Arc<AtomicUsize>) {
    let config = test_config();
    let api = Arc::new(NodeApi::with_base_url(api_base, Duration::from_secs(2)).unwrap());
    let (spawner, launches) = CountingSpawner::new();
    let supervisor = DaemonSupervisor::with_parts(
        &config,
        api,
        Box::new(FixedProbe {
            running: probe_running,
        }),
        Box::new(spawner),
    );
    (supervisor, launches)
}

#[tokio::test]
async fn test_ensure_running_launches_once_across_two_calls() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/id")
        .with_status(200)
        .with_body(r#"{"ID":"12D3KooTest"}"#)
        .expect_at_least(2)
        .create_async()
        .await;

    let (supervisor, launches) = supervisor_against(&server.url(), false);

    supervisor.ensure_running().await.unwrap();
    supervisor.ensure_running().await.unwrap();

    // Second call found the launched child alive and only re-ran the
    // health check.
    assert_eq!(launches.load(Ordering::SeqCst), 1);
    assert_eq!(supervisor.status().await, SupervisorStatus::Running);

    supervisor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_ensure_running_skips_launch_when_process_exists() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/id")
        .with_status(200)
        .with_body(r#"{"ID":"12D3KooTest"}"#)
        .create_async()
        .await;

    let (supervisor, launches) = supervisor_against(&server.url(), true);

    supervisor.ensure_running().await.unwrap();
    assert_eq!(launches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unhealthy_but_running_daemon_is_not_fatal() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/id")
        .with_status(503)
        .with_body("starting up")
        .create_async()
        .await;

    let (supervisor, launches) = supervisor_against(&server.url(), true);

    // Non-success health response from a confirmed process: warn and
    // continue.
    supervisor.ensure_running().await.unwrap();
    assert_eq!(launches.load(Ordering::SeqCst), 0);
    assert_eq!(supervisor.status().await, SupervisorStatus::Running);
}

#[tokio::test]
async fn test_unreachable_node_after_launch_is_fatal() {
    // Nothing listens on port 9; the launched child never becomes a
    // reachable node.
    let (supervisor, launches) = supervisor_against("http://127.0.0.1:9", false);

    let err = supervisor.ensure_running().await.unwrap_err();
    assert!(matches!(err, DaemonError::FailedToStart { .. }));
    assert_eq!(launches.load(Ordering::SeqCst), 1);
    assert_eq!(supervisor.status().await, SupervisorStatus::Failed);

    // The failed launch was cleaned up: nothing left to shut down.
    supervisor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_without_launch_is_noop() {
    let (supervisor, launches) = supervisor_against("http://127.0.0.1:9", false);

    supervisor.shutdown().await.unwrap();
    assert_eq!(launches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_shutdown_clears_handle_after_launch() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/id")
        .with_status(200)
        .with_body(r#"{"ID":"12D3KooTest"}"#)
        .create_async()
        .await;

    let (supervisor, launches) = supervisor_against(&server.url(), false);

    supervisor.ensure_running().await.unwrap();
    assert_eq!(launches.load(Ordering::SeqCst), 1);

    supervisor.shutdown().await.unwrap();
    assert_eq!(supervisor.status().await, SupervisorStatus::Stopped);

    // Handle is gone; a second shutdown is a no-op.
    supervisor.shutdown().await.unwrap();
}
