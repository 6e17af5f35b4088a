// Daemon supervision
//
// Detects, launches, health-checks, and shuts down the local storage-node
// process so retrieval and upload operations have a node to talk to.

mod probe;
mod supervisor;

pub use probe::{ProcessProbe, SysinfoProbe};
pub use supervisor::{CommandSpawner, DaemonSpawner, DaemonSupervisor, SupervisorStatus};
