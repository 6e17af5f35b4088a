// Host process-table probing
//
// Checks whether a daemon with the given binary name is already running,
// so the supervisor never spawns a duplicate next to an existing node.

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

/// Checks whether a named process is currently running on the host.
pub trait ProcessProbe: Send + Sync {
    fn is_process_running(&self, name: &str) -> bool;
}

/// Process probe backed by OS process enumeration.
#[derive(Debug, Default)]
pub struct SysinfoProbe;

impl ProcessProbe for SysinfoProbe {
    fn is_process_running(&self, name: &str) -> bool {
        let mut system = System::new();
        system.refresh_processes_specifics(ProcessesToUpdate::All, true, ProcessRefreshKind::new());

        system.processes().values().any(|process| {
            let process_name = process.name().to_string_lossy();
            process_name == name || process_name.strip_suffix(".exe") == Some(name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonexistent_process_not_found() {
        let probe = SysinfoProbe;
        assert!(!probe.is_process_running("definitely-not-a-real-process-name-xyz"));
    }
}
