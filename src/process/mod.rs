//! Process guard
//!
//! Forcibly terminates every running instance of the named processes and
//! blocks until each one has exited, before live data is touched.
//! Termination is best effort: a process that is not running is skipped, and
//! one that cannot be killed or does not exit in time is logged and recorded,
//! never turned into an error.

#[cfg(unix)]
mod posix;
#[cfg(windows)]
mod win32;

#[cfg(unix)]
use posix as platform;
#[cfg(windows)]
use win32 as platform;

use std::time::Duration;

use tracing::{debug, warn};

/// Upper bound on how long one killed process may take to exit
const DEFAULT_EXIT_TIMEOUT: Duration = Duration::from_secs(10);

/// A process found in the system process table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningProcess {
    pub pid: u32,
    /// Executable name as the OS reports it
    pub name: String,
}

/// What one termination request did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminationReport {
    /// Names whose running instances were all killed and have exited
    pub terminated: Vec<String>,
    /// Names that could not be terminated, with the reason
    pub failed: Vec<(String, String)>,
}

impl TerminationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Something that can stop applications holding live data open
pub trait ProcessGuard {
    /// Terminate all instances of each name; never fails
    fn terminate_all(&self, names: &[String]) -> TerminationReport;
}

/// Guard backed by the OS process table
///
/// Processes are enumerated, killed (`SIGKILL` / `TerminateProcess`) and
/// waited on until they have exited. Our own process is never touched.
#[derive(Debug, Clone)]
pub struct SystemProcessGuard {
    exit_timeout: Duration,
}

impl SystemProcessGuard {
    pub fn new() -> Self {
        Self {
            exit_timeout: DEFAULT_EXIT_TIMEOUT,
        }
    }

    /// Override how long to wait for each killed process to exit
    pub fn with_exit_timeout(mut self, exit_timeout: Duration) -> Self {
        self.exit_timeout = exit_timeout;
        self
    }

    /// Kill every instance of `name` in `running` and wait for each to exit
    fn terminate(&self, name: &str, running: &[RunningProcess]) -> Option<Result<(), String>> {
        let self_pid = std::process::id();
        let pids: Vec<u32> = running
            .iter()
            .filter(|p| p.pid != self_pid && platform::matches_name(&p.name, name))
            .map(|p| p.pid)
            .collect();

        if pids.is_empty() {
            return None;
        }

        let mut outcome = Ok(());
        for pid in pids {
            if let Err(reason) = platform::kill_and_wait(pid, self.exit_timeout) {
                debug!(process = name, pid, reason = %reason, "instance survived");
                outcome = Err(reason);
            }
        }
        Some(outcome)
    }
}

impl Default for SystemProcessGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessGuard for SystemProcessGuard {
    fn terminate_all(&self, names: &[String]) -> TerminationReport {
        let mut report = TerminationReport::default();

        let wanted: Vec<&str> = names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .collect();
        if wanted.is_empty() {
            return report;
        }

        let running = match platform::list_processes() {
            Ok(running) => running,
            Err(reason) => {
                warn!(reason = %reason, "could not read the process table");
                report.failed = wanted
                    .iter()
                    .map(|name| (name.to_string(), reason.clone()))
                    .collect();
                return report;
            }
        };

        for name in wanted {
            match self.terminate(name, &running) {
                None => debug!(process = name, "not running"),
                Some(Ok(())) => {
                    debug!(process = name, "terminated");
                    report.terminated.push(name.to_string());
                }
                Some(Err(reason)) => {
                    warn!(process = name, reason = %reason, "failed to terminate");
                    report.failed.push((name.to_string(), reason));
                }
            }
        }

        report
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_process_is_not_an_error() {
        let guard = SystemProcessGuard::new();
        let names = vec!["no-such-process-userdata-backup".to_string()];

        let report = guard.terminate_all(&names);

        assert!(report.terminated.is_empty());
    }

    #[test]
    fn test_blank_names_are_ignored() {
        let guard = SystemProcessGuard::new();
        let report = guard.terminate_all(&["  ".to_string(), String::new()]);
        assert_eq!(report, TerminationReport::default());
    }

    #[test]
    fn test_own_process_is_never_terminated() {
        let guard = SystemProcessGuard::new();
        let running = vec![RunningProcess {
            pid: std::process::id(),
            name: "userdata-backup".into(),
        }];

        assert_eq!(guard.terminate("userdata-backup", &running), None);
    }

    #[test]
    fn test_report_is_clean_without_failures() {
        let report = TerminationReport {
            terminated: vec!["chrome".into()],
            failed: Vec::new(),
        };
        assert!(report.is_clean());

        let report = TerminationReport {
            terminated: Vec::new(),
            failed: vec![("msedge".into(), "access denied".into())],
        };
        assert!(!report.is_clean());
    }
}
