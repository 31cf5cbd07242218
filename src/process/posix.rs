//! Process table access through `/proc` and signals through libc

use std::fs;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

use super::RunningProcess;

/// Kernel limit on the `comm` name, without the trailing NUL
const COMM_LEN: usize = 15;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// List every live process by pid and `comm` name
pub(super) fn list_processes() -> Result<Vec<RunningProcess>, String> {
    let entries = fs::read_dir("/proc").map_err(|e| format!("failed to read /proc: {}", e))?;

    let mut processes = Vec::new();
    for entry in entries.flatten() {
        let Some(pid) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<u32>().ok())
        else {
            continue;
        };
        // The process may have exited since the directory was listed
        let Ok(comm) = fs::read_to_string(entry.path().join("comm")) else {
            continue;
        };
        if !is_running(pid) {
            continue;
        }
        processes.push(RunningProcess {
            pid,
            name: comm.trim_end_matches('\n').to_string(),
        });
    }
    Ok(processes)
}

/// `comm` holds at most the first 15 bytes of the executable name
pub(super) fn matches_name(comm: &str, wanted: &str) -> bool {
    let wanted = wanted.as_bytes();
    let wanted = &wanted[..wanted.len().min(COMM_LEN)];
    comm.as_bytes() == wanted
}

/// Send `SIGKILL` and block until the process is gone or a zombie
pub(super) fn kill_and_wait(pid: u32, timeout: Duration) -> Result<(), String> {
    let raw = libc::pid_t::try_from(pid).map_err(|_| format!("pid {} out of range", pid))?;

    if unsafe { libc::kill(raw, libc::SIGKILL) } != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            return Ok(());
        }
        return Err(format!("kill({}) failed: {}", pid, err));
    }

    let deadline = Instant::now() + timeout;
    while is_running(pid) {
        if Instant::now() >= deadline {
            return Err(format!("pid {} did not exit within {:?}", pid, timeout));
        }
        thread::sleep(POLL_INTERVAL);
    }
    Ok(())
}

/// A zombie has released its files even though its parent has not reaped it
fn is_running(pid: u32) -> bool {
    match fs::read_to_string(format!("/proc/{}/stat", pid)) {
        Ok(stat) => !matches!(process_state(&stat), Some('Z') | Some('X')),
        Err(_) => false,
    }
}

/// State letter following the parenthesised command in `/proc/<pid>/stat`
fn process_state(stat: &str) -> Option<char> {
    let after_comm = stat.rfind(')')?;
    stat[after_comm + 1..].trim_start().chars().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_truncated_comm() {
        assert!(matches_name("chrome", "chrome"));
        assert!(!matches_name("chrome", "chromium"));
        assert!(matches_name("Microsoft.Notes", "Microsoft.Notes.App"));
        assert!(!matches_name("msedge", "MSEDGE"));
    }

    #[test]
    fn test_process_state_skips_odd_command_names() {
        assert_eq!(process_state("42 (a) b) S 1 42"), Some('S'));
        assert_eq!(process_state("7 (sleep) Z 1 7"), Some('Z'));
        assert_eq!(process_state("garbage"), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_lists_own_process() {
        let processes = list_processes().unwrap();
        assert!(processes.iter().any(|p| p.pid == std::process::id()));
    }
}
