#![cfg(target_os = "linux")]

use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use userdata_backup::process::{ProcessGuard, SystemProcessGuard};

fn sleep_binary() -> Option<&'static Path> {
    ["/bin/sleep", "/usr/bin/sleep"]
        .into_iter()
        .map(Path::new)
        .find(|p| p.is_file())
}

fn comm_of(pid: u32) -> Option<String> {
    fs::read_to_string(format!("/proc/{}/comm", pid))
        .ok()
        .map(|comm| comm.trim_end().to_string())
}

#[test]
fn test_terminate_all_waits_for_sigterm_ignoring_process() {
    let Some(sleep) = sleep_binary() else {
        return;
    };

    // A uniquely named copy so no unrelated process matches
    let temp_dir = TempDir::new_in(env!("CARGO_TARGET_TMPDIR")).unwrap();
    let name = format!("udbg{}", std::process::id());
    let exe = temp_dir.path().join(&name);
    fs::copy(sleep, &exe).unwrap();

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(format!("trap '' TERM; exec '{}' 30", exe.display()))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while comm_of(child.id()).as_deref() != Some(name.as_str()) {
        assert!(Instant::now() < deadline, "child did not start");
        thread::sleep(Duration::from_millis(10));
    }

    // SIGTERM alone does not stop it
    let pid = libc::pid_t::try_from(child.id()).unwrap();
    assert_eq!(unsafe { libc::kill(pid, libc::SIGTERM) }, 0);
    thread::sleep(Duration::from_millis(100));
    assert!(child.try_wait().unwrap().is_none());

    let report = SystemProcessGuard::new().terminate_all(&[name.clone()]);

    assert_eq!(report.terminated, vec![name]);
    assert!(report.is_clean());
    // Already exited; only the zombie is left to reap
    assert!(child.try_wait().unwrap().is_some());
}
