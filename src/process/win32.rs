//! Process table access through the Win32 ToolHelp and Threading APIs

use std::mem;
use std::time::Duration;

use windows::Win32::Foundation::{CloseHandle, WAIT_OBJECT_0};
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W, TH32CS_SNAPPROCESS,
};
use windows::Win32::System::Threading::{
    OpenProcess, TerminateProcess, WaitForSingleObject, PROCESS_SYNCHRONIZE, PROCESS_TERMINATE,
};

use super::RunningProcess;

/// List every process by pid and image name
pub(super) fn list_processes() -> Result<Vec<RunningProcess>, String> {
    let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
        .map_err(|e| format!("CreateToolhelp32Snapshot failed: {}", e))?;

    let mut entry = PROCESSENTRY32W {
        dwSize: mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    let mut processes = Vec::new();
    let mut has_entry = unsafe { Process32FirstW(snapshot, &mut entry) }.is_ok();
    while has_entry {
        let len = entry
            .szExeFile
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(entry.szExeFile.len());
        processes.push(RunningProcess {
            pid: entry.th32ProcessID,
            name: String::from_utf16_lossy(&entry.szExeFile[..len]),
        });
        has_entry = unsafe { Process32NextW(snapshot, &mut entry) }.is_ok();
    }
    unsafe {
        let _ = CloseHandle(snapshot);
    }

    Ok(processes)
}

/// Image names carry the extension and compare case-insensitively
pub(super) fn matches_name(image: &str, wanted: &str) -> bool {
    image.eq_ignore_ascii_case(&image_name(wanted))
}

fn image_name(name: &str) -> String {
    if name.to_ascii_lowercase().ends_with(".exe") {
        name.to_string()
    } else {
        format!("{}.exe", name)
    }
}

/// `TerminateProcess` then block on the process handle until it signals
pub(super) fn kill_and_wait(pid: u32, timeout: Duration) -> Result<(), String> {
    let handle = unsafe { OpenProcess(PROCESS_TERMINATE | PROCESS_SYNCHRONIZE, false, pid) }
        .map_err(|e| format!("OpenProcess({}) failed: {}", pid, e))?;

    let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
    let outcome = match unsafe { TerminateProcess(handle, 1) } {
        Ok(()) => {
            if unsafe { WaitForSingleObject(handle, millis) } == WAIT_OBJECT_0 {
                Ok(())
            } else {
                Err(format!("pid {} did not exit within {:?}", pid, timeout))
            }
        }
        Err(e) => Err(format!("TerminateProcess({}) failed: {}", pid, e)),
    };

    unsafe {
        let _ = CloseHandle(handle);
    }
    outcome
}
