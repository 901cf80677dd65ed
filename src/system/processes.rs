//! Process enumeration
//!
//! Lists running processes with the executable file each one was started
//! from. Bindings are keyed by that path, so processes whose executable
//! cannot be read (kernel threads, other users' processes without root)
//! are left out.

use super::error::{ProcessAccessError, ProcessResult};

/// Information about a single process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    /// Process ID
    pub pid: u32,
    /// Short display name (e.g. "firefox")
    pub name: String,
    /// Full path of the executable, empty if it could not be read
    pub executable: String,
}

impl ProcessInfo {
    /// True if the executable path is known
    pub fn has_executable(&self) -> bool {
        !self.executable.is_empty()
    }
}

/// Sorts by display name, case-insensitively. Ties keep their order.
pub fn sort_by_name(processes: &mut [ProcessInfo]) {
    processes.sort_by_cached_key(|p| p.name.to_lowercase());
}

/// Enumerates all running processes, sorted by name.
///
/// Processes that exit while the list is being built are skipped.
pub fn list_processes() -> Vec<ProcessInfo> {
    let mut processes: Vec<ProcessInfo> = imp::enumerate()
        .into_iter()
        .filter(ProcessInfo::has_executable)
        .collect();
    sort_by_name(&mut processes);
    tracing::debug!(count = processes.len(), "process list refreshed");
    processes
}

/// Looks up a single process.
///
/// # Errors
/// * `ProcessAccessError::NotFound` - No process has this PID
pub fn find_process(pid: u32) -> ProcessResult<ProcessInfo> {
    imp::lookup(pid)
}

#[cfg(target_os = "linux")]
mod imp {
    use procfs::process::{all_processes, Process};
    use procfs::ProcError;

    use super::{ProcessAccessError, ProcessInfo, ProcessResult};

    fn describe(process: &Process) -> Result<ProcessInfo, ProcError> {
        let stat = process.stat()?;
        let executable = process
            .exe()
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(ProcessInfo {
            pid: stat.pid as u32,
            name: stat.comm,
            executable,
        })
    }

    pub fn enumerate() -> Vec<ProcessInfo> {
        let processes = match all_processes() {
            Ok(processes) => processes,
            Err(err) => {
                tracing::warn!(%err, "cannot read /proc");
                return Vec::new();
            }
        };

        processes
            .flatten()
            .filter_map(|process| describe(&process).ok())
            .collect()
    }

    pub fn lookup(pid: u32) -> ProcessResult<ProcessInfo> {
        let not_found = ProcessAccessError::NotFound { pid };
        let process = Process::new(pid as i32).map_err(|_| not_found.clone())?;

        describe(&process).map_err(|err| match err {
            ProcError::PermissionDenied(_) => ProcessAccessError::PermissionDenied { pid },
            _ => not_found,
        })
    }
}

#[cfg(windows)]
mod imp {
    use std::mem;

    use windows::core::PWSTR;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        Process32FirstW, Process32NextW, PROCESSENTRY32W,
    };
    use windows::Win32::System::Threading::{
        QueryFullProcessImageNameW, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
    };

    use super::{ProcessAccessError, ProcessInfo, ProcessResult};
    use crate::ffi::{wide_to_string, ProcessHandle, SnapshotHandle};

    /// Full image path, or empty if the process cannot be opened.
    fn executable_path(pid: u32) -> String {
        let Ok(handle) = ProcessHandle::open(pid, PROCESS_QUERY_LIMITED_INFORMATION) else {
            return String::new();
        };

        let mut buffer = [0u16; 1024];
        let mut len = buffer.len() as u32;
        // SAFETY: the buffer outlives the call and `len` holds its capacity.
        let result = unsafe {
            QueryFullProcessImageNameW(
                handle.as_raw(),
                PROCESS_NAME_WIN32,
                PWSTR(buffer.as_mut_ptr()),
                &mut len,
            )
        };

        match result {
            Ok(()) => String::from_utf16_lossy(&buffer[..len as usize]),
            Err(_) => String::new(),
        }
    }

    pub fn enumerate() -> Vec<ProcessInfo> {
        let snapshot = match SnapshotHandle::create_process_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(%err, "cannot snapshot processes");
                return Vec::new();
            }
        };

        let mut processes = Vec::new();
        // dwSize must be set before the first call
        let mut entry = PROCESSENTRY32W {
            dwSize: mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        // SAFETY: valid snapshot handle and an initialized entry.
        let mut success = unsafe { Process32FirstW(snapshot.as_raw(), &mut entry) };
        while success.is_ok() {
            let pid = entry.th32ProcessID;
            // PID 0 is the idle pseudo-process
            if pid != 0 {
                processes.push(ProcessInfo {
                    pid,
                    name: wide_to_string(&entry.szExeFile),
                    executable: executable_path(pid),
                });
            }
            // SAFETY: same as above.
            success = unsafe { Process32NextW(snapshot.as_raw(), &mut entry) };
        }

        processes
    }

    pub fn lookup(pid: u32) -> ProcessResult<ProcessInfo> {
        enumerate()
            .into_iter()
            .find(|p| p.pid == pid)
            .ok_or(ProcessAccessError::NotFound { pid })
    }
}

#[cfg(not(any(target_os = "linux", windows)))]
mod imp {
    use super::{ProcessAccessError, ProcessInfo, ProcessResult};

    pub fn enumerate() -> Vec<ProcessInfo> {
        Vec::new()
    }

    pub fn lookup(pid: u32) -> ProcessResult<ProcessInfo> {
        Err(ProcessAccessError::NotFound { pid })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(pid: u32, name: &str) -> ProcessInfo {
        ProcessInfo {
            pid,
            name: name.to_string(),
            executable: String::new(),
        }
    }

    #[test]
    fn test_sort_ignores_case_and_is_stable() {
        let mut processes = vec![
            info(3, "zsh"),
            info(1, "Bash"),
            info(4, "bash"),
            info(2, "apache"),
        ];
        sort_by_name(&mut processes);
        let pids: Vec<u32> = processes.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![2, 1, 4, 3]);
    }

    #[cfg(any(target_os = "linux", windows))]
    #[test]
    fn test_list_contains_own_process() {
        let processes = list_processes();
        let me = processes
            .iter()
            .find(|p| p.pid == std::process::id())
            .expect("Should find our own process");
        assert!(me.has_executable());
    }

    #[cfg(any(target_os = "linux", windows))]
    #[test]
    fn test_find_process() {
        let me = find_process(std::process::id()).unwrap();
        let exe = std::env::current_exe().unwrap();
        let exe_name = exe.file_name().unwrap().to_string_lossy();
        assert!(me.executable.ends_with(exe_name.as_ref()));

        let err = find_process(i32::MAX as u32).unwrap_err();
        assert_eq!(err, ProcessAccessError::NotFound { pid: i32::MAX as u32 });
    }
}
