//! CPU affinity management
//!
//! This module restricts a process to its first N logical cores and reads
//! the current restriction back. Linux goes through `sched_setaffinity`,
//! Windows through `SetProcessAffinityMask`.

use std::fmt;

use super::error::{AffinityError, AffinityResult};
#[cfg(any(target_os = "linux", windows))]
use super::error::{ProcessAccessError, ProcessResult};

/// Number of cores a process is limited to. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoreLimit(u32);

impl CoreLimit {
    /// Creates a limit of `count` cores, or `None` for zero.
    #[must_use]
    pub fn new(count: u32) -> Option<Self> {
        if count == 0 {
            None
        } else {
            Some(Self(count))
        }
    }

    /// The number of cores
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    /// The core indices this limit selects: `0..N`.
    pub fn core_set(self) -> Vec<usize> {
        (0..self.0 as usize).collect()
    }
}

impl fmt::Display for CoreLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns a formatted string describing a core set.
///
/// # Returns
/// A human-readable string like "4/8 cores (Cores: 0, 1, 2, 3)"
pub fn describe_cores(cores: &[usize], total: u32) -> String {
    if cores.len() as u32 >= total {
        format!("{}/{} cores (All cores)", cores.len(), total)
    } else if cores.is_empty() {
        "Unknown".to_string()
    } else {
        let cores_str = cores
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}/{} cores (Cores: {})", cores.len(), total, cores_str)
    }
}

/// Get the total number of logical processors (cores) on the system.
#[must_use]
pub fn logical_core_count() -> u32 {
    imp::logical_core_count()
}

/// Restricts a process to the lowest `limit` logical cores.
///
/// # Arguments
/// * `pid` - Process ID
/// * `limit` - Number of cores to allow, starting at core 0
///
/// # Returns
/// * `Ok(())` - Affinity was set successfully
/// * `Err(AffinityError)` - The limit is too large or the process is not accessible
pub fn apply_limit(pid: u32, limit: CoreLimit) -> AffinityResult<()> {
    let available = logical_core_count();
    if limit.get() > available {
        return Err(AffinityError::InvalidCoreCount {
            requested: limit.get(),
            available,
        });
    }

    imp::apply(pid, &limit.core_set())?;
    Ok(())
}

/// Get the indices of the cores a process may currently run on.
pub fn query_cores(pid: u32) -> AffinityResult<Vec<usize>> {
    Ok(imp::query(pid)?)
}

/// Get the number of cores a process may currently run on.
pub fn query_limit(pid: u32) -> AffinityResult<usize> {
    query_cores(pid).map(|cores| cores.len())
}

/// Affinity operations used by the UI and by hotkey callbacks.
///
/// Implemented by [`SystemAffinity`]; tests substitute a recording fake.
pub trait AffinityControl: Send + Sync {
    /// Logical cores on this machine
    fn core_count(&self) -> u32;

    /// Restrict `pid` to the first `limit` cores
    fn apply_limit(&self, pid: u32, limit: CoreLimit) -> AffinityResult<()>;

    /// Cores `pid` may currently run on
    fn query_cores(&self, pid: u32) -> AffinityResult<Vec<usize>>;

    /// Number of cores `pid` may currently run on
    fn query_limit(&self, pid: u32) -> AffinityResult<usize>;
}

/// The operating system's affinity controls.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAffinity;

impl AffinityControl for SystemAffinity {
    fn core_count(&self) -> u32 {
        logical_core_count()
    }

    fn apply_limit(&self, pid: u32, limit: CoreLimit) -> AffinityResult<()> {
        apply_limit(pid, limit)
    }

    fn query_cores(&self, pid: u32) -> AffinityResult<Vec<usize>> {
        query_cores(pid)
    }

    fn query_limit(&self, pid: u32) -> AffinityResult<usize> {
        query_limit(pid)
    }
}

#[cfg(target_os = "linux")]
mod imp {
    use std::io;
    use std::mem;

    use super::{ProcessAccessError, ProcessResult};

    pub fn logical_core_count() -> u32 {
        // SAFETY: sysconf has no memory-safety preconditions.
        let count = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
        if count < 1 {
            1
        } else {
            count as u32
        }
    }

    fn access_error(pid: u32, api: &'static str, err: io::Error) -> ProcessAccessError {
        match err.raw_os_error() {
            Some(libc::ESRCH) => ProcessAccessError::NotFound { pid },
            Some(libc::EPERM) | Some(libc::EACCES) => ProcessAccessError::PermissionDenied { pid },
            code => ProcessAccessError::Os {
                pid,
                api,
                code: code.unwrap_or(-1),
            },
        }
    }

    fn set_task_affinity(tid: libc::pid_t, cores: &[usize]) -> io::Result<()> {
        // SAFETY: cpu_set_t is plain data, zeroed is a valid empty set, and
        // the size passed matches the struct handed to the kernel.
        let result = unsafe {
            let mut set: libc::cpu_set_t = mem::zeroed();
            libc::CPU_ZERO(&mut set);
            for &core in cores {
                libc::CPU_SET(core, &mut set);
            }
            libc::sched_setaffinity(tid, mem::size_of::<libc::cpu_set_t>(), &set)
        };

        if result != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn apply(pid: u32, cores: &[usize]) -> ProcessResult<()> {
        set_task_affinity(pid as libc::pid_t, cores)
            .map_err(|e| access_error(pid, "sched_setaffinity", e))?;

        // sched_setaffinity only moves the thread whose tid equals pid;
        // move the threads that already exist too.
        let tasks = procfs::process::Process::new(pid as i32).and_then(|p| p.tasks());
        if let Ok(tasks) = tasks {
            for task in tasks.flatten() {
                if task.tid as u32 == pid {
                    continue;
                }
                if let Err(err) = set_task_affinity(task.tid, cores) {
                    tracing::debug!(pid, tid = task.tid, %err, "could not move thread");
                }
            }
        }

        Ok(())
    }

    pub fn query(pid: u32) -> ProcessResult<Vec<usize>> {
        // SAFETY: as above, the kernel fills a correctly sized cpu_set_t.
        unsafe {
            let mut set: libc::cpu_set_t = mem::zeroed();
            let result = libc::sched_getaffinity(
                pid as libc::pid_t,
                mem::size_of::<libc::cpu_set_t>(),
                &mut set,
            );
            if result != 0 {
                return Err(access_error(
                    pid,
                    "sched_getaffinity",
                    io::Error::last_os_error(),
                ));
            }

            let mut cores = Vec::new();
            for core in 0..libc::CPU_SETSIZE as usize {
                if libc::CPU_ISSET(core, &set) {
                    cores.push(core);
                }
            }
            Ok(cores)
        }
    }
}

#[cfg(windows)]
mod imp {
    use windows::Win32::Foundation::{E_ACCESSDENIED, ERROR_INVALID_PARAMETER};
    use windows::Win32::System::SystemInformation::GetSystemInfo;
    use windows::Win32::System::Threading::{
        GetProcessAffinityMask, SetProcessAffinityMask, PROCESS_QUERY_LIMITED_INFORMATION,
        PROCESS_SET_INFORMATION,
    };

    use super::{ProcessAccessError, ProcessResult};
    use crate::ffi::ProcessHandle;

    pub fn logical_core_count() -> u32 {
        // SAFETY: GetSystemInfo only writes into the struct we pass.
        unsafe {
            let mut sys_info = std::mem::zeroed();
            GetSystemInfo(&mut sys_info);
            sys_info.dwNumberOfProcessors
        }
    }

    fn access_error(pid: u32, api: &'static str, err: windows::core::Error) -> ProcessAccessError {
        let code = err.code();
        if code == E_ACCESSDENIED {
            ProcessAccessError::PermissionDenied { pid }
        } else if code == ERROR_INVALID_PARAMETER.to_hresult() {
            // OpenProcess reports an unknown PID as an invalid parameter
            ProcessAccessError::NotFound { pid }
        } else {
            ProcessAccessError::Os {
                pid,
                api,
                code: code.0,
            }
        }
    }

    pub fn apply(pid: u32, cores: &[usize]) -> ProcessResult<()> {
        let mask = cores.iter().fold(0usize, |mask, &core| mask | (1 << core));

        let handle = ProcessHandle::open(
            pid,
            PROCESS_SET_INFORMATION | PROCESS_QUERY_LIMITED_INFORMATION,
        )
        .map_err(|e| access_error(pid, "OpenProcess", e))?;

        // SAFETY: the handle is valid for the lifetime of `handle`.
        unsafe { SetProcessAffinityMask(handle.as_raw(), mask) }
            .map_err(|e| access_error(pid, "SetProcessAffinityMask", e))
    }

    pub fn query(pid: u32) -> ProcessResult<Vec<usize>> {
        let handle = ProcessHandle::open(pid, PROCESS_QUERY_LIMITED_INFORMATION)
            .map_err(|e| access_error(pid, "OpenProcess", e))?;

        let mut process_mask: usize = 0;
        let mut system_mask: usize = 0;

        // SAFETY: valid handle and pointers to live locals.
        unsafe { GetProcessAffinityMask(handle.as_raw(), &mut process_mask, &mut system_mask) }
            .map_err(|e| access_error(pid, "GetProcessAffinityMask", e))?;

        Ok((0..usize::BITS as usize)
            .filter(|i| (process_mask >> i) & 1 == 1)
            .collect())
    }
}

#[cfg(not(any(target_os = "linux", windows)))]
mod imp {
    use super::{AffinityError, AffinityResult};

    pub fn logical_core_count() -> u32 {
        std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1)
    }

    pub fn apply(_pid: u32, _cores: &[usize]) -> AffinityResult<()> {
        Err(AffinityError::Unsupported)
    }

    pub fn query(_pid: u32) -> AffinityResult<Vec<usize>> {
        Err(AffinityError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_limit_rejects_zero() {
        assert!(CoreLimit::new(0).is_none());
        assert_eq!(CoreLimit::new(3).map(CoreLimit::get), Some(3));
    }

    #[test]
    fn test_core_set_is_lowest_indices() {
        let limit = CoreLimit::new(4).unwrap();
        assert_eq!(limit.core_set(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_describe_cores() {
        assert_eq!(describe_cores(&[0, 1], 8), "2/8 cores (Cores: 0, 1)");
        assert_eq!(describe_cores(&[0, 1, 2, 3], 4), "4/4 cores (All cores)");
        assert_eq!(describe_cores(&[], 4), "Unknown");
    }

    #[test]
    fn test_logical_core_count() {
        assert!(logical_core_count() >= 1);
    }

    #[test]
    fn test_limit_above_core_count_is_rejected() {
        let too_many = CoreLimit::new(logical_core_count() + 1).unwrap();
        let err = apply_limit(std::process::id(), too_many).unwrap_err();
        assert!(matches!(err, AffinityError::InvalidCoreCount { .. }));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_apply_then_query_returns_lowest_cores() {
        use std::process::Command;

        let mut child = Command::new("sleep")
            .arg("5")
            .spawn()
            .expect("Should spawn a child process");
        let pid = child.id();

        // Only counts whose lowest cores are all available to this process
        // can be applied; a cpuset may withhold some of them.
        let allowed = query_cores(pid).expect("Should read child affinity");
        let usable = allowed
            .iter()
            .enumerate()
            .take_while(|(i, core)| *i == **core)
            .count() as u32;

        for n in [2, 1] {
            if n > usable {
                continue;
            }
            let limit = CoreLimit::new(n).unwrap();
            apply_limit(pid, limit).expect("Should limit own child");
            assert_eq!(query_cores(pid).unwrap(), limit.core_set());
            assert_eq!(query_limit(pid).unwrap(), n as usize);
        }

        let _ = child.kill();
        let _ = child.wait();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_query_missing_process() {
        // PIDs are capped well below i32::MAX by pid_max
        let err = query_limit(i32::MAX as u32).unwrap_err();
        assert_eq!(
            err,
            AffinityError::Access(ProcessAccessError::NotFound { pid: i32::MAX as u32 })
        );
    }
}
