//! Safe RAII wrappers for Windows HANDLEs
//!
//! Each wrapper closes its handle when dropped.

use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::Security::TOKEN_QUERY;
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, TH32CS_SNAPPROCESS,
};
use windows::Win32::System::Threading::{
    GetCurrentProcess, OpenProcess, OpenProcessToken, PROCESS_ACCESS_RIGHTS,
};

/// A process HANDLE opened with specific access rights.
pub struct ProcessHandle(HANDLE);

impl ProcessHandle {
    /// Opens a process by PID with the specified access rights.
    ///
    /// # Returns
    /// * `Err` - The process cannot be opened (access denied, process exited, etc.)
    pub fn open(pid: u32, access: PROCESS_ACCESS_RIGHTS) -> windows::core::Result<Self> {
        // SAFETY: OpenProcess has no preconditions; failure is returned as Err.
        let handle = unsafe { OpenProcess(access, false, pid)? };
        Ok(Self(handle))
    }

    /// The raw HANDLE; must not outlive `self`.
    pub fn as_raw(&self) -> HANDLE {
        self.0
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        // SAFETY: we own this handle and close it exactly once.
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

/// A ToolHelp32 process snapshot.
pub struct SnapshotHandle(HANDLE);

impl SnapshotHandle {
    /// Snapshots all processes in the system.
    pub fn create_process_snapshot() -> windows::core::Result<Self> {
        // SAFETY: the second parameter is ignored for process snapshots.
        let handle = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)? };
        Ok(Self(handle))
    }

    pub fn as_raw(&self) -> HANDLE {
        self.0
    }
}

impl Drop for SnapshotHandle {
    fn drop(&mut self) {
        // SAFETY: we own this handle.
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

/// The access token of the current process, opened for querying.
pub struct TokenHandle(HANDLE);

impl TokenHandle {
    pub fn current_process() -> windows::core::Result<Self> {
        let mut handle = HANDLE::default();
        // SAFETY: GetCurrentProcess returns a pseudo-handle that needs no
        // closing; the out pointer refers to a live local.
        unsafe { OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut handle)? };
        Ok(Self(handle))
    }

    pub fn as_raw(&self) -> HANDLE {
        self.0
    }
}

impl Drop for TokenHandle {
    fn drop(&mut self) {
        // SAFETY: we own this handle.
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

/// Converts a null-terminated wide string buffer to a String.
pub fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..len])
}
