//! Custom error types for type-safe error handling
//!
//! This module provides structured error types instead of raw strings,
//! enabling better error handling, matching, and user messages.

use std::fmt;
use std::io;

use crate::hotkeys::KeyCombination;

// ============================================================================
// Process Access Error
// ============================================================================

/// Errors raised when a process cannot be read or modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessAccessError {
    /// Process does not exist or has already terminated
    NotFound {
        /// The process that was looked up
        pid: u32,
    },

    /// Access denied - typically requires elevation
    PermissionDenied {
        /// The process that was looked up
        pid: u32,
    },

    /// An OS call failed with an error code
    Os {
        /// The process that was looked up
        pid: u32,
        /// Name of the failing API function
        api: &'static str,
        /// OS error code (errno or Win32 error)
        code: i32,
    },
}

impl fmt::Display for ProcessAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessAccessError::NotFound { pid } => {
                write!(f, "Process {} not found or has terminated", pid)
            }
            ProcessAccessError::PermissionDenied { pid } => {
                write!(f, "Access to process {} denied - try running as root", pid)
            }
            ProcessAccessError::Os { pid, api, code } => {
                write!(f, "{} failed for process {} (error code: {})", api, pid, code)
            }
        }
    }
}

impl std::error::Error for ProcessAccessError {}

// ============================================================================
// Affinity Error
// ============================================================================

/// Errors specific to CPU affinity operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffinityError {
    /// The process could not be read or modified
    Access(ProcessAccessError),

    /// Requested more cores than the machine has
    InvalidCoreCount {
        /// Cores requested
        requested: u32,
        /// Logical cores on this machine
        available: u32,
    },

    /// No affinity backend for this platform
    #[cfg_attr(any(target_os = "linux", windows), allow(dead_code))]
    Unsupported,
}

impl fmt::Display for AffinityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AffinityError::Access(err) => write!(f, "{}", err),
            AffinityError::InvalidCoreCount {
                requested,
                available,
            } => {
                write!(
                    f,
                    "Cannot limit to {} cores, this machine has {}",
                    requested, available
                )
            }
            AffinityError::Unsupported => {
                write!(f, "CPU affinity is not supported on this platform")
            }
        }
    }
}

impl std::error::Error for AffinityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AffinityError::Access(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProcessAccessError> for AffinityError {
    fn from(err: ProcessAccessError) -> Self {
        AffinityError::Access(err)
    }
}

// ============================================================================
// Persist Format Error
// ============================================================================

/// The bindings file exists but cannot be understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistFormatError {
    /// Not valid JSON, or not the expected shape
    Malformed {
        /// Parser message
        message: String,
        /// 1-based line of the problem
        line: usize,
        /// 1-based column of the problem
        column: usize,
    },

    /// Written by a newer (or unknown) version of the program
    UnsupportedVersion {
        /// Version tag found in the file
        found: u32,
    },

    /// A binding entry has an invalid value
    InvalidEntry {
        /// Executable the entry belongs to
        executable: String,
        /// What was wrong
        reason: String,
    },
}

impl fmt::Display for PersistFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistFormatError::Malformed {
                message,
                line,
                column,
            } => {
                write!(f, "Malformed bindings file at {}:{}: {}", line, column, message)
            }
            PersistFormatError::UnsupportedVersion { found } => {
                write!(f, "Unsupported bindings file version {}", found)
            }
            PersistFormatError::InvalidEntry { executable, reason } => {
                write!(f, "Invalid binding for {}: {}", executable, reason)
            }
        }
    }
}

impl std::error::Error for PersistFormatError {}

impl From<serde_json::Error> for PersistFormatError {
    fn from(err: serde_json::Error) -> Self {
        PersistFormatError::Malformed {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

// ============================================================================
// Store Error
// ============================================================================

/// Errors from reading or writing the bindings file.
#[derive(Debug)]
pub enum StoreError {
    /// File system failure
    Io {
        /// What was being done
        action: &'static str,
        /// The underlying error
        source: io::Error,
    },

    /// The file content is not a valid bindings document
    Format(PersistFormatError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { action, source } => {
                write!(f, "Failed to {} bindings file: {}", action, source)
            }
            StoreError::Format(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            StoreError::Format(err) => Some(err),
        }
    }
}

impl From<PersistFormatError> for StoreError {
    fn from(err: PersistFormatError) -> Self {
        StoreError::Format(err)
    }
}

// ============================================================================
// Hotkey Error
// ============================================================================

/// Errors from hotkey parsing and registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyError {
    /// Text could not be parsed as a key combination
    InvalidKey {
        /// The offending text
        input: String,
        /// What was wrong
        reason: &'static str,
    },

    /// The combination is already active
    DuplicateBinding(KeyCombination),

    /// The combination is not active
    NotRegistered(KeyCombination),

    /// The combination is one of the program's own controls
    ReservedKey(KeyCombination),

    /// The hotkey backend refused the operation
    Backend {
        /// Combination involved
        key: KeyCombination,
        /// Backend message
        message: String,
    },
}

impl fmt::Display for HotkeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotkeyError::InvalidKey { input, reason } => {
                write!(f, "Invalid key combination '{}': {}", input, reason)
            }
            HotkeyError::DuplicateBinding(key) => {
                write!(f, "Key {} is already bound", key)
            }
            HotkeyError::NotRegistered(key) => {
                write!(f, "Key {} is not bound", key)
            }
            HotkeyError::ReservedKey(key) => {
                write!(f, "Key {} is a built-in control; add ctrl or alt", key)
            }
            HotkeyError::Backend { key, message } => {
                write!(f, "Cannot register {}: {}", key, message)
            }
        }
    }
}

impl std::error::Error for HotkeyError {}

// ============================================================================
// Elevation Error
// ============================================================================

/// Errors from gaining administrative privileges. All of them are fatal.
#[derive(Debug)]
pub enum ElevationError {
    /// The user dismissed the credential prompt
    Cancelled,

    /// The escalation tool rejected the credential
    CredentialRejected,

    /// The escalation tool could not be started
    LauncherUnavailable(io::Error),

    /// The credential was accepted but the relaunch failed
    RelaunchFailed(io::Error),

    /// This platform has no root/non-root split to escalate across
    #[cfg_attr(unix, allow(dead_code))]
    Unsupported,
}

impl fmt::Display for ElevationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElevationError::Cancelled => write!(f, "Root access required"),
            ElevationError::CredentialRejected => write!(f, "Failed to gain root access"),
            ElevationError::LauncherUnavailable(err) => {
                write!(f, "Cannot run sudo: {}", err)
            }
            ElevationError::RelaunchFailed(err) => {
                write!(f, "Failed to restart with root privileges: {}", err)
            }
            ElevationError::Unsupported => {
                write!(f, "Privilege elevation is not supported on this platform")
            }
        }
    }
}

impl std::error::Error for ElevationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ElevationError::LauncherUnavailable(err) | ElevationError::RelaunchFailed(err) => {
                Some(err)
            }
            _ => None,
        }
    }
}

// ============================================================================
// Result type aliases
// ============================================================================

/// Result type for process lookups
pub type ProcessResult<T> = Result<T, ProcessAccessError>;

/// Result type for affinity operations
pub type AffinityResult<T> = Result<T, AffinityError>;

/// Result type for bindings file operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for hotkey operations
pub type HotkeyResult<T> = Result<T, HotkeyError>;

/// Result type for elevation
pub type ElevationResult<T> = Result<T, ElevationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affinity_error_wraps_access_error() {
        let err: AffinityError = ProcessAccessError::NotFound { pid: 42 }.into();
        assert_eq!(err.to_string(), "Process 42 not found or has terminated");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_json_error_keeps_position() {
        let json_err = serde_json::from_str::<serde_json::Value>("{\n  \"version\": ,\n}")
            .unwrap_err();
        match PersistFormatError::from(json_err) {
            PersistFormatError::Malformed { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_elevation_messages() {
        assert_eq!(ElevationError::Cancelled.to_string(), "Root access required");
        assert_eq!(
            ElevationError::CredentialRejected.to_string(),
            "Failed to gain root access"
        );
    }
}
