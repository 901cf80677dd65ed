//! Safe wrappers around Win32 handles
//!
//! RAII types that call CloseHandle when they go out of scope.

mod handles;

pub use handles::{wide_to_string, ProcessHandle, SnapshotHandle, TokenHandle};
