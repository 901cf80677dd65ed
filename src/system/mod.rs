//! Operating system access - processes, CPU affinity and privileges
//!
//! Each submodule hides its platform backends behind plain functions so the
//! rest of the program never touches `libc`, `procfs` or Win32 directly.

pub mod admin;
pub mod affinity;
pub mod error;
pub mod processes;

pub use affinity::{AffinityControl, CoreLimit, SystemAffinity};
pub use processes::ProcessInfo;
