//! What a fired hotkey acts on
//!
//! A binding belongs to an executable, but by default it limits whichever
//! process is selected when the key is pressed. With `--scoped-hotkeys` it
//! only acts if the selected process runs the binding's executable.

use std::fmt;
use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::hotkeys::HotkeyCallback;
use crate::system::{AffinityControl, CoreLimit};

use super::selection::{Selection, SharedSelection};

/// Which process a fired hotkey may affect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HotkeyScope {
    /// The selected process, whatever it runs
    #[default]
    AnySelection,
    /// The selected process, only if it runs the bound executable
    OwningExecutable,
}

impl HotkeyScope {
    /// True if a binding made for `bound_executable` may act on `target`
    pub fn permits(self, bound_executable: &str, target: &Selection) -> bool {
        match self {
            HotkeyScope::AnySelection => true,
            HotkeyScope::OwningExecutable => target.executable == bound_executable,
        }
    }

    /// Label for the header line
    pub fn label(self) -> &'static str {
        match self {
            HotkeyScope::AnySelection => "any selection",
            HotkeyScope::OwningExecutable => "bound executable only",
        }
    }
}

/// Outcome of a fired hotkey, reported to the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The limit was applied
    Applied { pid: u32, name: String, cores: CoreLimit },
    /// The limit could not be applied
    Failed { pid: u32, message: String },
    /// Nothing is selected
    NoSelection,
    /// The selected process runs a different executable
    OutOfScope { pid: u32, executable: String },
}

impl Notice {
    pub fn is_failure(&self) -> bool {
        !matches!(self, Notice::Applied { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Applied { pid, name, cores } => {
                write!(f, "Limited {} (PID {}) to {} cores", name, pid, cores)
            }
            Notice::Failed { pid, message } => write!(f, "PID {}: {}", pid, message),
            Notice::NoSelection => write!(f, "No process selected"),
            Notice::OutOfScope { pid, executable } => {
                write!(f, "Hotkey not bound for PID {} ({})", pid, executable)
            }
        }
    }
}

/// Builds the callback registered for one binding.
///
/// The callback captures the executable it was bound for and reads the
/// selection only when fired, so it sees whatever is selected at that
/// moment.
pub fn limit_callback(
    scope: HotkeyScope,
    executable: String,
    selection: SharedSelection,
    affinity: Arc<dyn AffinityControl>,
    notices: Sender<Notice>,
) -> HotkeyCallback {
    Arc::new(move |cores: CoreLimit| {
        let notice = match selection.snapshot() {
            None => Notice::NoSelection,
            Some(target) if !scope.permits(&executable, &target) => Notice::OutOfScope {
                pid: target.pid,
                executable: target.executable,
            },
            Some(target) => match affinity.apply_limit(target.pid, cores) {
                Ok(()) => {
                    tracing::info!(pid = target.pid, cores = cores.get(), "limit applied by hotkey");
                    Notice::Applied {
                        pid: target.pid,
                        name: target.name,
                        cores,
                    }
                }
                Err(err) => {
                    tracing::warn!(pid = target.pid, %err, "hotkey limit failed");
                    Notice::Failed {
                        pid: target.pid,
                        message: err.to_string(),
                    }
                }
            },
        };

        // The UI may already be gone during shutdown
        let _ = notices.send(notice);
    })
}
