//! The selected process, shared with hotkey callbacks
//!
//! Hotkeys may fire on a listener thread, so the selection sits behind a
//! mutex. Readers take a copy and never hold the lock while working.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::system::ProcessInfo;

/// The process the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub pid: u32,
    pub name: String,
    pub executable: String,
}

impl From<ProcessInfo> for Selection {
    fn from(info: ProcessInfo) -> Self {
        Self {
            pid: info.pid,
            name: info.name,
            executable: info.executable,
        }
    }
}

/// Cloneable handle to the current selection.
#[derive(Debug, Clone, Default)]
pub struct SharedSelection {
    inner: Arc<Mutex<Option<Selection>>>,
}

impl SharedSelection {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Selection>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the selection
    pub fn select(&self, selection: Selection) {
        *self.lock() = Some(selection);
    }

    /// Copy of the current selection
    pub fn snapshot(&self) -> Option<Selection> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let selection = SharedSelection::new();
        let other = selection.clone();
        assert!(other.snapshot().is_none());

        selection.select(Selection {
            pid: 7,
            name: "app".to_string(),
            executable: "/usr/bin/app".to_string(),
        });
        assert_eq!(other.snapshot().map(|s| s.pid), Some(7));
    }
}
