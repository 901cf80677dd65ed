//! Hotkey registration
//!
//! The registrar owns the table of active key combinations. A backend makes
//! a combination reachable (system-wide or only while the terminal has
//! focus) and delivers presses back through [`HotkeyTable::dispatch`],
//! possibly from a thread other than the UI's.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::system::error::{HotkeyError, HotkeyResult};
use crate::system::CoreLimit;

use super::KeyCombination;

/// Invoked with the bound core limit when its combination is pressed.
pub type HotkeyCallback = Arc<dyn Fn(CoreLimit) + Send + Sync>;

struct Registration {
    cores: CoreLimit,
    callback: HotkeyCallback,
}

/// Active combinations, shared between the registrar and the backend that
/// delivers presses.
#[derive(Default)]
pub struct HotkeyTable {
    entries: Mutex<HashMap<KeyCombination, Registration>>,
}

impl HotkeyTable {
    /// Creates an empty shared table
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<KeyCombination, Registration>> {
        // A panicking callback never runs under this lock
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True if `key` is active
    pub fn contains(&self, key: &KeyCombination) -> bool {
        self.lock().contains_key(key)
    }

    /// Number of active combinations
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Runs the callback bound to `key`, if any.
    ///
    /// # Returns
    /// `true` if `key` was registered and its callback ran
    pub fn dispatch(&self, key: &KeyCombination) -> bool {
        // Clone out of the lock so the callback can take its time
        let hit = self
            .lock()
            .get(key)
            .map(|r| (r.cores, Arc::clone(&r.callback)));

        match hit {
            Some((cores, callback)) => {
                tracing::info!(key = %key, cores = cores.get(), "hotkey fired");
                callback(cores);
                true
            }
            None => false,
        }
    }
}

/// Makes combinations reachable from the keyboard.
pub trait HotkeyBackend {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Start listening for `key`
    fn activate(&mut self, key: &KeyCombination) -> HotkeyResult<()>;

    /// Stop listening for `key`
    fn deactivate(&mut self, key: &KeyCombination) -> HotkeyResult<()>;

    /// True if presses arrive through the UI's own key events
    fn reads_terminal_input(&self) -> bool {
        false
    }
}

/// Registers and unregisters key combinations.
///
/// A combination can be active at most once; callers must not persist a
/// binding whose registration failed.
pub struct HotkeyRegistrar {
    table: Arc<HotkeyTable>,
    backend: Box<dyn HotkeyBackend>,
}

impl HotkeyRegistrar {
    /// Creates a registrar over `table`, which `backend` dispatches into.
    pub fn new(table: Arc<HotkeyTable>, backend: Box<dyn HotkeyBackend>) -> Self {
        tracing::debug!(backend = backend.name(), "hotkey registrar ready");
        Self { table, backend }
    }

    /// Name of the active backend
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// True if the UI must feed key events to [`HotkeyRegistrar::dispatch`]
    pub fn reads_terminal_input(&self) -> bool {
        self.backend.reads_terminal_input()
    }

    /// Activates `key` so that pressing it calls `callback(cores)`.
    ///
    /// # Errors
    /// * `HotkeyError::DuplicateBinding` - `key` is already active
    /// * `HotkeyError::Backend` - the backend refused the combination
    pub fn register(
        &mut self,
        key: KeyCombination,
        cores: CoreLimit,
        callback: HotkeyCallback,
    ) -> HotkeyResult<()> {
        if self.table.contains(&key) {
            return Err(HotkeyError::DuplicateBinding(key));
        }

        self.backend.activate(&key)?;
        self.table.lock().insert(key, Registration { cores, callback });
        tracing::debug!(
            key = %key,
            cores = cores.get(),
            active = self.table.len(),
            "hotkey registered"
        );
        Ok(())
    }

    /// Deactivates `key`.
    ///
    /// # Errors
    /// * `HotkeyError::NotRegistered` - `key` is not active
    pub fn unregister(&mut self, key: &KeyCombination) -> HotkeyResult<()> {
        if self.table.lock().remove(key).is_none() {
            return Err(HotkeyError::NotRegistered(*key));
        }

        tracing::debug!(key = %key, "hotkey unregistered");
        self.backend.deactivate(key)
    }

    /// True if `key` is active
    pub fn is_registered(&self, key: &KeyCombination) -> bool {
        self.table.contains(key)
    }

    /// Runs the callback for `key`; see [`HotkeyTable::dispatch`].
    pub fn dispatch(&self, key: &KeyCombination) -> bool {
        self.table.dispatch(key)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::hotkeys::TerminalBackend;

    fn registrar() -> HotkeyRegistrar {
        HotkeyRegistrar::new(HotkeyTable::new(), Box::new(TerminalBackend))
    }

    fn key(s: &str) -> KeyCombination {
        KeyCombination::parse(s).unwrap()
    }

    fn noop() -> HotkeyCallback {
        Arc::new(|_| {})
    }

    #[test]
    fn test_duplicate_registration_fails_until_unregistered() {
        let mut reg = registrar();
        let two = CoreLimit::new(2).unwrap();

        reg.register(key("ctrl+1"), two, noop()).unwrap();
        let err = reg.register(key("Ctrl 1"), two, noop()).unwrap_err();
        assert_eq!(err, HotkeyError::DuplicateBinding(key("ctrl+1")));

        reg.unregister(&key("ctrl+1")).unwrap();
        assert!(reg.register(key("ctrl+1"), two, noop()).is_ok());
    }

    #[test]
    fn test_unregister_missing_key_fails() {
        let mut reg = registrar();
        let err = reg.unregister(&key("alt+f4")).unwrap_err();
        assert_eq!(err, HotkeyError::NotRegistered(key("alt+f4")));
    }

    #[test]
    fn test_dispatch_passes_bound_core_limit() {
        let mut reg = registrar();
        let seen = Arc::new(AtomicU32::new(0));
        let sink = Arc::clone(&seen);

        reg.register(
            key("ctrl+3"),
            CoreLimit::new(3).unwrap(),
            Arc::new(move |cores| sink.store(cores.get(), Ordering::SeqCst)),
        )
        .unwrap();

        assert!(!reg.dispatch(&key("ctrl+4")));
        assert!(reg.dispatch(&key("ctrl+3")));
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_dispatch_from_another_thread() {
        let table = HotkeyTable::new();
        let mut reg = HotkeyRegistrar::new(Arc::clone(&table), Box::new(TerminalBackend));
        let seen = Arc::new(AtomicU32::new(0));
        let sink = Arc::clone(&seen);
        reg.register(
            key("f5"),
            CoreLimit::new(1).unwrap(),
            Arc::new(move |cores| {
                sink.fetch_add(cores.get(), Ordering::SeqCst);
            }),
        )
        .unwrap();

        let fired = std::thread::spawn(move || table.dispatch(&key("f5")))
            .join()
            .unwrap();
        assert!(fired);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_activation_is_not_recorded() {
        struct Refusing;
        impl HotkeyBackend for Refusing {
            fn name(&self) -> &'static str {
                "refusing"
            }
            fn activate(&mut self, key: &KeyCombination) -> HotkeyResult<()> {
                Err(HotkeyError::Backend {
                    key: *key,
                    message: "taken by another application".to_string(),
                })
            }
            fn deactivate(&mut self, _key: &KeyCombination) -> HotkeyResult<()> {
                Ok(())
            }
        }

        let mut reg = HotkeyRegistrar::new(HotkeyTable::new(), Box::new(Refusing));
        assert!(reg
            .register(key("ctrl+1"), CoreLimit::new(1).unwrap(), noop())
            .is_err());
        assert!(!reg.is_registered(&key("ctrl+1")));
    }
}
