//! Adding, removing and loading key bindings
//!
//! Every change goes registrar first, then the in-memory map, then the
//! file. A binding the registrar refused is never written.

use crossterm::event::{KeyCode, KeyEvent};

use crate::hotkeys::{from_key_event, HotkeyCallback, KeyCombination};
use crate::system::error::{HotkeyError, HotkeyResult, StoreError};
use crate::system::CoreLimit;

use super::hotkey_scope::limit_callback;
use super::input::is_builtin_key;
use super::{App, ViewMode};

impl App {
    fn callback_for(&self, executable: &str) -> HotkeyCallback {
        limit_callback(
            self.scope,
            executable.to_string(),
            self.selection.clone(),
            self.affinity.clone(),
            self.notice_tx.clone(),
        )
    }

    fn save_bindings(&mut self) {
        if let Err(err) = self.store.save(&self.bindings) {
            tracing::error!(%err, "cannot save bindings");
            self.set_error(err.to_string());
        }
    }

    /// Loads the bindings file and registers every binding in it.
    ///
    /// An unreadable file is reported, moved aside and replaced by an empty
    /// set of bindings.
    pub fn load_bindings(&mut self) {
        let loaded = match self.store.load() {
            Ok(map) => map,
            Err(StoreError::Format(err)) => {
                tracing::error!(path = %self.store.path().display(), %err, "bindings file unreadable");
                let message = match self.store.quarantine() {
                    Ok(moved) => format!(
                        "Bindings file unreadable ({}); moved to {}",
                        err,
                        moved.display()
                    ),
                    Err(move_err) => format!("Bindings file unreadable ({}); {}", err, move_err),
                };
                self.set_error(message);
                return;
            }
            Err(err) => {
                tracing::error!(%err, "cannot load bindings");
                self.set_error(err.to_string());
                return;
            }
        };

        if loaded.is_empty() {
            tracing::debug!(path = %self.store.path().display(), "no stored bindings");
        }

        let mut skipped = 0;
        for set in loaded.iter() {
            for binding in &set.bindings {
                let registered = if is_builtin_key(&binding.key) {
                    Err(HotkeyError::ReservedKey(binding.key))
                } else {
                    let callback = self.callback_for(&set.executable);
                    self.registrar.register(binding.key, binding.cores, callback)
                };
                match registered {
                    Ok(()) => self
                        .bindings
                        .add_binding(&set.executable, binding.key, binding.cores),
                    Err(err) => {
                        tracing::warn!(
                            executable = %set.executable,
                            key = %binding.key,
                            %err,
                            "stored binding not registered"
                        );
                        skipped += 1;
                    }
                }
            }
        }

        if skipped > 0 {
            self.set_error(format!("{} stored bindings could not be registered", skipped));
        }
    }

    /// Binds `key` to `cores` for `executable`: register, record, save.
    ///
    /// # Errors
    /// * `HotkeyError::ReservedKey` - `key` is one of the UI's own controls
    /// * `HotkeyError::DuplicateBinding` - `key` is bound already (for any executable)
    /// * `HotkeyError::Backend` - the hotkey backend refused `key`
    pub fn add_binding(
        &mut self,
        executable: &str,
        key: KeyCombination,
        cores: CoreLimit,
    ) -> HotkeyResult<()> {
        if is_builtin_key(&key) {
            return Err(HotkeyError::ReservedKey(key));
        }
        let callback = self.callback_for(executable);
        self.registrar.register(key, cores, callback)?;

        self.bindings.add_binding(executable, key, cores);
        tracing::info!(%executable, %key, cores = cores.get(), "binding added");
        self.save_bindings();
        Ok(())
    }

    /// Removes the binding of `key` for `executable`: unregister, drop, save.
    ///
    /// # Returns
    /// `false` if there was no such binding (nothing changes)
    pub fn remove_binding(&mut self, executable: &str, key: &KeyCombination) -> bool {
        if !self
            .bindings
            .bindings_for(executable)
            .iter()
            .any(|b| b.key == *key)
        {
            return false;
        }

        // A binding whose registration failed at startup is still removable
        if let Err(err) = self.registrar.unregister(key) {
            tracing::warn!(%executable, %key, %err, "unregister failed");
            self.set_error(err.to_string());
        }

        self.bindings.remove_binding(executable, key);
        tracing::info!(%executable, %key, "binding removed");
        self.save_bindings();
        true
    }

    /// Removes the highlighted binding of the selected executable.
    pub fn remove_selected_binding(&mut self) {
        let Some(executable) = self.current_selection().map(|s| s.executable.clone()) else {
            self.set_error("No process selected");
            return;
        };
        let Some(key) = self.selected_bindings().get(self.binding_index).map(|b| b.key) else {
            return;
        };

        self.clear_status();
        if self.remove_binding(&executable, &key) && !self.status_is_error {
            self.set_status(format!("Removed {}", key));
        }

        let count = self.selected_bindings().len();
        if self.binding_index >= count {
            self.binding_index = count.saturating_sub(1);
        }
    }

    /// Starts adding a binding for the selected executable.
    pub fn begin_add_binding(&mut self) {
        match self.current_selection() {
            None => {
                self.set_error("No process selected");
                return;
            }
            Some(selection) if selection.executable.is_empty() => {
                self.set_error("The selected process has no readable executable path");
                return;
            }
            Some(_) => {}
        }

        self.pending_key = None;
        self.pending_cores = self.core_choice;
        self.view_mode = ViewMode::CaptureKey;
    }

    /// Takes the key combination for the binding being added.
    ///
    /// Esc cancels. A combination that is already bound, or that the UI
    /// uses itself, is refused and capture continues.
    pub fn capture_key(&mut self, event: KeyEvent) {
        if event.code == KeyCode::Esc && event.modifiers.is_empty() {
            self.cancel_binding();
            return;
        }
        let Some(key) = from_key_event(&event) else {
            return;
        };

        if is_builtin_key(&key) {
            self.set_error(HotkeyError::ReservedKey(key).to_string());
            return;
        }

        if let Some(owner) = self.bindings.owner_of(&key) {
            let message = format!("{} is already bound for {}", key, owner);
            self.set_error(message);
            return;
        }
        if self.registrar.is_registered(&key) {
            self.set_error(HotkeyError::DuplicateBinding(key).to_string());
            return;
        }

        self.clear_status();
        self.pending_key = Some(key);
        self.view_mode = ViewMode::ChooseCores;
    }

    /// Raises the core count of the binding being added.
    pub fn increase_pending_cores(&mut self) {
        self.pending_cores = (self.pending_cores + 1).min(self.total_cores);
    }

    /// Lowers the core count of the binding being added.
    pub fn decrease_pending_cores(&mut self) {
        self.pending_cores = self.pending_cores.saturating_sub(1).max(1);
    }

    /// Finishes adding the binding with the captured key and core count.
    pub fn confirm_binding(&mut self) {
        self.view_mode = ViewMode::Main;
        self.clear_status();

        let executable = self.current_selection().map(|s| s.executable.clone());
        let (Some(executable), Some(key), Some(cores)) = (
            executable,
            self.pending_key.take(),
            CoreLimit::new(self.pending_cores),
        ) else {
            return;
        };

        match self.add_binding(&executable, key, cores) {
            Ok(()) if !self.status_is_error => {
                self.set_status(format!("Bound {} to {} cores for {}", key, cores, executable));
                self.binding_index = self.selected_bindings().len().saturating_sub(1);
            }
            Ok(()) => {}
            Err(err) => {
                tracing::warn!(%executable, %key, %err, "binding refused");
                self.set_error(err.to_string());
            }
        }
    }

    /// Abandons the binding being added.
    pub fn cancel_binding(&mut self) {
        self.pending_key = None;
        self.view_mode = ViewMode::Main;
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    use crossterm::event::KeyModifiers;

    use super::super::state::tests::{process, test_app};
    use super::super::{HotkeyScope, Notice};
    use crate::bindings::BindingStore;

    use super::*;

    fn temp_store(name: &str) -> BindingStore {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        BindingStore::new(std::env::temp_dir().join(format!(
            "core_limiter_app_{}_{}_{}.json",
            name,
            std::process::id(),
            nanos
        )))
    }

    fn key(s: &str) -> KeyCombination {
        KeyCombination::parse(s).unwrap()
    }

    fn cores(n: u32) -> CoreLimit {
        CoreLimit::new(n).unwrap()
    }

    #[test]
    fn test_binding_survives_restart_and_fires_on_current_selection() {
        let store = temp_store("restart");
        {
            let (mut app, _) = test_app(store.clone(), HotkeyScope::AnySelection);
            app.select(process(100, "/usr/bin/app"));
            app.add_binding("/usr/bin/app", key("ctrl+1"), cores(2)).unwrap();
        }

        let (mut app, affinity) = test_app(store.clone(), HotkeyScope::AnySelection);
        app.load_bindings();
        assert_eq!(app.bindings.bindings_for("/usr/bin/app").len(), 1);

        app.select(process(200, "/usr/bin/app"));
        assert!(app.dispatch_hotkey(&key("Ctrl+1")));
        assert_eq!(affinity.applied(), vec![(200, 2)]);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Limited app (PID 200) to 2 cores")
        );

        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_hotkey_follows_selection_in_any_selection_scope() {
        let store = temp_store("any");
        let (mut app, affinity) = test_app(store.clone(), HotkeyScope::AnySelection);

        app.select(process(1, "/usr/bin/a"));
        app.add_binding("/usr/bin/a", key("ctrl+x"), cores(1)).unwrap();
        app.select(process(2, "/usr/bin/b"));

        assert!(app.dispatch_hotkey(&key("ctrl+x")));
        assert_eq!(affinity.applied(), vec![(2, 1)]);

        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_hotkey_scoped_to_owning_executable() {
        let store = temp_store("scoped");
        let (mut app, affinity) = test_app(store.clone(), HotkeyScope::OwningExecutable);

        app.select(process(1, "/usr/bin/a"));
        app.add_binding("/usr/bin/a", key("ctrl+x"), cores(1)).unwrap();

        app.select(process(2, "/usr/bin/b"));
        assert!(app.dispatch_hotkey(&key("ctrl+x")));
        assert!(affinity.applied().is_empty());
        assert!(app.status_is_error);

        app.select(process(3, "/usr/bin/a"));
        assert!(app.dispatch_hotkey(&key("ctrl+x")));
        assert_eq!(affinity.applied(), vec![(3, 1)]);

        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_hotkey_with_no_selection_reports_it() {
        let (app, _) = test_app(temp_store("unused"), HotkeyScope::AnySelection);
        let (tx, rx) = std::sync::mpsc::channel();
        let callback = limit_callback(
            HotkeyScope::AnySelection,
            "/usr/bin/a".to_string(),
            app.selection.clone(),
            app.affinity.clone(),
            tx,
        );

        callback(cores(1));
        assert_eq!(rx.try_recv(), Ok(Notice::NoSelection));
    }

    #[test]
    fn test_failed_hotkey_names_the_process() {
        let (mut app, _) = test_app(temp_store("unused"), HotkeyScope::AnySelection);
        app.select(process(7, "/usr/bin/a"));
        let (tx, rx) = std::sync::mpsc::channel();
        let callback = limit_callback(
            HotkeyScope::AnySelection,
            "/usr/bin/a".to_string(),
            app.selection.clone(),
            app.affinity.clone(),
            tx,
        );

        callback(cores(16));
        let notice = rx.try_recv().unwrap();
        assert!(notice.is_failure());
        assert!(notice.to_string().starts_with("PID 7: "));
    }

    #[test]
    fn test_duplicate_key_is_not_persisted() {
        let store = temp_store("duplicate");
        let (mut app, _) = test_app(store.clone(), HotkeyScope::AnySelection);

        app.add_binding("/usr/bin/a", key("ctrl+1"), cores(1)).unwrap();
        let err = app
            .add_binding("/usr/bin/b", key("ctrl+1"), cores(2))
            .unwrap_err();
        assert_eq!(err, HotkeyError::DuplicateBinding(key("ctrl+1")));

        assert!(app.bindings.bindings_for("/usr/bin/b").is_empty());
        let saved = store.load().unwrap();
        assert_eq!(saved, app.bindings);
        assert_eq!(saved.binding_count(), 1);

        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_remove_binding_frees_key_and_is_idempotent() {
        let store = temp_store("remove");
        let (mut app, _) = test_app(store.clone(), HotkeyScope::AnySelection);

        app.add_binding("/usr/bin/a", key("f5"), cores(2)).unwrap();
        assert!(app.remove_binding("/usr/bin/a", &key("f5")));
        assert!(!app.remove_binding("/usr/bin/a", &key("f5")));
        assert!(store.load().unwrap().is_empty());

        // The combination can be bound again
        app.add_binding("/usr/bin/b", key("f5"), cores(1)).unwrap();

        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_add_flow_from_key_events() {
        let store = temp_store("flow");
        let (mut app, _) = test_app(store.clone(), HotkeyScope::AnySelection);

        app.begin_add_binding();
        assert_eq!(app.view_mode, ViewMode::Main);
        assert_eq!(app.status_message.as_deref(), Some("No process selected"));

        app.select(process(9, "/usr/bin/app"));
        app.begin_add_binding();
        assert_eq!(app.view_mode, ViewMode::CaptureKey);

        app.capture_key(KeyEvent::new(KeyCode::Char('1'), KeyModifiers::CONTROL));
        assert_eq!(app.view_mode, ViewMode::ChooseCores);
        assert_eq!(app.pending_key, Some(key("ctrl+1")));

        app.decrease_pending_cores();
        app.confirm_binding();
        assert_eq!(app.view_mode, ViewMode::Main);
        assert_eq!(
            app.selected_bindings(),
            &[crate::bindings::KeyBinding {
                key: key("ctrl+1"),
                cores: cores(7)
            }]
        );

        // Capturing the same combination again is refused
        app.begin_add_binding();
        app.capture_key(KeyEvent::new(KeyCode::Char('1'), KeyModifiers::CONTROL));
        assert_eq!(app.view_mode, ViewMode::CaptureKey);
        app.capture_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert_eq!(app.view_mode, ViewMode::Main);

        app.remove_selected_binding();
        assert!(app.selected_bindings().is_empty());

        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_builtin_controls_cannot_be_bound() {
        let store = temp_store("builtin");
        let (mut app, _) = test_app(store.clone(), HotkeyScope::AnySelection);
        app.select(process(9, "/usr/bin/app"));

        app.begin_add_binding();
        for code in [KeyCode::Char('p'), KeyCode::Char('D'), KeyCode::Delete, KeyCode::Up] {
            app.capture_key(KeyEvent::new(code, KeyModifiers::NONE));
            assert_eq!(app.view_mode, ViewMode::CaptureKey, "{:?}", code);
            assert_eq!(app.pending_key, None);
            assert!(app.status_is_error);
        }

        // With a modifier the same letter is fine
        app.capture_key(KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL));
        assert_eq!(app.pending_key, Some(key("ctrl+p")));
        app.cancel_binding();

        let err = app
            .add_binding("/usr/bin/app", key("d"), cores(1))
            .unwrap_err();
        assert_eq!(err, HotkeyError::ReservedKey(key("d")));
        assert!(app.selected_bindings().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_stored_builtin_key_is_skipped() {
        let store = temp_store("stored_builtin");
        let mut map = crate::bindings::BindingMap::new();
        map.add_binding("/usr/bin/app", key("p"), cores(1));
        map.add_binding("/usr/bin/app", key("ctrl+1"), cores(2));
        store.save(&map).unwrap();

        let (mut app, _) = test_app(store.clone(), HotkeyScope::AnySelection);
        app.load_bindings();

        assert_eq!(app.bindings.binding_count(), 1);
        assert!(app.is_terminal_hotkey(&key("ctrl+1")));
        assert!(!app.is_terminal_hotkey(&key("p")));
        assert!(app.status_is_error);

        let _ = fs::remove_file(store.path());
    }

    #[test]
    fn test_malformed_file_is_moved_aside() {
        let store = temp_store("malformed");
        fs::write(store.path(), "<KeyBindings><broken").unwrap();

        let (mut app, _) = test_app(store.clone(), HotkeyScope::AnySelection);
        app.load_bindings();

        assert!(app.bindings.is_empty());
        assert!(app.status_is_error);
        assert!(!store.path().exists());

        let mut corrupt = store.path().as_os_str().to_owned();
        corrupt.push(".corrupt");
        assert!(std::path::Path::new(&corrupt).exists());
        let _ = fs::remove_file(corrupt);
    }
}
