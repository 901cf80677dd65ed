//! Application state and core logic

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use crate::bindings::{BindingMap, BindingStore, KeyBinding};
use crate::hotkeys::{HotkeyRegistrar, KeyCombination};
use crate::system::affinity::describe_cores;
use crate::system::error::{AffinityError, ProcessAccessError};
use crate::system::processes::{find_process, list_processes};
use crate::system::{AffinityControl, CoreLimit, ProcessInfo};

use super::cli::Args;
use super::{HotkeyScope, Notice, Selection, SharedSelection, ViewMode};

/// Application state
pub struct App {
    /// All processes from the last refresh
    pub processes: Vec<ProcessInfo>,
    /// Processes matching the filter
    pub filtered_processes: Vec<ProcessInfo>,
    /// Picker cursor
    pub selected_index: usize,
    /// Scroll offset for the process list
    pub scroll_offset: usize,
    /// Search filter string
    pub filter: String,
    /// Current view/input mode
    pub view_mode: ViewMode,
    /// Status line message (if any)
    pub status_message: Option<String>,
    /// True if the status message reports a failure
    pub status_is_error: bool,
    /// "Current CPU core usage" of the selected process
    pub core_usage: String,
    /// Logical cores on this machine
    pub total_cores: u32,
    /// Core count chosen on the main screen
    pub core_choice: u32,
    /// All key bindings, owned by the UI thread
    pub bindings: BindingMap,
    /// Highlighted row in the bindings list
    pub binding_index: usize,
    /// Key captured for a binding being added
    pub pending_key: Option<KeyCombination>,
    /// Core count for a binding being added
    pub pending_cores: u32,
    /// UI tick in milliseconds
    pub tick_ms: u64,
    /// Which process a fired hotkey may affect
    pub scope: HotkeyScope,
    /// UI-thread copy of the selection
    current: Option<Selection>,
    /// The selection as seen by hotkey callbacks
    pub(super) selection: SharedSelection,
    pub(super) store: BindingStore,
    pub(super) registrar: HotkeyRegistrar,
    pub(super) affinity: Arc<dyn AffinityControl>,
    pub(super) notice_tx: Sender<Notice>,
    notice_rx: Receiver<Notice>,
}

impl App {
    /// Creates an App with no selection and no bindings loaded yet.
    pub fn new(
        store: BindingStore,
        registrar: HotkeyRegistrar,
        affinity: Arc<dyn AffinityControl>,
        scope: HotkeyScope,
    ) -> Self {
        let total_cores = affinity.core_count().max(1);
        let (notice_tx, notice_rx) = mpsc::channel();

        Self {
            processes: Vec::new(),
            filtered_processes: Vec::new(),
            selected_index: 0,
            scroll_offset: 0,
            filter: String::new(),
            view_mode: ViewMode::default(),
            status_message: None,
            status_is_error: false,
            core_usage: String::new(),
            total_cores,
            core_choice: total_cores,
            bindings: BindingMap::new(),
            binding_index: 0,
            pending_key: None,
            pending_cores: total_cores,
            tick_ms: crate::constants::DEFAULT_TICK_MS,
            scope,
            current: None,
            selection: SharedSelection::new(),
            store,
            registrar,
            affinity,
            notice_tx,
            notice_rx,
        }
    }

    /// Creates an App configured with command-line arguments.
    pub fn with_args(
        args: &Args,
        registrar: HotkeyRegistrar,
        affinity: Arc<dyn AffinityControl>,
    ) -> Self {
        let mut app = Self::new(
            BindingStore::new(args.bindings.clone()),
            registrar,
            affinity,
            args.scope,
        );
        app.tick_ms = args.tick;
        app
    }

    /// Shows a message in the status line.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_is_error = false;
    }

    /// Shows a failure in the status line.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_is_error = true;
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
        self.status_is_error = false;
    }

    /// Name of the hotkey backend in use
    pub fn hotkey_backend(&self) -> &'static str {
        self.registrar.backend_name()
    }

    /// Location of the bindings file
    pub fn bindings_path(&self) -> &std::path::Path {
        self.store.path()
    }

    // ------------------------------------------------------------------
    // Process list
    // ------------------------------------------------------------------

    /// Re-reads the process list and re-applies the filter.
    pub fn refresh_processes(&mut self) {
        self.processes = list_processes();
        self.apply_filter();
    }

    /// Apply the current filter to the process list.
    ///
    /// Matches the name or the executable path, case-insensitively.
    pub fn apply_filter(&mut self) {
        self.filtered_processes = if self.filter.is_empty() {
            self.processes.clone()
        } else {
            let filter_lower = self.filter.to_lowercase();
            self.processes
                .iter()
                .filter(|p| {
                    p.name.to_lowercase().contains(&filter_lower)
                        || p.executable.to_lowercase().contains(&filter_lower)
                })
                .cloned()
                .collect()
        };

        if self.selected_index >= self.filtered_processes.len() {
            self.selected_index = self.filtered_processes.len().saturating_sub(1);
        }
    }

    /// Opens the process picker with the cursor on the current selection.
    pub fn open_picker(&mut self) {
        self.refresh_processes();
        if let Some(current) = &self.current {
            if let Some(index) = self
                .filtered_processes
                .iter()
                .position(|p| p.pid == current.pid)
            {
                self.selected_index = index;
            }
        }
        self.view_mode = ViewMode::ProcessPicker;
    }

    /// Selects the process under the picker cursor and returns to the main
    /// screen.
    pub fn confirm_process_selection(&mut self) {
        if let Some(pid) = self.filtered_processes.get(self.selected_index).map(|p| p.pid) {
            self.select_process(pid);
        }
        self.view_mode = ViewMode::Main;
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Selects `pid`, reading its executable path afresh.
    pub fn select_process(&mut self, pid: u32) {
        match find_process(pid) {
            Ok(info) => self.select(info),
            Err(err) => {
                tracing::warn!(pid, %err, "cannot select process");
                self.set_error(err.to_string());
            }
        }
    }

    /// Makes `info` the selected process.
    pub fn select(&mut self, info: ProcessInfo) {
        let selection = Selection::from(info);
        tracing::info!(
            pid = selection.pid,
            executable = %selection.executable,
            "process selected"
        );

        self.set_status(format!(
            "Selected PID: {} ({})",
            selection.pid, selection.executable
        ));
        self.selection.select(selection.clone());
        self.current = Some(selection);
        self.binding_index = 0;
        self.refresh_core_usage();
    }

    /// The selected process, if any
    pub fn current_selection(&self) -> Option<&Selection> {
        self.current.as_ref()
    }

    /// Bindings of the selected process's executable
    pub fn selected_bindings(&self) -> &[KeyBinding] {
        match &self.current {
            Some(current) => self.bindings.bindings_for(&current.executable),
            None => &[],
        }
    }

    // ------------------------------------------------------------------
    // Affinity
    // ------------------------------------------------------------------

    /// Re-reads the selected process's affinity into `core_usage`.
    pub fn refresh_core_usage(&mut self) {
        let Some(pid) = self.current.as_ref().map(|c| c.pid) else {
            self.core_usage.clear();
            return;
        };

        self.core_usage = match self.affinity.query_cores(pid) {
            Ok(cores) => describe_cores(&cores, self.total_cores),
            Err(AffinityError::Access(ProcessAccessError::NotFound { .. })) => {
                "Process has exited".to_string()
            }
            Err(err) => {
                tracing::debug!(pid, %err, "cannot read affinity");
                "Unknown".to_string()
            }
        };
    }

    /// Applies the chosen core count to the selected process.
    pub fn apply_selected_limit(&mut self) {
        let Some(target) = self.current.clone() else {
            tracing::warn!("apply requested with no process selected");
            self.set_error("No process selected");
            return;
        };
        let Some(limit) = CoreLimit::new(self.core_choice) else {
            return;
        };

        match self.affinity.apply_limit(target.pid, limit) {
            Ok(()) => {
                match self.affinity.query_limit(target.pid) {
                    Ok(effective) => tracing::info!(
                        pid = target.pid,
                        cores = limit.get(),
                        effective,
                        "limit applied"
                    ),
                    Err(err) => tracing::info!(
                        pid = target.pid,
                        cores = limit.get(),
                        %err,
                        "limit applied, affinity not readable"
                    ),
                }
                self.set_status(format!(
                    "Limited {} (PID {}) to {} cores",
                    target.name, target.pid, limit
                ));
            }
            Err(err) => {
                tracing::warn!(pid = target.pid, cores = limit.get(), %err, "limit failed");
                self.set_error(err.to_string());
            }
        }
        self.refresh_core_usage();
    }

    /// Raises the chosen core count, up to the machine's core count.
    pub fn increase_cores(&mut self) {
        self.core_choice = (self.core_choice + 1).min(self.total_cores);
    }

    /// Lowers the chosen core count, down to one.
    pub fn decrease_cores(&mut self) {
        self.core_choice = self.core_choice.saturating_sub(1).max(1);
    }

    // ------------------------------------------------------------------
    // Hotkeys
    // ------------------------------------------------------------------

    /// Fires `key` if it is bound; see [`HotkeyRegistrar::dispatch`].
    ///
    /// # Returns
    /// `true` if a binding ran
    pub fn dispatch_hotkey(&mut self, key: &KeyCombination) -> bool {
        let fired = self.registrar.dispatch(key);
        if fired {
            self.drain_notices();
        }
        fired
    }

    /// True if `key` is an active hotkey the UI must deliver itself
    pub fn is_terminal_hotkey(&self, key: &KeyCombination) -> bool {
        self.registrar.reads_terminal_input() && self.registrar.is_registered(key)
    }

    /// Shows the outcome of hotkeys fired since the last call.
    pub fn drain_notices(&mut self) {
        let mut applied = false;
        while let Ok(notice) = self.notice_rx.try_recv() {
            applied |= !notice.is_failure();
            if notice.is_failure() {
                self.set_error(notice.to_string());
            } else {
                self.set_status(notice.to_string());
            }
        }
        if applied {
            self.refresh_core_usage();
        }
    }

    /// Periodic update: hotkey outcomes and the core usage label.
    pub fn tick(&mut self) {
        self.drain_notices();
        self.refresh_core_usage();
    }
}

#[cfg(test)]
pub(super) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::hotkeys::{HotkeyTable, TerminalBackend};
    use crate::system::error::AffinityResult;

    /// Records applied limits instead of touching real processes.
    #[derive(Default)]
    pub struct RecordingAffinity {
        applied: Mutex<Vec<(u32, u32)>>,
        masks: Mutex<HashMap<u32, Vec<usize>>>,
    }

    impl RecordingAffinity {
        pub fn applied(&self) -> Vec<(u32, u32)> {
            self.applied.lock().unwrap().clone()
        }
    }

    impl AffinityControl for RecordingAffinity {
        fn core_count(&self) -> u32 {
            8
        }

        fn apply_limit(&self, pid: u32, limit: CoreLimit) -> AffinityResult<()> {
            if limit.get() > 8 {
                return Err(AffinityError::InvalidCoreCount {
                    requested: limit.get(),
                    available: 8,
                });
            }
            self.applied.lock().unwrap().push((pid, limit.get()));
            self.masks.lock().unwrap().insert(pid, limit.core_set());
            Ok(())
        }

        fn query_cores(&self, pid: u32) -> AffinityResult<Vec<usize>> {
            Ok(self
                .masks
                .lock()
                .unwrap()
                .get(&pid)
                .cloned()
                .unwrap_or_else(|| (0..8).collect()))
        }

        fn query_limit(&self, pid: u32) -> AffinityResult<usize> {
            self.query_cores(pid).map(|cores| cores.len())
        }
    }

    pub fn test_app(
        store: BindingStore,
        scope: HotkeyScope,
    ) -> (App, Arc<RecordingAffinity>) {
        let affinity = Arc::new(RecordingAffinity::default());
        let registrar = HotkeyRegistrar::new(HotkeyTable::new(), Box::new(TerminalBackend));
        let app = App::new(store, registrar, affinity.clone(), scope);
        (app, affinity)
    }

    pub fn process(pid: u32, executable: &str) -> ProcessInfo {
        ProcessInfo {
            pid,
            name: executable.rsplit('/').next().unwrap_or(executable).to_string(),
            executable: executable.to_string(),
        }
    }

    fn unused_store() -> BindingStore {
        BindingStore::new(std::env::temp_dir().join("core_limiter_state_unused.json"))
    }

    #[test]
    fn test_apply_without_selection_does_nothing() {
        let (mut app, affinity) = test_app(unused_store(), HotkeyScope::AnySelection);
        app.apply_selected_limit();

        assert_eq!(app.status_message.as_deref(), Some("No process selected"));
        assert!(app.status_is_error);
        assert!(affinity.applied().is_empty());
    }

    #[test]
    fn test_select_then_apply() {
        let (mut app, affinity) = test_app(unused_store(), HotkeyScope::AnySelection);
        app.select(process(42, "/usr/bin/app"));
        assert_eq!(app.core_usage, "8/8 cores (All cores)");

        app.decrease_cores();
        app.decrease_cores();
        app.apply_selected_limit();

        assert_eq!(affinity.applied(), vec![(42, 6)]);
        assert_eq!(app.core_usage, "6/8 cores (Cores: 0, 1, 2, 3, 4, 5)");
        assert_eq!(app.affinity.query_limit(42).unwrap(), 6);
    }

    #[test]
    fn test_core_choice_stays_in_range() {
        let (mut app, _) = test_app(unused_store(), HotkeyScope::AnySelection);
        assert_eq!(app.core_choice, 8);
        app.increase_cores();
        assert_eq!(app.core_choice, 8);
        for _ in 0..20 {
            app.decrease_cores();
        }
        assert_eq!(app.core_choice, 1);
    }

    #[test]
    fn test_filter_matches_name_or_path() {
        let (mut app, _) = test_app(unused_store(), HotkeyScope::AnySelection);
        app.processes = vec![
            process(1, "/usr/bin/firefox"),
            process(2, "/opt/Game/bin/run"),
            process(3, "/usr/bin/bash"),
        ];
        app.selected_index = 2;

        app.filter = "game".to_string();
        app.apply_filter();
        let pids: Vec<u32> = app.filtered_processes.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![2]);
        assert_eq!(app.selected_index, 0);
    }
}
