//! Input/keyboard event handling
//!
//! Each view mode has its own handler. Registered hotkeys are checked
//! first on the main screen and in the picker; prompts and key capture
//! never fire them.

use std::io;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;

use crate::constants::VISIBLE_ROWS_OVERHEAD;
use crate::hotkeys::{from_key_event, Key, KeyCombination, NamedKey};

use super::{App, ViewMode};

/// Result of handling a key event
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Continue running the application
    Continue,
    /// Exit the application
    Exit,
}

/// Characters with a meaning on the main screen or in the picker
const BUILTIN_CHARS: &str = "padqr?/+-=";

/// True if `key` would shadow a control of the main screen or the picker.
///
/// Those handlers ignore shift, so only ctrl, alt or super make a
/// combination safe to bind.
pub(super) fn is_builtin_key(key: &KeyCombination) -> bool {
    let m = key.modifiers;
    if m.ctrl || m.alt || m.super_key {
        return false;
    }
    match key.key {
        Key::Char(c) => BUILTIN_CHARS.contains(c),
        Key::Named(named) => matches!(
            named,
            NamedKey::Enter
                | NamedKey::Esc
                | NamedKey::Delete
                | NamedKey::Up
                | NamedKey::Down
                | NamedKey::Left
                | NamedKey::Right
                | NamedKey::PageUp
                | NamedKey::PageDown
                | NamedKey::Home
                | NamedKey::End
        ),
        Key::F(_) => false,
    }
}

fn page_rows() -> io::Result<usize> {
    let (_, h) = terminal::size()?;
    Ok((h as usize).saturating_sub(VISIBLE_ROWS_OVERHEAD))
}

impl App {
    /// Routes a key event to the handler for the current mode.
    pub fn handle_key(&mut self, event: KeyEvent) -> io::Result<KeyAction> {
        if event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(KeyAction::Exit);
        }

        if self.view_mode.accepts_hotkeys() {
            if let Some(key) = from_key_event(&event) {
                if self.is_terminal_hotkey(&key) {
                    self.dispatch_hotkey(&key);
                    return Ok(KeyAction::Continue);
                }
            }
        }

        match self.view_mode {
            ViewMode::Main => Ok(self.handle_main_key(event.code)),
            ViewMode::ProcessPicker => self.handle_picker_key(event.code),
            ViewMode::FilterInput => Ok(self.handle_filter_key(event.code)),
            ViewMode::CaptureKey => {
                self.capture_key(event);
                Ok(KeyAction::Continue)
            }
            ViewMode::ChooseCores => Ok(self.handle_choose_cores_key(event.code)),
            ViewMode::Help => Ok(self.handle_help_key()),
        }
    }

    /// Handles key events when help overlay is shown
    pub fn handle_help_key(&mut self) -> KeyAction {
        // Any key closes help
        self.view_mode = ViewMode::Main;
        KeyAction::Continue
    }

    /// Handles key events on the main screen.
    pub fn handle_main_key(&mut self, code: KeyCode) -> KeyAction {
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => return KeyAction::Exit,
            KeyCode::Char('p') | KeyCode::Char('P') => self.open_picker(),
            KeyCode::Left | KeyCode::Char('-') => self.decrease_cores(),
            KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => self.increase_cores(),
            KeyCode::Enter => self.apply_selected_limit(),
            KeyCode::Char('a') | KeyCode::Char('A') => self.begin_add_binding(),
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => {
                self.remove_selected_binding()
            }
            KeyCode::Up => self.binding_up(),
            KeyCode::Down => self.binding_down(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.refresh_core_usage(),
            KeyCode::Char('?') => self.view_mode = ViewMode::Help,
            KeyCode::Esc => self.clear_status(),
            _ => {}
        }
        KeyAction::Continue
    }

    /// Handles key events in the process picker.
    pub fn handle_picker_key(&mut self, code: KeyCode) -> io::Result<KeyAction> {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => self.view_mode = ViewMode::Main,
            KeyCode::Enter => self.confirm_process_selection(),
            KeyCode::Char('/') => self.view_mode = ViewMode::FilterInput,
            KeyCode::Char('r') | KeyCode::Char('R') => self.refresh_processes(),
            KeyCode::Char('?') => self.view_mode = ViewMode::Help,
            KeyCode::Up => self.move_up(),
            KeyCode::Down => self.move_down(),
            KeyCode::PageUp => self.page_up(page_rows()?),
            KeyCode::PageDown => self.page_down(page_rows()?),
            KeyCode::Home => self.jump_to_start(),
            KeyCode::End => self.jump_to_end(),
            _ => {}
        }
        Ok(KeyAction::Continue)
    }

    /// Handles key events in filter mode
    pub fn handle_filter_key(&mut self, code: KeyCode) -> KeyAction {
        match code {
            KeyCode::Esc => {
                self.filter.clear();
                self.apply_filter();
                self.view_mode = ViewMode::ProcessPicker;
            }
            KeyCode::Enter => {
                self.view_mode = ViewMode::ProcessPicker;
            }
            KeyCode::Backspace => {
                self.filter.pop();
                self.apply_filter();
            }
            KeyCode::Char(c) => {
                self.filter.push(c);
                self.apply_filter();
            }
            _ => {}
        }
        KeyAction::Continue
    }

    /// Handles key events while choosing the cores of a new binding.
    pub fn handle_choose_cores_key(&mut self, code: KeyCode) -> KeyAction {
        match code {
            KeyCode::Left | KeyCode::Down | KeyCode::Char('-') => self.decrease_pending_cores(),
            KeyCode::Right | KeyCode::Up | KeyCode::Char('+') | KeyCode::Char('=') => {
                self.increase_pending_cores()
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                // Typing a count jumps to it
                if let Some(n) = c.to_digit(10).filter(|n| (1..=self.total_cores).contains(n)) {
                    self.pending_cores = n;
                }
            }
            KeyCode::Enter => self.confirm_binding(),
            KeyCode::Esc => self.cancel_binding(),
            _ => {}
        }
        KeyAction::Continue
    }
}
