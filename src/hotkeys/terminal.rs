//! Hotkeys delivered by the terminal
//!
//! The UI loop already reads every key event; this backend has nothing to
//! install and relies on the loop to translate events with
//! [`from_key_event`] and dispatch them.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::system::error::HotkeyResult;

use super::{HotkeyBackend, Key, KeyCombination, Modifiers, NamedKey};

/// Backend for combinations pressed while the terminal has focus.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBackend;

impl HotkeyBackend for TerminalBackend {
    fn name(&self) -> &'static str {
        "terminal"
    }

    fn activate(&mut self, _key: &KeyCombination) -> HotkeyResult<()> {
        Ok(())
    }

    fn deactivate(&mut self, _key: &KeyCombination) -> HotkeyResult<()> {
        Ok(())
    }

    fn reads_terminal_input(&self) -> bool {
        true
    }
}

/// Translates a terminal key event into a combination.
///
/// Returns `None` for keys that cannot be bound (media keys, bare
/// modifiers, ...). Shift is folded into printable symbols because the
/// terminal already reports the shifted character (`!` rather than
/// `shift+1`); for letters it is kept so `shift+a` stays distinct from `a`.
pub fn from_key_event(event: &KeyEvent) -> Option<KeyCombination> {
    let mut modifiers = Modifiers {
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
        alt: event.modifiers.contains(KeyModifiers::ALT),
        shift: event.modifiers.contains(KeyModifiers::SHIFT),
        super_key: event.modifiers.contains(KeyModifiers::SUPER),
    };

    let key = match event.code {
        KeyCode::Char(' ') => Key::Named(NamedKey::Space),
        KeyCode::Char(c) => {
            if c.is_alphabetic() {
                modifiers.shift |= c.is_uppercase();
            } else {
                modifiers.shift = false;
            }
            Key::Char(c)
        }
        KeyCode::F(n) if (1..=24).contains(&n) => Key::F(n),
        KeyCode::Enter => Key::Named(NamedKey::Enter),
        KeyCode::Tab => Key::Named(NamedKey::Tab),
        KeyCode::BackTab => {
            modifiers.shift = true;
            Key::Named(NamedKey::Tab)
        }
        KeyCode::Esc => Key::Named(NamedKey::Esc),
        KeyCode::Backspace => Key::Named(NamedKey::Backspace),
        KeyCode::Delete => Key::Named(NamedKey::Delete),
        KeyCode::Insert => Key::Named(NamedKey::Insert),
        KeyCode::Home => Key::Named(NamedKey::Home),
        KeyCode::End => Key::Named(NamedKey::End),
        KeyCode::PageUp => Key::Named(NamedKey::PageUp),
        KeyCode::PageDown => Key::Named(NamedKey::PageDown),
        KeyCode::Up => Key::Named(NamedKey::Up),
        KeyCode::Down => Key::Named(NamedKey::Down),
        KeyCode::Left => Key::Named(NamedKey::Left),
        KeyCode::Right => Key::Named(NamedKey::Right),
        _ => return None,
    };

    Some(KeyCombination::new(modifiers, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_ctrl_digit() {
        let combo = from_key_event(&event(KeyCode::Char('1'), KeyModifiers::CONTROL)).unwrap();
        assert_eq!(combo, KeyCombination::parse("ctrl+1").unwrap());
    }

    #[test]
    fn test_uppercase_letter_means_shift() {
        let combo = from_key_event(&event(KeyCode::Char('A'), KeyModifiers::NONE)).unwrap();
        assert_eq!(combo.to_string(), "shift+a");
    }

    #[test]
    fn test_shifted_symbol_drops_shift() {
        let combo = from_key_event(&event(KeyCode::Char('!'), KeyModifiers::SHIFT)).unwrap();
        assert_eq!(combo.to_string(), "!");
    }

    #[test]
    fn test_named_keys() {
        let combo = from_key_event(&event(KeyCode::F(5), KeyModifiers::ALT)).unwrap();
        assert_eq!(combo.to_string(), "alt+f5");
        let combo = from_key_event(&event(KeyCode::BackTab, KeyModifiers::NONE)).unwrap();
        assert_eq!(combo.to_string(), "shift+tab");
        assert!(from_key_event(&event(KeyCode::CapsLock, KeyModifiers::NONE)).is_none());
    }
}
