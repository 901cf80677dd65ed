//! Key combination parsing and formatting
//!
//! A combination is zero or more modifiers plus exactly one key. The text
//! form is lowercase, `+`-separated, modifiers first in a fixed order:
//! `ctrl+alt+shift+super+<key>`. Spaces are accepted as separators so that
//! `"Ctrl 1"` and `"ctrl+1"` name the same combination.

use std::fmt;
use std::str::FromStr;

use crate::system::error::{HotkeyError, HotkeyResult};

/// Modifier keys held together with the main key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub super_key: bool,
}

impl Modifiers {
    /// No modifiers held
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        super_key: false,
    };
}

/// Non-character keys that can be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamedKey {
    Space,
    Enter,
    Tab,
    Esc,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
}

impl NamedKey {
    const ALL: [NamedKey; 15] = [
        NamedKey::Space,
        NamedKey::Enter,
        NamedKey::Tab,
        NamedKey::Esc,
        NamedKey::Backspace,
        NamedKey::Delete,
        NamedKey::Insert,
        NamedKey::Home,
        NamedKey::End,
        NamedKey::PageUp,
        NamedKey::PageDown,
        NamedKey::Up,
        NamedKey::Down,
        NamedKey::Left,
        NamedKey::Right,
    ];

    /// Canonical lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            NamedKey::Space => "space",
            NamedKey::Enter => "enter",
            NamedKey::Tab => "tab",
            NamedKey::Esc => "esc",
            NamedKey::Backspace => "backspace",
            NamedKey::Delete => "delete",
            NamedKey::Insert => "insert",
            NamedKey::Home => "home",
            NamedKey::End => "end",
            NamedKey::PageUp => "pageup",
            NamedKey::PageDown => "pagedown",
            NamedKey::Up => "up",
            NamedKey::Down => "down",
            NamedKey::Left => "left",
            NamedKey::Right => "right",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        let canonical = match name {
            "escape" => "esc",
            "return" => "enter",
            "del" => "delete",
            "ins" => "insert",
            "pgup" | "page_up" => "pageup",
            "pgdn" | "pgdown" | "page_down" => "pagedown",
            "arrowup" => "up",
            "arrowdown" => "down",
            "arrowleft" => "left",
            "arrowright" => "right",
            other => other,
        };
        Self::ALL.iter().copied().find(|key| key.name() == canonical)
    }
}

/// The main (non-modifier) key of a combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// A printable character, stored lowercase
    Char(char),
    /// Function key F1..F24
    F(u8),
    /// A named key
    Named(NamedKey),
}

impl Key {
    fn parse(token: &str) -> Option<Self> {
        if token == "plus" {
            return Some(Key::Char('+'));
        }

        let mut chars = token.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(Key::Char(c));
        }

        if let Some(n) = token.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
            if (1..=24).contains(&n) {
                return Some(Key::F(n));
            }
        }

        NamedKey::from_name(token).map(Key::Named)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char('+') => write!(f, "plus"),
            Key::Char(c) => write!(f, "{}", c),
            Key::F(n) => write!(f, "f{}", n),
            Key::Named(key) => write!(f, "{}", key.name()),
        }
    }
}

/// A normalised key combination, e.g. `ctrl+shift+f5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCombination {
    pub modifiers: Modifiers,
    pub key: Key,
}

impl KeyCombination {
    /// Creates a combination from parts. Character keys are lowercased.
    pub fn new(modifiers: Modifiers, key: Key) -> Self {
        let key = match key {
            Key::Char(c) => Key::Char(c.to_lowercase().next().unwrap_or(c)),
            other => other,
        };
        Self { modifiers, key }
    }

    /// Parses text such as `"Ctrl+1"`, `"ctrl 1"` or `"alt+shift+F4"`.
    pub fn parse(input: &str) -> HotkeyResult<Self> {
        let invalid = |reason: &'static str| HotkeyError::InvalidKey {
            input: input.to_string(),
            reason,
        };

        let normalized = input.trim().to_lowercase().replace(' ', "+");
        if normalized.is_empty() {
            return Err(invalid("empty key combination"));
        }

        // A trailing "++" means the key itself is '+'
        let (body, plus_key) = match normalized.strip_suffix("++") {
            Some(rest) => (rest, true),
            None if normalized == "+" => ("", true),
            None => (normalized.as_str(), false),
        };

        let mut modifiers = Modifiers::NONE;
        let mut key = plus_key.then_some(Key::Char('+'));

        for token in body.split('+').filter(|t| !t.is_empty()) {
            match token {
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "super" | "meta" | "cmd" | "command" | "win" => modifiers.super_key = true,
                other => {
                    if key.is_some() {
                        return Err(invalid("more than one non-modifier key"));
                    }
                    key = Some(Key::parse(other).ok_or_else(|| invalid("unknown key name"))?);
                }
            }
        }

        match key {
            Some(key) => Ok(Self::new(modifiers, key)),
            None => Err(invalid("missing key")),
        }
    }
}

impl FromStr for KeyCombination {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.modifiers;
        for (held, name) in [
            (m.ctrl, "ctrl"),
            (m.alt, "alt"),
            (m.shift, "shift"),
            (m.super_key, "super"),
        ] {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        write!(f, "{}", self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combo(s: &str) -> KeyCombination {
        KeyCombination::parse(s).unwrap()
    }

    #[test]
    fn test_parse_simple() {
        let c = combo("ctrl+1");
        assert!(c.modifiers.ctrl);
        assert_eq!(c.key, Key::Char('1'));
        assert_eq!(c.to_string(), "ctrl+1");
    }

    #[test]
    fn test_parse_is_case_and_separator_insensitive() {
        assert_eq!(combo("Ctrl 1"), combo("ctrl+1"));
        assert_eq!(combo("SHIFT+Alt+A"), combo("alt+shift+a"));
        assert_eq!(combo("shift+alt+a").to_string(), "alt+shift+a");
    }

    #[test]
    fn test_parse_named_and_function_keys() {
        assert_eq!(combo("ctrl+PgUp").key, Key::Named(NamedKey::PageUp));
        assert_eq!(combo("escape").key, Key::Named(NamedKey::Esc));
        assert_eq!(combo("super+F12").to_string(), "super+f12");
        assert!(KeyCombination::parse("f25").is_err());
    }

    #[test]
    fn test_parse_plus_key() {
        assert_eq!(combo("ctrl++").key, Key::Char('+'));
        assert_eq!(combo("ctrl+plus"), combo("ctrl++"));
        assert_eq!(combo("ctrl++").to_string(), "ctrl+plus");
    }

    #[test]
    fn test_display_round_trips() {
        for text in ["ctrl+alt+shift+super+x", "f1", "alt+space", "ctrl+plus"] {
            assert_eq!(combo(text).to_string(), text);
            assert_eq!(combo(&combo(text).to_string()), combo(text));
        }
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "   ", "ctrl", "ctrl+a+b", "ctrl+nosuchkey"] {
            let err = KeyCombination::parse(bad).unwrap_err();
            assert!(matches!(err, HotkeyError::InvalidKey { .. }), "{:?}", bad);
        }
    }
}
