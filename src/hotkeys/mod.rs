//! Hotkeys - key combinations that re-apply a core limit on demand
//!
//! - `combo` - Parsing and normalising key combinations such as `ctrl+1`
//! - `registrar` - The table of active combinations and their callbacks
//! - `terminal` - Delivery of combinations from the terminal's key events
//! - `global` - System-wide delivery (feature `global-hotkeys`)

mod combo;
#[cfg(feature = "global-hotkeys")]
mod global;
mod registrar;
mod terminal;

pub use combo::{Key, KeyCombination, Modifiers, NamedKey};
#[cfg(feature = "global-hotkeys")]
pub use global::GlobalBackend;
pub use registrar::{HotkeyBackend, HotkeyCallback, HotkeyRegistrar, HotkeyTable};
pub use terminal::{from_key_event, TerminalBackend};
