//! Application state and logic
//!
//! - `state` - The `App` struct: selection, core choice and status line
//! - `binding_ops` - Adding, removing and loading key bindings
//! - `hotkey_scope` - The callback a fired hotkey runs
//! - `input` - Keyboard handling per view mode
//! - `cli` - Command-line arguments

mod binding_ops;
pub mod cli;
mod hotkey_scope;
mod input;
mod navigation;
mod selection;
mod state;
mod view_mode;

pub use cli::parse_args;
pub use hotkey_scope::{HotkeyScope, Notice};
pub use input::KeyAction;
pub use selection::{Selection, SharedSelection};
pub use state::App;
pub use view_mode::ViewMode;
