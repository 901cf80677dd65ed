//! User interface rendering
//!
//! This module provides all terminal UI rendering functionality:
//! - `render` - Main rendering entry point
//! - `components` - Header, selection panel, filter bar, column headers, footer
//! - `process_list` - Process picker rendering
//! - `dialogs` - Key binding dialogs and the password prompt
//! - `help` - Help overlay
//! - `utils` - Shared utilities

mod components;
mod dialogs;
mod help;
mod process_list;
mod render;
mod utils;

pub use dialogs::render_password_prompt;
pub use render::render;
