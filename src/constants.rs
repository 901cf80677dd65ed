//! Centralized constants for the application
//!
//! This module contains the defaults and limits used throughout the
//! application, making them easy to find and modify.

// ============================================================================
// Application Info
// ============================================================================

/// Application name displayed in header
pub const DISPLAY_NAME: &str = "CPU Core Limiter";

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Application version from Cargo.toml
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Files
// ============================================================================

/// Default location of the persisted key bindings (relative to the working directory)
pub const DEFAULT_BINDINGS_FILE: &str = "keybindings.json";

/// Default log file (relative to the working directory)
pub const DEFAULT_LOG_FILE: &str = "core_limiter.log";

/// Environment variable holding the log filter directive
pub const LOG_FILTER_ENV: &str = "CORE_LIMITER_LOG";

/// Version tag written into the bindings file
pub const BINDINGS_FORMAT_VERSION: u32 = 1;

/// Suffix given to a bindings file that failed to parse
pub const CORRUPT_FILE_SUFFIX: &str = "corrupt";

// ============================================================================
// UI Tick (milliseconds)
// ============================================================================

/// Default interval between UI ticks (status refresh, notifications)
pub const DEFAULT_TICK_MS: u64 = 500;

/// Minimum allowed tick interval
pub const MIN_TICK_MS: u64 = 100;

/// Maximum allowed tick interval
pub const MAX_TICK_MS: u64 = 5000;

// ============================================================================
// Navigation
// ============================================================================

/// Lines subtracted from terminal height to calculate visible rows in the
/// process picker (accounts for header, filter bar, footer, etc.)
pub const VISIBLE_ROWS_OVERHEAD: usize = 6;

// ============================================================================
// UI Dialog Dimensions
// ============================================================================

/// Width of the help dialog box
pub const HELP_DIALOG_WIDTH: usize = 52;

/// Width of the key binding dialog box
pub const BINDING_DIALOG_WIDTH: usize = 56;

/// Width of the password prompt box
pub const PROMPT_DIALOG_WIDTH: usize = 50;

/// Minimum margin from screen edge for dialogs
pub const DIALOG_MARGIN: usize = 4;

/// Width of the key column in help dialog
pub const HELP_KEY_COL_WIDTH: usize = 14;
