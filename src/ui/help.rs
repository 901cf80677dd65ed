//! Help overlay rendering

use std::io::{self, Write};

use crossterm::style::Color;

use crate::constants::{HELP_DIALOG_WIDTH, HELP_KEY_COL_WIDTH};

use super::utils::{dim_background, DialogBox};

/// Help content definition
const HELP_LINES: &[(&str, &str)] = &[
    ("", ""),
    ("MAIN SCREEN", ""),
    ("  p", "Pick a process"),
    ("  Left/Right", "Fewer/more cores"),
    ("  Enter", "Limit selected process"),
    ("  r", "Refresh core usage"),
    ("", ""),
    ("KEY BINDINGS", ""),
    ("  a", "Bind a key for this executable"),
    ("  d/Del", "Remove highlighted binding"),
    ("  Up/Down", "Move through bindings"),
    ("", ""),
    ("PROCESS PICKER", ""),
    ("  Up/Down", "Move selection up/down"),
    ("  PgUp/PgDn", "Scroll by page"),
    ("  Home/End", "Jump to first/last process"),
    ("  /", "Filter by name or path"),
    ("  Enter", "Select process"),
    ("  Esc", "Back to main screen"),
    ("", ""),
    ("OTHER", ""),
    ("  ?", "Show/hide this help"),
    ("  q", "Quit application"),
    ("  Ctrl+C", "Quit application"),
    ("", ""),
    ("Keys above need ctrl or alt to be bound.", ""),
];

/// Renders the help overlay showing all keyboard shortcuts
pub fn render_help_overlay(
    stdout: &mut io::Stdout,
    width: usize,
    height: usize,
) -> io::Result<()> {
    let box_height = (HELP_LINES.len() + 4).min(height.saturating_sub(2));
    let dialog = DialogBox::centered(width, height, HELP_DIALOG_WIDTH, box_height);
    let inner_width = dialog.inner_width();

    dim_background(stdout, width, height)?;

    dialog.top(stdout, 0)?;
    dialog.title(stdout, 1, "Keyboard Shortcuts")?;
    dialog.separator(stdout, 2)?;

    let content_rows = box_height.saturating_sub(4);
    for row in 0..content_rows {
        let y = 3 + row;
        match HELP_LINES.get(row) {
            Some((key, desc)) if desc.is_empty() && !key.is_empty() => {
                // Section header
                dialog.line(stdout, y, &format!(" {}", key), Color::Cyan)?;
            }
            Some((key, desc)) if !desc.is_empty() => {
                let key_col = format!(" {:<kw$}", key, kw = HELP_KEY_COL_WIDTH);
                let desc_width = inner_width.saturating_sub(key_col.chars().count());
                let text = format!("{}{:<dw$}", key_col, desc, dw = desc_width);
                dialog.line(stdout, y, &text, Color::Green)?;
            }
            _ => dialog.line(stdout, y, "", Color::White)?,
        }
    }

    dialog.bottom(stdout, box_height.saturating_sub(1))?;

    stdout.flush()
}
