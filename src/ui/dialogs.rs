//! Key binding dialogs and the password prompt

use std::io::{self, Write};

use crossterm::style::Color;

use crate::app::App;
use crate::constants::{BINDING_DIALOG_WIDTH, PROMPT_DIALOG_WIDTH};

use super::utils::{dim_background, truncate_path, DialogBox};

/// Cores drawn per row of the core grid
const CORES_PER_ROW: usize = 4;

fn binding_target(app: &App) -> String {
    app.current_selection()
        .map(|s| s.executable.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Asks for the key combination of a new binding.
pub fn render_capture_dialog(
    stdout: &mut io::Stdout,
    app: &App,
    width: usize,
    height: usize,
) -> io::Result<()> {
    let box_height = 8;
    let dialog = DialogBox::centered(width, height, BINDING_DIALOG_WIDTH, box_height);
    let inner_width = dialog.inner_width();

    dim_background(stdout, width, height)?;

    dialog.top(stdout, 0)?;
    dialog.title(stdout, 1, "New Key Binding")?;
    dialog.separator(stdout, 2)?;
    dialog.line(stdout, 3, " Press the key combination for", Color::White)?;
    dialog.line(
        stdout,
        4,
        &format!(" {}", truncate_path(&binding_target(app), inner_width - 2)),
        Color::Cyan,
    )?;
    dialog.line(stdout, 5, "", Color::White)?;
    dialog.line(stdout, 6, " Esc: Cancel", Color::DarkGrey)?;
    dialog.bottom(stdout, box_height - 1)?;

    stdout.flush()
}

/// Lets the user pick how many cores the new binding limits to.
pub fn render_cores_dialog(
    stdout: &mut io::Stdout,
    app: &App,
    width: usize,
    height: usize,
) -> io::Result<()> {
    let total_cores = app.total_cores as usize;
    let rows = total_cores.div_ceil(CORES_PER_ROW);
    let box_height = rows + 9;
    let dialog = DialogBox::centered(width, height, BINDING_DIALOG_WIDTH, box_height);
    let inner_width = dialog.inner_width();

    dim_background(stdout, width, height)?;

    let key = app
        .pending_key
        .map(|k| k.to_string())
        .unwrap_or_else(|| "?".to_string());

    dialog.top(stdout, 0)?;
    dialog.title(stdout, 1, &format!("Cores for {}", key))?;
    dialog.separator(stdout, 2)?;
    dialog.line(
        stdout,
        3,
        &format!(" {}", truncate_path(&binding_target(app), inner_width - 2)),
        Color::Cyan,
    )?;
    dialog.line(stdout, 4, "", Color::White)?;

    let pending = app.pending_cores as usize;
    for row in 0..rows {
        let mut line = String::from(" ");
        for core in (row * CORES_PER_ROW)..((row + 1) * CORES_PER_ROW).min(total_cores) {
            let mark = if core < pending { "X" } else { " " };
            line.push_str(&format!("[{}] Core {:<4} ", mark, core));
        }
        dialog.line(stdout, 5 + row, &line, Color::Green)?;
    }

    let y = 5 + rows;
    dialog.line(stdout, y, "", Color::White)?;
    dialog.line(
        stdout,
        y + 1,
        &format!(" {} of {} cores", app.pending_cores, app.total_cores),
        Color::Yellow,
    )?;
    dialog.line(
        stdout,
        y + 2,
        " Left/Right or digit: Change | Enter: Save | Esc: Cancel",
        Color::DarkGrey,
    )?;
    dialog.bottom(stdout, y + 3)?;

    stdout.flush()
}

/// Asks for the password used to restart with elevated rights.
///
/// Only the length of what was typed is shown.
pub fn render_password_prompt(
    stdout: &mut io::Stdout,
    width: usize,
    height: usize,
    masked_len: usize,
) -> io::Result<()> {
    let box_height = 8;
    let dialog = DialogBox::centered(width, height, PROMPT_DIALOG_WIDTH, box_height);
    let inner_width = dialog.inner_width();

    dim_background(stdout, width, height)?;

    dialog.top(stdout, 0)?;
    dialog.title(stdout, 1, "Administrator Rights Required")?;
    dialog.separator(stdout, 2)?;
    dialog.line(stdout, 3, " Changing other users' processes needs", Color::White)?;
    dialog.line(stdout, 4, " elevated rights. Enter your password:", Color::White)?;

    let stars = "*".repeat(masked_len.min(inner_width.saturating_sub(3)));
    dialog.line(stdout, 5, &format!(" {}█", stars), Color::Yellow)?;

    dialog.line(stdout, 6, " Enter: Continue | Esc: Cancel", Color::DarkGrey)?;
    dialog.bottom(stdout, 7)?;

    stdout.flush()
}
