//! Process picker list rendering

use std::io;

use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
};

use crate::app::App;

use super::utils::{truncate_path, truncate_string};

/// Width of the name column
const NAME_COL_WIDTH: usize = 20;

/// Renders the scrollable process list.
///
/// Highlights the row under the cursor and marks the process that is
/// currently selected for limiting.
pub fn render_process_list(
    stdout: &mut io::Stdout,
    app: &mut App,
    visible_rows: usize,
    width: usize,
) -> io::Result<()> {
    // Adjust scroll offset to keep selection visible
    if app.selected_index < app.scroll_offset {
        app.scroll_offset = app.selected_index;
    } else if app.selected_index >= app.scroll_offset + visible_rows {
        app.scroll_offset = app.selected_index + 1 - visible_rows.max(1);
    }

    let current_pid = app.current_selection().map(|s| s.pid);
    let exe_width = width.saturating_sub(NAME_COL_WIDTH + 14);

    for (i, info) in app
        .filtered_processes
        .iter()
        .skip(app.scroll_offset)
        .take(visible_rows)
        .enumerate()
    {
        let is_cursor = app.scroll_offset + i == app.selected_index;
        let marker = if current_pid == Some(info.pid) { '*' } else { ' ' };

        let line = format!(
            "{}{:>7}  {:<nw$}  {}",
            marker,
            info.pid,
            truncate_string(&info.name, NAME_COL_WIDTH),
            truncate_path(&info.executable, exe_width),
            nw = NAME_COL_WIDTH
        );

        if is_cursor {
            execute!(
                stdout,
                SetBackgroundColor(Color::DarkCyan),
                SetForegroundColor(Color::White),
                Print(format!("{:width$}", line, width = width)),
                ResetColor,
            )?;
        } else {
            execute!(stdout, Print(format!("{:width$}", line, width = width)))?;
        }
        execute!(stdout, Print("\r\n"))?;
    }

    // Fill remaining space
    for _ in app.filtered_processes.len().min(visible_rows)..visible_rows {
        execute!(stdout, Print(format!("{:width$}\r\n", "", width = width)))?;
    }

    Ok(())
}
