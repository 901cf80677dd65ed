//! Terminal rendering logic

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::app::{App, ViewMode};
use crate::constants::VISIBLE_ROWS_OVERHEAD;

use super::components::{
    render_column_headers, render_filter_bar, render_footer, render_header,
    render_selection_panel, render_store_path,
};
use super::dialogs::{render_capture_dialog, render_cores_dialog};
use super::help::render_help_overlay;
use super::process_list::render_process_list;

/// Header, bindings file line and the two footer lines
const MAIN_SCREEN_OVERHEAD: usize = 4;

/// Renders the UI to the terminal
pub fn render(stdout: &mut io::Stdout, app: &mut App, elevated: bool) -> io::Result<()> {
    let (width, height) = terminal::size()?;
    let width = width as usize;
    let height = height as usize;

    // Clear and move to top
    execute!(stdout, MoveTo(0, 0), Clear(ClearType::All))?;

    render_header(stdout, app, elevated, width)?;

    if app.view_mode.shows_picker() {
        render_picker(stdout, app, width, height)?;
    } else {
        render_main(stdout, app, width, height)?;
    }

    match app.view_mode {
        ViewMode::Help => render_help_overlay(stdout, width, height)?,
        ViewMode::CaptureKey => render_capture_dialog(stdout, app, width, height)?,
        ViewMode::ChooseCores => render_cores_dialog(stdout, app, width, height)?,
        _ => {}
    }

    stdout.flush()
}

fn render_main(stdout: &mut io::Stdout, app: &App, width: usize, height: usize) -> io::Result<()> {
    let rows = height.saturating_sub(MAIN_SCREEN_OVERHEAD);
    let drawn = render_selection_panel(stdout, app, rows, width)?;

    for _ in drawn..rows {
        execute!(stdout, Print(format!("{:width$}\r\n", "", width = width)))?;
    }

    render_store_path(stdout, app, width)?;
    render_footer(stdout, app, width)
}

fn render_picker(
    stdout: &mut io::Stdout,
    app: &mut App,
    width: usize,
    height: usize,
) -> io::Result<()> {
    execute!(
        stdout,
        SetForegroundColor(Color::DarkGrey),
        Print(format!(
            "{:width$}",
            " Choose the process to limit (* marks the current selection)",
            width = width
        )),
        ResetColor,
        Print("\r\n")
    )?;
    render_filter_bar(stdout, app, width)?;
    render_column_headers(stdout, width)?;

    let visible_rows = height.saturating_sub(VISIBLE_ROWS_OVERHEAD);
    render_process_list(stdout, app, visible_rows, width)?;

    render_footer(stdout, app, width)
}
