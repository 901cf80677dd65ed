//! Header, selection panel, filter bar, column headers, and footer components

use std::io;

use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
};

use crate::app::{App, ViewMode};
use crate::constants::DISPLAY_NAME;
use crate::system::admin::elevation_indicator;

use super::utils::{truncate_path, truncate_string};

/// Renders the application header with privilege indicator.
///
/// Shows the title, which hotkey backend is active and whether the
/// program runs with root/Administrator rights.
pub fn render_header(
    stdout: &mut io::Stdout,
    app: &App,
    elevated: bool,
    width: usize,
) -> io::Result<()> {
    let indicator = elevation_indicator(elevated);
    let indicator_color = if elevated { Color::Green } else { Color::Yellow };

    let title = format!(
        " {}  |  hotkeys: {}, {}",
        DISPLAY_NAME,
        app.hotkey_backend(),
        app.scope.label()
    );
    let title = truncate_string(&title, width.saturating_sub(indicator.len() + 2));
    let spacing = width.saturating_sub(title.chars().count() + indicator.len() + 1);

    execute!(
        stdout,
        SetBackgroundColor(Color::DarkBlue),
        SetForegroundColor(Color::White),
        Print(&title),
        Print(format!("{:spacing$}", "", spacing = spacing)),
        SetForegroundColor(indicator_color),
        Print(indicator),
        Print(" "),
        ResetColor,
        Print("\r\n")
    )
}

fn panel_line(stdout: &mut io::Stdout, text: &str, fg: Color, width: usize) -> io::Result<()> {
    execute!(
        stdout,
        SetForegroundColor(fg),
        Print(format!("{:width$}", truncate_string(text, width), width = width)),
        ResetColor,
        Print("\r\n")
    )
}

/// Renders the selected process, the core chooser and its key bindings.
///
/// Returns the number of lines drawn.
pub fn render_selection_panel(
    stdout: &mut io::Stdout,
    app: &App,
    rows: usize,
    width: usize,
) -> io::Result<usize> {
    let mut drawn = 0;

    match app.current_selection() {
        Some(sel) => {
            let exe = truncate_path(&sel.executable, width.saturating_sub(24));
            panel_line(
                stdout,
                &format!(" Selected PID: {} ({})", sel.pid, exe),
                Color::White,
                width,
            )?;
        }
        None => panel_line(stdout, " No application selected (press p)", Color::DarkGrey, width)?,
    }
    panel_line(
        stdout,
        &format!(" Current CPU core usage: {}", app.core_usage),
        Color::Cyan,
        width,
    )?;
    execute!(
        stdout,
        Print(" Limit to: "),
        SetForegroundColor(Color::Yellow),
        Print(format!("< {} / {} >", app.core_choice, app.total_cores)),
        ResetColor,
        Print(format!(
            "{:w$}\r\n",
            "  cores (Enter applies)",
            w = width.saturating_sub(20)
        ))
    )?;
    panel_line(stdout, "", Color::White, width)?;
    drawn += 4;

    let bindings = app.selected_bindings();
    execute!(
        stdout,
        SetBackgroundColor(Color::DarkGrey),
        SetForegroundColor(Color::White),
        Print(format!(
            "{:width$}",
            format!(" Key bindings ({})", bindings.len()),
            width = width
        )),
        ResetColor,
        Print("\r\n")
    )?;
    drawn += 1;

    let list_rows = rows.saturating_sub(drawn + 1);
    if bindings.is_empty() {
        panel_line(stdout, "   none (press a to add)", Color::DarkGrey, width)?;
        drawn += 1;
    }
    let first = app.binding_index.saturating_sub(list_rows.saturating_sub(1));
    for (i, binding) in bindings.iter().enumerate().skip(first).take(list_rows) {
        let line = format!("   {:<24} {} cores", binding.key.to_string(), binding.cores);
        if i == app.binding_index {
            execute!(
                stdout,
                SetBackgroundColor(Color::DarkCyan),
                SetForegroundColor(Color::White),
                Print(format!("{:width$}", truncate_string(&line, width), width = width)),
                ResetColor,
                Print("\r\n")
            )?;
        } else {
            panel_line(stdout, &line, Color::Green, width)?;
        }
        drawn += 1;
    }

    Ok(drawn)
}

/// Renders the path of the bindings file.
pub fn render_store_path(stdout: &mut io::Stdout, app: &App, width: usize) -> io::Result<()> {
    let path = app.bindings_path().display().to_string();
    panel_line(
        stdout,
        &format!(" Bindings file: {}", truncate_path(&path, width.saturating_sub(17))),
        Color::DarkGrey,
        width,
    )
}

/// Renders the filter bar when active or showing current filter.
///
/// In filter mode, displays an input field with cursor.
/// Otherwise, shows the current filter value if set.
pub fn render_filter_bar(stdout: &mut io::Stdout, app: &App, width: usize) -> io::Result<()> {
    if app.view_mode == ViewMode::FilterInput {
        execute!(
            stdout,
            SetBackgroundColor(Color::DarkYellow),
            SetForegroundColor(Color::Black),
            Print(format!(
                " Filter: {}█{:width$}",
                app.filter,
                "",
                width = width.saturating_sub(app.filter.chars().count() + 10)
            )),
            ResetColor,
            Print("\r\n")
        )
    } else if !app.filter.is_empty() {
        execute!(
            stdout,
            SetForegroundColor(Color::Yellow),
            Print(format!(
                " Filter: \"{}\" ({}/{}, press / to edit)",
                app.filter,
                app.filtered_processes.len(),
                app.processes.len()
            )),
            ResetColor,
            Print("\r\n")
        )
    } else {
        execute!(
            stdout,
            SetForegroundColor(Color::Cyan),
            Print(format!(" Processes: {}", app.processes.len())),
            ResetColor,
            Print("\r\n")
        )
    }
}

/// Renders the column headers for the process picker.
pub fn render_column_headers(stdout: &mut io::Stdout, width: usize) -> io::Result<()> {
    let header = format!(" {:>7}  {:<20}  {}", "PID", "Name", "Executable");
    execute!(
        stdout,
        SetBackgroundColor(Color::DarkGrey),
        SetForegroundColor(Color::White),
        Print(format!("{:width$}", header, width = width)),
        ResetColor,
        Print("\r\n")
    )
}

/// Renders the footer with status/error messages and help hints.
pub fn render_footer(stdout: &mut io::Stdout, app: &App, width: usize) -> io::Result<()> {
    match app.status_message {
        Some(ref msg) => {
            let color = if app.status_is_error {
                Color::Red
            } else {
                Color::Yellow
            };
            execute!(
                stdout,
                SetForegroundColor(color),
                Print(format!(
                    "{:width$}",
                    format!(" {}", truncate_string(msg, width.saturating_sub(2))),
                    width = width
                )),
                ResetColor,
                Print("\r\n")
            )?;
        }
        None => execute!(stdout, Print(format!("{:width$}\r\n", "", width = width)))?,
    }

    let (help_line, background, foreground) = match app.view_mode {
        ViewMode::FilterInput => (
            " Type to filter | Enter:Apply | Esc:Clear",
            Color::DarkYellow,
            Color::Black,
        ),
        ViewMode::ProcessPicker => (
            " Enter:Select | /:Filter | r:Refresh | Esc:Back | ?:Help",
            Color::DarkBlue,
            Color::White,
        ),
        _ => (
            " ?:Help | q:Quit | p:Pick | </>:Cores | Enter:Apply | a:Bind | d:Unbind",
            Color::DarkBlue,
            Color::White,
        ),
    };
    execute!(
        stdout,
        SetBackgroundColor(background),
        SetForegroundColor(foreground),
        Print(format!("{:width$}", truncate_string(help_line, width), width = width)),
        ResetColor,
    )
}
