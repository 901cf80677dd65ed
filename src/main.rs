//! CPU Core Limiter
//!
//! A terminal tool that restricts a running process to a chosen number of
//! CPU cores, with per-executable key bindings that re-apply a limit on
//! demand. Bindings are saved between runs.
//!
//! Controls:
//! - p: Pick a process
//! - ←/→: Choose the number of cores
//! - Enter: Apply the limit to the selected process
//! - a: Bind a key combination for the selected executable
//! - d: Remove the highlighted binding
//! - ?: Help
//! - q: Quit

mod app;
mod bindings;
mod constants;
#[cfg(windows)]
mod ffi;
mod hotkeys;
mod logging;
mod system;
mod ui;

use std::io;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, DisableLineWrap, EnableLineWrap, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{info, warn};

use app::{parse_args, App, KeyAction};
use hotkeys::{HotkeyBackend, HotkeyRegistrar, HotkeyTable, TerminalBackend};
use system::admin::{platform_elevation, Elevation};
use system::error::ElevationError;
use system::SystemAffinity;
use ui::{render, render_password_prompt};

fn enter_screen(stdout: &mut io::Stdout) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, DisableLineWrap, Hide)
}

fn leave_screen(stdout: &mut io::Stdout) -> io::Result<()> {
    execute!(stdout, Show, EnableLineWrap, LeaveAlternateScreen)?;
    terminal::disable_raw_mode()
}

/// Reads a password with only its length echoed.
///
/// Returns `None` if the user cancels.
fn prompt_password(stdout: &mut io::Stdout) -> io::Result<Option<String>> {
    let mut password = String::new();
    loop {
        let (width, height) = terminal::size()?;
        render_password_prompt(stdout, width as usize, height as usize, password.chars().count())?;

        if let Event::Key(key_event) = event::read()? {
            if key_event.kind != KeyEventKind::Press {
                continue;
            }
            match key_event.code {
                KeyCode::Esc => return Ok(None),
                KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(None)
                }
                KeyCode::Enter => return Ok(Some(password)),
                KeyCode::Backspace => {
                    password.pop();
                }
                KeyCode::Char(c) => password.push(c),
                _ => {}
            }
        }
    }
}

/// Asks for a password and restarts the program with root rights.
///
/// Only returns when no elevation was needed or possible.
fn elevate(stdout: &mut io::Stdout, elevation: &dyn Elevation) -> io::Result<()> {
    enter_screen(stdout)?;
    let password = prompt_password(stdout);
    leave_screen(stdout)?;

    let result: Result<(), ElevationError> = match password? {
        None => Err(ElevationError::Cancelled),
        Some(password) => elevation.request_elevation(&password).map(|never| match never {}),
    };

    if let Err(err) = result {
        warn!(%err, "elevation failed");
        eprintln!("{}", err);
        process::exit(1);
    }
    Ok(())
}

fn hotkey_backend(table: &Arc<HotkeyTable>) -> Box<dyn HotkeyBackend> {
    #[cfg(feature = "global-hotkeys")]
    {
        match hotkeys::GlobalBackend::start(Arc::clone(table)) {
            Ok(backend) => return Box::new(backend),
            Err(err) => warn!(%err, "global hotkeys unavailable, using terminal keys"),
        }
    }
    #[cfg(not(feature = "global-hotkeys"))]
    let _ = table;

    Box::new(TerminalBackend)
}

fn main() -> io::Result<()> {
    let args = parse_args();

    if let Err(err) = logging::init(&args.log) {
        eprintln!("Warning: cannot open log file {}: {}", args.log.display(), err);
    }

    let mut stdout = io::stdout();

    let elevation = platform_elevation();
    if !args.no_elevate && !elevation.is_elevated() && elevation.can_elevate() {
        elevate(&mut stdout, elevation.as_ref())?;
    }
    let elevated = elevation.is_elevated();
    info!(elevated, "starting");

    let table = HotkeyTable::new();
    let registrar = HotkeyRegistrar::new(Arc::clone(&table), hotkey_backend(&table));

    let mut app = App::with_args(&args, registrar, Arc::new(SystemAffinity));
    app.load_bindings();

    enter_screen(&mut stdout)?;

    let result = run(&mut stdout, &mut app, elevated);

    leave_screen(&mut stdout)?;
    info!("exiting");
    result
}

fn run(stdout: &mut io::Stdout, app: &mut App, elevated: bool) -> io::Result<()> {
    let tick = Duration::from_millis(app.tick_ms);

    loop {
        render(stdout, app, elevated)?;

        if event::poll(tick)? {
            if let Event::Key(key_event) = event::read()? {
                // Only handle key PRESS events, ignore Release and Repeat
                if key_event.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key_event)? == KeyAction::Exit {
                    return Ok(());
                }
            }
        } else {
            app.tick();
        }
    }
}
