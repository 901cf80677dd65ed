//! Command-line argument parsing (manual implementation)

use std::env;
use std::path::PathBuf;
use std::process;

use crate::constants::{
    APP_NAME, APP_VERSION, DEFAULT_BINDINGS_FILE, DEFAULT_LOG_FILE, DEFAULT_TICK_MS, MAX_TICK_MS,
    MIN_TICK_MS,
};

use super::HotkeyScope;

/// Parsed command-line arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// Bindings file location
    pub bindings: PathBuf,
    /// Log file location
    pub log: PathBuf,
    /// UI tick in milliseconds
    pub tick: u64,
    /// Skip the root password prompt
    pub no_elevate: bool,
    /// Which process a fired hotkey may affect
    pub scope: HotkeyScope,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            bindings: PathBuf::from(DEFAULT_BINDINGS_FILE),
            log: PathBuf::from(DEFAULT_LOG_FILE),
            tick: DEFAULT_TICK_MS,
            no_elevate: false,
            scope: HotkeyScope::AnySelection,
        }
    }
}

/// What the command line asks for
#[derive(Debug, PartialEq, Eq)]
enum Invocation {
    Run(Args),
    Help,
    Version,
}

/// Print help message and exit
fn print_help() -> ! {
    println!(
        "{} {}
Pin a running process to its first N CPU cores, with hotkeys per executable.

USAGE:
    {} [OPTIONS]

OPTIONS:
    -b, --bindings <PATH>  Key bindings file [default: {}]
    -l, --log <PATH>       Log file [default: {}]
                           Filter with CORE_LIMITER_LOG (e.g. debug)
    -t, --tick <MS>        UI refresh tick in milliseconds [default: {}]
                           Range: {}-{}
        --scoped-hotkeys   Hotkeys only affect the selected process if it
                           runs the executable they were bound for
        --no-elevate       Do not ask for the root password at startup
    -h, --help             Print help information
    -V, --version          Print version information

EXAMPLES:
    {}                          Start with default settings
    {} -b ~/.core_limiter.json  Use a bindings file in your home directory
    {} --no-elevate -t 250      Run unprivileged with a faster tick

CONTROLS:
    p         Pick a process
    /         Filter the process list
    Left/Right  Choose a core count
    Enter     Apply the core count to the selected process
    a         Bind a key to a core count for the selected executable
    d         Remove the highlighted binding
    ?         Show help overlay
    q         Quit",
        APP_NAME,
        APP_VERSION,
        APP_NAME,
        DEFAULT_BINDINGS_FILE,
        DEFAULT_LOG_FILE,
        DEFAULT_TICK_MS,
        MIN_TICK_MS,
        MAX_TICK_MS,
        APP_NAME,
        APP_NAME,
        APP_NAME
    );
    process::exit(0);
}

/// Print version and exit
fn print_version() -> ! {
    println!("{} {}", APP_NAME, APP_VERSION);
    process::exit(0);
}

/// Print error message and exit
fn print_error(msg: &str) -> ! {
    eprintln!("error: {}", msg);
    eprintln!("For more information, try '--help'");
    process::exit(1);
}

/// Parse tick interval from string
fn parse_tick(s: &str) -> Result<u64, String> {
    match s.parse::<u64>() {
        Ok(ms) if (MIN_TICK_MS..=MAX_TICK_MS).contains(&ms) => Ok(ms),
        Ok(ms) => Err(format!(
            "tick {} is out of range. Must be between {} and {} ms",
            ms, MIN_TICK_MS, MAX_TICK_MS
        )),
        Err(_) => Err(format!("invalid tick '{}'. Must be a number", s)),
    }
}

fn take_value(argv: &mut Vec<String>, name: &str) -> Result<String, String> {
    if argv.is_empty() {
        return Err(format!("{} requires a value", name));
    }
    Ok(argv.remove(0))
}

fn parse(mut argv: Vec<String>) -> Result<Invocation, String> {
    let mut args = Args::default();

    while !argv.is_empty() {
        let arg = argv.remove(0);

        match arg.as_str() {
            "-h" | "--help" => return Ok(Invocation::Help),
            "-V" | "--version" => return Ok(Invocation::Version),
            "--no-elevate" => args.no_elevate = true,
            "--scoped-hotkeys" => args.scope = HotkeyScope::OwningExecutable,

            "-b" | "--bindings" => {
                args.bindings = PathBuf::from(take_value(&mut argv, "--bindings")?);
            }

            "-l" | "--log" => {
                args.log = PathBuf::from(take_value(&mut argv, "--log")?);
            }

            "-t" | "--tick" => {
                args.tick = parse_tick(&take_value(&mut argv, "--tick")?)?;
            }

            // Combined short flags like -hV
            s if s.starts_with('-') && !s.starts_with("--") && s.len() > 2 => {
                for (i, c) in s[1..].chars().enumerate() {
                    argv.insert(i, format!("-{}", c));
                }
            }

            // --key=value
            s if s.starts_with("--") && s.contains('=') => {
                let (key, value) = s.split_once('=').unwrap_or((s, ""));

                match key {
                    "--bindings" => args.bindings = PathBuf::from(value),
                    "--log" => args.log = PathBuf::from(value),
                    "--tick" => args.tick = parse_tick(value)?,
                    _ => return Err(format!("unknown option '{}'", key)),
                }
            }

            s if s.starts_with('-') => {
                return Err(format!("unknown option '{}'", s));
            }

            s => {
                return Err(format!("unexpected argument '{}'", s));
            }
        }
    }

    Ok(Invocation::Run(args))
}

/// Parse command-line arguments, exiting for --help, --version and errors
pub fn parse_args() -> Args {
    match parse(env::args().skip(1).collect()) {
        Ok(Invocation::Run(args)) => args,
        Ok(Invocation::Help) => print_help(),
        Ok(Invocation::Version) => print_version(),
        Err(msg) => print_error(&msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> Result<Args, String> {
        match parse(args.iter().map(|s| s.to_string()).collect())? {
            Invocation::Run(args) => Ok(args),
            other => Err(format!("{:?}", other)),
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(run(&[]).unwrap(), Args::default());
    }

    #[test]
    fn test_value_forms() {
        let args = run(&["-b", "a.json", "--log=x.log", "--tick", "250"]).unwrap();
        assert_eq!(args.bindings, PathBuf::from("a.json"));
        assert_eq!(args.log, PathBuf::from("x.log"));
        assert_eq!(args.tick, 250);

        let args = run(&["--bindings=b.json", "-t", "100"]).unwrap();
        assert_eq!(args.bindings, PathBuf::from("b.json"));
        assert_eq!(args.tick, 100);
    }

    #[test]
    fn test_flags() {
        let args = run(&["--no-elevate", "--scoped-hotkeys"]).unwrap();
        assert!(args.no_elevate);
        assert_eq!(args.scope, HotkeyScope::OwningExecutable);
    }

    #[test]
    fn test_combined_short_flags() {
        assert_eq!(parse(vec!["-Vh".into()]), Ok(Invocation::Version));
        assert_eq!(parse(vec!["-hV".into()]), Ok(Invocation::Help));
    }

    #[test]
    fn test_errors() {
        assert!(run(&["--tick", "50"]).unwrap_err().contains("out of range"));
        assert!(run(&["--tick=fast"]).unwrap_err().contains("Must be a number"));
        assert!(run(&["-b"]).unwrap_err().contains("requires a value"));
        assert!(run(&["--frobnicate"]).unwrap_err().contains("unknown option"));
        assert!(run(&["stray"]).unwrap_err().contains("unexpected argument"));
    }
}
