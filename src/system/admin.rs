//! Privilege detection and elevation
//!
//! Changing another user's process affinity needs root on Linux. At startup
//! the program checks whether it is elevated and, where the platform allows,
//! asks for a password and relaunches itself under `sudo`.

use std::convert::Infallible;

use super::error::ElevationResult;

/// Platform privilege checks.
pub trait Elevation {
    /// True if the current process holds administrative privileges
    fn is_elevated(&self) -> bool;

    /// True if [`Elevation::request_elevation`] can do anything here
    fn can_elevate(&self) -> bool;

    /// Relaunches the program with elevated privileges.
    ///
    /// Only returns on failure; on success the current process is replaced.
    fn request_elevation(&self, credential: &str) -> ElevationResult<Infallible>;
}

#[cfg(unix)]
pub use sudo::SudoElevation;

#[cfg(unix)]
mod sudo {
    use std::convert::Infallible;
    use std::env;
    use std::io::{self, Write};
    use std::os::unix::process::CommandExt;
    use std::process::{Command, Stdio};

    use super::Elevation;
    use crate::system::error::{ElevationError, ElevationResult};

    /// Elevation through `sudo`.
    #[derive(Debug, Clone)]
    pub struct SudoElevation {
        program: String,
    }

    impl Default for SudoElevation {
        fn default() -> Self {
            Self::with_program("sudo")
        }
    }

    impl SudoElevation {
        /// Uses `program` in place of `sudo`; it must accept sudo's `-S -p`
        /// arguments.
        pub fn with_program(program: impl Into<String>) -> Self {
            Self {
                program: program.into(),
            }
        }

        /// Checks the password by running `true` under sudo, with the
        /// password on stdin. Nothing goes through a shell.
        pub fn verify_credential(&self, credential: &str) -> ElevationResult<()> {
            let mut child = Command::new(&self.program)
                .args(["-S", "-p", "", "true"])
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map_err(ElevationError::LauncherUnavailable)?;

            if let Some(mut stdin) = child.stdin.take() {
                // A launcher that never reads stdin closes the pipe early
                match writeln!(stdin, "{}", credential) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                    Err(e) => return Err(ElevationError::LauncherUnavailable(e)),
                }
            }

            let status = child.wait().map_err(ElevationError::LauncherUnavailable)?;
            if status.success() {
                Ok(())
            } else {
                Err(ElevationError::CredentialRejected)
            }
        }

        /// Replaces this process with `sudo <current exe> <args>`. sudo's
        /// cached timestamp from [`SudoElevation::verify_credential`] keeps
        /// it from asking again.
        fn relaunch(&self) -> ElevationError {
            let exe = match env::current_exe() {
                Ok(exe) => exe,
                Err(e) => return ElevationError::RelaunchFailed(e),
            };

            tracing::info!(exe = %exe.display(), "relaunching with root privileges");
            let err = Command::new(&self.program)
                .arg(exe)
                .args(env::args_os().skip(1))
                .exec();
            ElevationError::RelaunchFailed(err)
        }
    }

    impl Elevation for SudoElevation {
        fn is_elevated(&self) -> bool {
            // SAFETY: geteuid has no preconditions and cannot fail.
            unsafe { libc::geteuid() == 0 }
        }

        fn can_elevate(&self) -> bool {
            true
        }

        fn request_elevation(&self, credential: &str) -> ElevationResult<Infallible> {
            if let Err(err) = self.verify_credential(credential) {
                tracing::warn!(%err, "elevation refused");
                return Err(err);
            }
            Err(self.relaunch())
        }
    }
}

#[cfg(windows)]
pub use token::TokenElevation;

#[cfg(windows)]
mod token {
    use std::convert::Infallible;
    use std::mem;

    use windows::Win32::Security::{
        GetTokenInformation, TokenElevation as TokenElevationClass, TOKEN_ELEVATION,
    };

    use super::Elevation;
    use crate::ffi::TokenHandle;
    use crate::system::error::{ElevationError, ElevationResult};

    /// Elevation status from the process token. Windows elevation goes
    /// through UAC, so this never relaunches.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct TokenElevation;

    impl Elevation for TokenElevation {
        fn is_elevated(&self) -> bool {
            let Ok(token) = TokenHandle::current_process() else {
                return false;
            };

            let mut elevation = TOKEN_ELEVATION::default();
            let mut return_length: u32 = 0;

            // SAFETY: the buffer is a live TOKEN_ELEVATION of the size passed.
            let result = unsafe {
                GetTokenInformation(
                    token.as_raw(),
                    TokenElevationClass,
                    Some(&mut elevation as *mut _ as *mut _),
                    mem::size_of::<TOKEN_ELEVATION>() as u32,
                    &mut return_length,
                )
            };

            result.is_ok() && elevation.TokenIsElevated != 0
        }

        fn can_elevate(&self) -> bool {
            false
        }

        fn request_elevation(&self, _credential: &str) -> ElevationResult<Infallible> {
            Err(ElevationError::Unsupported)
        }
    }
}

#[cfg(not(any(unix, windows)))]
#[derive(Debug, Default, Clone, Copy)]
pub struct NoElevation;

#[cfg(not(any(unix, windows)))]
impl Elevation for NoElevation {
    fn is_elevated(&self) -> bool {
        false
    }

    fn can_elevate(&self) -> bool {
        false
    }

    fn request_elevation(&self, _credential: &str) -> ElevationResult<Infallible> {
        Err(super::error::ElevationError::Unsupported)
    }
}

/// The elevation mechanism for the current platform.
pub fn platform_elevation() -> Box<dyn Elevation> {
    #[cfg(unix)]
    {
        Box::new(SudoElevation::default())
    }
    #[cfg(windows)]
    {
        Box::new(TokenElevation)
    }
    #[cfg(not(any(unix, windows)))]
    {
        Box::new(NoElevation)
    }
}

/// Short indicator for the header line
#[must_use]
pub fn elevation_indicator(elevated: bool) -> &'static str {
    if elevated {
        "[Root]"
    } else {
        "[User]"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::error::ElevationError;

    #[test]
    fn test_elevation_indicator() {
        assert_eq!(elevation_indicator(true), "[Root]");
        assert_eq!(elevation_indicator(false), "[User]");
    }

    #[test]
    fn test_platform_elevation_runs() {
        // The result depends on how the tests are run
        let _elevated = platform_elevation().is_elevated();
    }

    #[cfg(unix)]
    #[test]
    fn test_verify_accepts_when_launcher_succeeds() {
        // `true` ignores its arguments and exits 0
        let sudo = SudoElevation::with_program("true");
        assert!(sudo.verify_credential("secret").is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_verify_rejects_when_launcher_fails() {
        let sudo = SudoElevation::with_program("false");
        assert!(matches!(
            sudo.verify_credential("wrong"),
            Err(ElevationError::CredentialRejected)
        ));
        // Rejection stops before the relaunch
        assert!(matches!(
            sudo.request_elevation("wrong"),
            Err(ElevationError::CredentialRejected)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_launcher() {
        let sudo = SudoElevation::with_program("/nonexistent/core-limiter-sudo");
        assert!(matches!(
            sudo.verify_credential("x"),
            Err(ElevationError::LauncherUnavailable(_))
        ));
    }
}
