//! Platform helpers: locating git, the home directory, and user-supplied paths.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Name of the git executable on this platform.
#[must_use]
pub const fn get_git_command() -> &'static str {
    if is_windows() {
        "git.exe"
    } else {
        "git"
    }
}

/// Whether `cmd` can be found on `PATH`.
#[must_use]
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// The current user's home directory.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Expand a leading `~` and `$VAR` references in a user-supplied path.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path).with_context(|| {
        format!(
            "Failed to expand path: {path}\n\n\
            Common issues:\n\
            - Undefined environment variable (e.g., $UNDEFINED_VAR)\n\
            - Invalid variable syntax (use $VAR or ${{VAR}})"
        )
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Default parent directory for module checkouts: `<tmp>/tfvercheck`.
#[must_use]
pub fn default_clone_dir() -> PathBuf {
    std::env::temp_dir().join("tfvercheck")
}
