//! Log subscriber setup for the command line.
//!
//! The level is chosen in this order:
//! 1. `--verbose`: debug for tfvercheck and its git calls
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`, when set
//! 4. Default: info
//!
//! Logs go to stderr. With `--log <path>` every line is also appended to that
//! file, without ANSI colors.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directives for the given verbosity flags.
fn filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("info,tfvercheck=debug,git=debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a subscriber is
/// already installed.
pub fn init_logging(verbose: bool, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter(verbose, quiet))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialise logging")
}
