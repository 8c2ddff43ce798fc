//! tfvercheck CLI entry point
//!
//! Parses the command line, runs the check and maps the outcome to an exit
//! status: 0 when up to date, 1 on module drift, 2 when the run failed.

use clap::Parser;
use tfvercheck::cli::{self, EXIT_FAILURE};
use tfvercheck::core::user_friendly_error;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(EXIT_FAILURE);
        }
    }
}
