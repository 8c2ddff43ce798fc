//! Cross-platform utilities and helpers
//!
//! # Modules
//!
//! - [`platform`] - Platform-specific helpers and path resolution
//! - [`progress`] - Spinner shown while the crawl runs

pub mod platform;
pub mod progress;

pub use platform::{command_exists, default_clone_dir, get_git_command, get_home_dir, is_windows, resolve_path};
pub use progress::ProgressBar;
