//! Error handling for tfvercheck
//!
//! This module provides the error types and user-facing error reporting for the
//! version checker. The error system follows two principles:
//! 1. **Strongly-typed errors** so callers can decide what is fatal and what is not
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! Errors fall into the categories the crawl cares about when deciding how far a
//! failure propagates:
//! - **Extraction**: a directory could not be read or scanned
//!   ([`VercheckError::DirectoryRead`], [`VercheckError::InvalidPattern`])
//! - **Resolution**: one identifier could not be resolved over the network
//!   ([`VercheckError::GitCloneFailed`], [`VercheckError::RegistryError`], ...)
//! - **Structural**: a reference is malformed and can never resolve
//!   ([`VercheckError::InvalidModuleSource`], [`VercheckError::InvalidPinnedVersion`])
//! - **Setup**: the run itself cannot start
//!   ([`VercheckError::InvalidRootDirectory`], [`VercheckError::ConfigError`])
//!
//! Identifier-level failures are isolated: the crawler logs them and carries on.
//! Setup failures propagate to `main` and are rendered through
//! [`user_friendly_error`].

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for tfvercheck operations.
#[derive(Error, Debug)]
pub enum VercheckError {
    /// Git command failed during execution
    #[error("Git operation failed: {operation}")]
    GitCommandError {
        /// The git operation that failed (e.g., "clone", "tag")
        operation: String,
        /// Error output from the git command
        stderr: String,
    },

    /// Git executable not found in PATH
    #[error("Git is not installed or not found in PATH")]
    GitNotFound,

    /// Cloning a module repository failed
    #[error("Failed to clone repository: {url}")]
    GitCloneFailed {
        /// The URL that failed to clone
        url: String,
        /// Reason for the clone failure
        reason: String,
    },

    /// Checking out the pinned reference failed
    #[error("Failed to checkout reference '{reference}' in repository")]
    GitCheckoutFailed {
        /// The reference that could not be checked out
        reference: String,
        /// Reason for the checkout failure
        reason: String,
    },

    /// The configured SSH key does not exist
    #[error("SSH key not found: {path}")]
    SshKeyMissing {
        /// Path that was configured as the key
        path: String,
    },

    /// Provider registry lookup failed
    #[error("Registry lookup failed for provider '{provider}': {reason}")]
    RegistryError {
        /// Provider name that was looked up
        provider: String,
        /// What went wrong (HTTP status, decode failure, ...)
        reason: String,
    },

    /// A module source string does not have the expected git shape
    #[error("Invalid module source '{source_uri}': {reason}")]
    InvalidModuleSource {
        /// The raw source string from the configuration
        source_uri: String,
        /// Which part of the source could not be parsed
        reason: String,
    },

    /// The `ref=` of a module source is not a semantic version
    #[error("Invalid semantic version '{reference}' pinned in module source '{source_uri}'")]
    InvalidPinnedVersion {
        /// The raw source string from the configuration
        source_uri: String,
        /// The pinned reference that failed to parse
        reference: String,
    },

    /// A directory could not be scanned for identifiers
    #[error("Failed to read directory {path}: {reason}")]
    DirectoryRead {
        /// Directory being scanned
        path: String,
        /// Underlying failure
        reason: String,
    },

    /// A file or ignore pattern is not a valid regular expression
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern as given
        pattern: String,
        /// Regex compile error
        reason: String,
    },

    /// The root directory of the crawl does not exist or is not a directory
    #[error("Root directory is not a readable directory: {path}")]
    InvalidRootDirectory {
        /// Path given as the crawl root
        path: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl VercheckError {
    /// Whether this error signals a configuration inconsistency rather than a
    /// transient failure.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::InvalidModuleSource { .. } | Self::InvalidPinnedVersion { .. })
    }
}

/// Error context wrapper that provides user-friendly error information.
///
/// When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context about the error in yellow (optional)
/// 3. **Suggestion**: Actionable steps to resolve the issue in green (optional)
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: VercheckError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: VercheckError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions.
///
/// Recognises [`VercheckError`] anywhere in the chain, then common IO failures,
/// and falls back to the full error chain for anything else.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(vercheck_error) = error.chain().find_map(|e| e.downcast_ref::<VercheckError>()) {
        return create_error_context(vercheck_error);
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(VercheckError::Other {
                    message: format!("Permission denied: {io_error}"),
                })
                .with_suggestion("Check ownership and permissions of the output and log paths");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(VercheckError::Other {
                    message: format!("File not found: {io_error}"),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(VercheckError::Other {
        message,
    })
}

fn create_error_context(error: &VercheckError) -> ErrorContext {
    let context = ErrorContext::new(copy_error(error));
    match error {
        VercheckError::GitNotFound => context
            .with_suggestion("Install git from https://git-scm.com/ and make sure it is on PATH")
            .with_details("Module sources are cloned with the system git binary"),
        VercheckError::InvalidRootDirectory {
            ..
        } => context.with_suggestion("Pass an existing Terraform directory with --directory"),
        VercheckError::InvalidPattern {
            ..
        } => context
            .with_suggestion("Check --pattern and --ignore-pattern; both are regular expressions"),
        VercheckError::ConfigError {
            ..
        } => context
            .with_suggestion("Check the syntax of your tfvercheck config.toml")
            .with_details("Every key in the config file is optional; remove keys you do not need"),
        VercheckError::SshKeyMissing {
            ..
        } => context.with_suggestion("Pass the path to a readable private key with --key"),
        VercheckError::InvalidModuleSource {
            ..
        }
        | VercheckError::InvalidPinnedVersion {
            ..
        } => context.with_suggestion(
            "Module sources must look like git::ssh://git@host/org/repo.git?ref=v1.2.3",
        ),
        _ => context,
    }
}

// Errors wrapping foreign types are not Clone; collapse them to their message.
fn copy_error(error: &VercheckError) -> VercheckError {
    match error {
        VercheckError::GitCommandError {
            operation,
            stderr,
        } => VercheckError::GitCommandError {
            operation: operation.clone(),
            stderr: stderr.clone(),
        },
        VercheckError::GitNotFound => VercheckError::GitNotFound,
        VercheckError::GitCloneFailed {
            url,
            reason,
        } => VercheckError::GitCloneFailed {
            url: url.clone(),
            reason: reason.clone(),
        },
        VercheckError::GitCheckoutFailed {
            reference,
            reason,
        } => VercheckError::GitCheckoutFailed {
            reference: reference.clone(),
            reason: reason.clone(),
        },
        VercheckError::SshKeyMissing {
            path,
        } => VercheckError::SshKeyMissing {
            path: path.clone(),
        },
        VercheckError::RegistryError {
            provider,
            reason,
        } => VercheckError::RegistryError {
            provider: provider.clone(),
            reason: reason.clone(),
        },
        VercheckError::InvalidModuleSource {
            source_uri,
            reason,
        } => VercheckError::InvalidModuleSource {
            source_uri: source_uri.clone(),
            reason: reason.clone(),
        },
        VercheckError::InvalidPinnedVersion {
            source_uri,
            reference,
        } => VercheckError::InvalidPinnedVersion {
            source_uri: source_uri.clone(),
            reference: reference.clone(),
        },
        VercheckError::DirectoryRead {
            path,
            reason,
        } => VercheckError::DirectoryRead {
            path: path.clone(),
            reason: reason.clone(),
        },
        VercheckError::InvalidPattern {
            pattern,
            reason,
        } => VercheckError::InvalidPattern {
            pattern: pattern.clone(),
            reason: reason.clone(),
        },
        VercheckError::InvalidRootDirectory {
            path,
        } => VercheckError::InvalidRootDirectory {
            path: path.clone(),
        },
        VercheckError::ConfigError {
            message,
        } => VercheckError::ConfigError {
            message: message.clone(),
        },
        VercheckError::IoError(e) => VercheckError::Other {
            message: format!("IO error: {e}"),
        },
        VercheckError::Other {
            message,
        } => VercheckError::Other {
            message: message.clone(),
        },
    }
}
