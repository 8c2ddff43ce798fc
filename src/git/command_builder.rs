//! Type-safe Git command builder for consistent command execution
//!
//! Every git invocation goes through [`GitCommand`] so that timeouts, SSH
//! configuration, logging and error mapping behave the same for clones, tag
//! listings and checkouts.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::core::VercheckError;
use crate::utils::platform::get_git_command;

/// Default timeout for a single git invocation.
pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Builder for constructing and executing Git commands with consistent error handling.
///
/// # Examples
///
/// ```rust,ignore
/// use tfvercheck::git::command_builder::GitCommand;
///
/// # async fn example() -> Result<(), tfvercheck::core::VercheckError> {
/// let tags = GitCommand::list_tags()
///     .current_dir("/tmp/tfvercheck/4a1c")
///     .execute_stdout()
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// # Default Configuration
///
/// - **Timeout**: 5 minutes
/// - **Output capture**: Enabled
/// - **Working directory**: Current process directory
/// - **Environment**: Inherits from parent process, with terminal prompts disabled
pub struct GitCommand {
    /// Command arguments to pass to Git (e.g., ["clone", "url", "path"])
    args: Vec<String>,

    /// Working directory, passed to git as `-C <dir>`
    current_dir: Option<PathBuf>,

    /// Environment variables to set for the Git process
    env_vars: Vec<(String, String)>,

    /// Maximum duration to wait for command completion (None = no timeout)
    timeout_duration: Option<Duration>,

    /// Optional context string for log lines
    context: Option<String>,

    /// For clone commands, store the URL for better error messages
    clone_url: Option<String>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            // Never block on credential prompts
            env_vars: vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())],
            timeout_duration: Some(DEFAULT_GIT_TIMEOUT),
            context: None,
            clone_url: None,
        }
    }
}

impl GitCommand {
    /// Creates a new Git command builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the working directory for Git command execution.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Adds a single argument to the Git command.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds multiple arguments to the Git command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets an environment variable for the Git process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Authenticate SSH transports with `key` only, ignoring the agent's other identities.
    pub fn ssh_key(self, key: Option<&Path>) -> Self {
        match key {
            Some(key) => self.env(
                "GIT_SSH_COMMAND",
                format!("ssh -i \"{}\" -o IdentitiesOnly=yes", key.display()),
            ),
            None => self,
        }
    }

    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Full argument list as passed to git, `-C <dir>` included.
    fn full_args(&self) -> Vec<String> {
        let mut full_args = Vec::with_capacity(self.args.len() + 2);
        if let Some(ref dir) = self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.iter().cloned());
        full_args
    }

    /// Executes the command and captures its output.
    ///
    /// # Errors
    ///
    /// - [`VercheckError::GitNotFound`] if git cannot be spawned
    /// - [`VercheckError::GitCloneFailed`] / [`VercheckError::GitCheckoutFailed`]
    ///   for failed clones and checkouts
    /// - [`VercheckError::GitCommandError`] for other failures and timeouts
    pub async fn execute(self) -> Result<GitCommandOutput, VercheckError> {
        let start = std::time::Instant::now();
        let git_command = get_git_command();
        let full_args = self.full_args();
        let operation = self.args.first().cloned().unwrap_or_else(|| "unknown".to_string());

        let mut cmd = Command::new(git_command);
        cmd.args(&full_args).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);
        for (key, value) in &self.env_vars {
            tracing::trace!(target: "git", "Setting env var: {}={}", key, value);
            cmd.env(key, value);
        }

        match self.context {
            Some(ref ctx) => {
                tracing::debug!(target: "git", "({}) Executing command: {} {}", ctx, git_command, full_args.join(" "));
            }
            None => tracing::debug!(target: "git", "Executing command: {} {}", git_command, full_args.join(" ")),
        }

        let spawn_error = |e: std::io::Error| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VercheckError::GitNotFound
            } else {
                VercheckError::IoError(e)
            }
        };

        let output = match self.timeout_duration {
            Some(duration) => match timeout(duration, cmd.output()).await {
                Ok(result) => result.map_err(spawn_error)?,
                Err(_) => {
                    tracing::warn!(
                        target: "git",
                        "Command timed out after {} seconds: git {}",
                        duration.as_secs(),
                        full_args.join(" ")
                    );
                    return Err(VercheckError::GitCommandError {
                        operation,
                        stderr: format!(
                            "Git command timed out after {} seconds. This may indicate:\n\
                            - Network connectivity issues\n\
                            - Authentication prompts waiting for input\n\
                            Try running the command manually: git {}",
                            duration.as_secs(),
                            full_args.join(" ")
                        ),
                    });
                }
            },
            None => cmd.output().await.map_err(spawn_error)?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(target: "git", "Command failed with exit code: {:?}", output.status.code());
            if !stderr.is_empty() {
                tracing::debug!(target: "git", "Error: {}", stderr.trim());
            }

            let error = match operation.as_str() {
                "clone" => VercheckError::GitCloneFailed {
                    url: self.clone_url.unwrap_or_else(|| "unknown".to_string()),
                    reason: stderr,
                },
                "checkout" => VercheckError::GitCheckoutFailed {
                    reference: self.args.get(1).cloned().unwrap_or_default(),
                    reason: stderr,
                },
                _ => VercheckError::GitCommandError {
                    operation,
                    stderr: if stderr.is_empty() { stdout } else { stderr },
                },
            };
            return Err(error);
        }

        if !stderr.is_empty() {
            tracing::trace!(target: "git", "{}", stderr.trim());
        }

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::info!(target: "git::perf", "Git {} took {:.2}s", operation, elapsed.as_secs_f64());
        } else if elapsed.as_millis() > 100 {
            tracing::debug!(target: "git::perf", "Git {} took {}ms", operation, elapsed.as_millis());
        }

        Ok(GitCommandOutput {
            stdout,
            stderr,
        })
    }

    /// Executes the command and returns its trimmed stdout.
    pub async fn execute_stdout(self) -> Result<String, VercheckError> {
        let output = self.execute().await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Executes the command, discarding its output.
    pub async fn execute_success(self) -> Result<(), VercheckError> {
        self.execute().await?;
        Ok(())
    }
}

/// Output from a Git command
#[derive(Debug)]
pub struct GitCommandOutput {
    pub stdout: String,
    pub stderr: String,
}

// Convenience builders for the operations a module resolution needs

impl GitCommand {
    /// `git clone` of `url` into `target`, blobs fetched on demand.
    pub fn clone(url: &str, target: impl AsRef<Path>) -> Self {
        let mut cmd = Self::new().args(["clone", "--filter=blob:none", url]);
        cmd.args.push(target.as_ref().display().to_string());
        cmd.clone_url = Some(url.to_string());
        cmd
    }

    pub fn list_tags() -> Self {
        Self::new().args(["tag", "-l"])
    }

    pub fn checkout(ref_name: &str) -> Self {
        Self::new().args(["checkout", ref_name])
    }
}
