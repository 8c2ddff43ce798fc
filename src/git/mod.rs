//! Git operations for module resolution.
//!
//! Modules are fetched with the system `git` binary rather than an embedded
//! implementation, so SSH agents, `~/.ssh/config` and credential helpers work
//! as they do on the command line. An explicit key can still be forced through
//! `GIT_SSH_COMMAND` (see [`GitCommand::ssh_key`]).
//!
//! The module also knows how to take apart a Terraform git source string:
//!
//! ```text
//! git::ssh://git@github.com/org/network.git?ref=v3.2.0
//!            └──────────── clone URI ─────────┘    └ ref ┘
//! ```
//!
//! becomes the scp-style clone URI `git@github.com:org/network.git`, the pinned
//! reference `v3.2.0` and the repository name `network.git`.

pub mod command_builder;

pub use command_builder::{DEFAULT_GIT_TIMEOUT, GitCommand};

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::core::VercheckError;
use crate::version;

static GIT_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"git@.+(\.git)?\?").expect("git uri pattern is valid"));
static CURRENT_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ref=(.+)$").expect("ref pattern is valid"));
static REPO_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/([^/]+)(\.git)?[\?|$]").expect("repo name pattern is valid"));

/// The parts of a module source string needed to fetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSource {
    /// scp-style URI handed to `git clone`
    pub clone_uri: String,
    /// The pinned `ref=` value
    pub reference: String,
    /// Last path segment of the repository, `.git` suffix kept
    pub repo_name: String,
}

/// Split a `git::ssh://git@host/path?ref=X` source into its parts.
///
/// # Errors
///
/// Returns [`VercheckError::InvalidModuleSource`] when the source lacks the
/// `git@...?` shape, a `ref=` or a repository name, and
/// [`VercheckError::InvalidPinnedVersion`] when the ref is not a semantic version.
pub fn decompose_source_uri(source_uri: &str) -> Result<ModuleSource, VercheckError> {
    let invalid = |reason: &str| VercheckError::InvalidModuleSource {
        source_uri: source_uri.to_string(),
        reason: reason.to_string(),
    };

    let bare_uri = GIT_URI.find(source_uri).ok_or_else(|| invalid("no git@host...? part"))?;
    let reference = CURRENT_REF
        .captures(source_uri)
        .and_then(|c| c.get(1))
        .ok_or_else(|| invalid("no ref= pinned"))?
        .as_str()
        .to_string();
    let repo_name = REPO_NAME
        .captures(source_uri)
        .and_then(|c| c.get(1))
        .ok_or_else(|| invalid("no repository name"))?
        .as_str()
        .to_string();

    if !version::is_valid(&reference) {
        return Err(VercheckError::InvalidPinnedVersion {
            source_uri: source_uri.to_string(),
            reference,
        });
    }

    let clone_uri = bare_uri.as_str().replacen('/', ":", 1).replacen('?', "", 1);
    Ok(ModuleSource {
        clone_uri,
        reference,
        repo_name,
    })
}

/// A local clone of a module repository.
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    /// Wrap an existing checkout.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Clone `url` into `target`.
    ///
    /// # Errors
    ///
    /// Returns [`VercheckError::GitCloneFailed`] if git reports a failure, or a
    /// [`VercheckError::GitCommandError`] if the clone exceeds `timeout`.
    pub async fn clone(
        url: &str,
        target: impl AsRef<Path>,
        ssh_key: Option<&Path>,
        timeout: Duration,
    ) -> Result<Self, VercheckError> {
        let target = target.as_ref();
        GitCommand::clone(url, target)
            .ssh_key(ssh_key)
            .with_timeout(Some(timeout))
            .with_context(url)
            .execute_success()
            .await?;
        Ok(Self::new(target))
    }

    /// Every tag in the repository, in git's listing order.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a repository or git fails.
    pub async fn list_tags(&self) -> Result<Vec<String>, VercheckError> {
        let stdout = GitCommand::list_tags().current_dir(&self.path).execute_stdout().await?;
        Ok(stdout.lines().map(str::trim).filter(|line| !line.is_empty()).map(ToString::to_string).collect())
    }

    /// Check out `reference` (tag, branch or commit) in detached state.
    ///
    /// # Errors
    ///
    /// Returns [`VercheckError::GitCheckoutFailed`] if the reference does not exist.
    pub async fn checkout(&self, reference: &str) -> Result<(), VercheckError> {
        GitCommand::checkout(reference).current_dir(&self.path).execute_success().await
    }

    /// Working tree of this clone.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
