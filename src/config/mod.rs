//! Configuration file support for tfvercheck.
//!
//! Settings that rarely change between runs (SSH key, registry, clone
//! location) can live in a TOML file instead of on the command line.
//!
//! **Location:**
//! - Unix/macOS: `~/.tfvercheck/config.toml`
//! - Windows: `%LOCALAPPDATA%\tfvercheck\config.toml`
//!
//! The path can be overridden with `--config` or `TFVERCHECK_CONFIG`.
//!
//! ```toml
//! pattern = '.+\.tf'
//! ignore_pattern = "test|examples"
//! ssh_key = "~/.ssh/id_ed25519"
//! depth = 5
//! registry_url = "https://registry.terraform.io"
//! provider_namespace = "hashicorp"
//! clone_dir = "/var/tmp/tfvercheck"
//! git_timeout_secs = 120
//! ```
//!
//! Every key is optional. Command-line flags win over file values, and file
//! values win over built-in defaults (see [`CheckConfig::overlay`]).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::core::VercheckError;
use crate::extraction::{DEFAULT_FILE_PATTERN, DEFAULT_IGNORE_PATTERN};
use crate::git::DEFAULT_GIT_TIMEOUT;
use crate::resolver::{DEFAULT_PROVIDER_NAMESPACE, DEFAULT_REGISTRY_URL, ResolverConfig};
use crate::utils::{default_clone_dir, resolve_path};

/// Default maximum module nesting depth.
pub const DEFAULT_DEPTH: usize = 10;

/// Run settings, as read from the config file or collected from flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Regex selecting configuration files to scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Regex naming directories to skip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_pattern: Option<String>,

    /// SSH private key used for module clones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<String>,

    /// Maximum module nesting depth to follow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_namespace: Option<String>,

    /// Parent directory for module checkouts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_timeout_secs: Option<u64>,
}

impl CheckConfig {
    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// A missing file yields the default (empty) configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = path.unwrap_or_else(|| {
            Self::default_path().unwrap_or_else(|_| PathBuf::from("~/.tfvercheck/config.toml"))
        });
        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or
    /// [`VercheckError::ConfigError`] if it is not valid TOML for this config.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content).map_err(|e| {
            VercheckError::ConfigError {
                message: format!("Failed to parse config from {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Platform-specific config file location.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or local data) directory is unknown.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("tfvercheck")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".tfvercheck")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Layer `overrides` on top of `self`; every value set in `overrides` wins.
    #[must_use]
    pub fn overlay(self, overrides: Self) -> Self {
        Self {
            pattern: overrides.pattern.or(self.pattern),
            ignore_pattern: overrides.ignore_pattern.or(self.ignore_pattern),
            ssh_key: overrides.ssh_key.or(self.ssh_key),
            depth: overrides.depth.or(self.depth),
            registry_url: overrides.registry_url.or(self.registry_url),
            provider_namespace: overrides.provider_namespace.or(self.provider_namespace),
            clone_dir: overrides.clone_dir.or(self.clone_dir),
            git_timeout_secs: overrides.git_timeout_secs.or(self.git_timeout_secs),
        }
    }

    #[must_use]
    pub fn file_pattern(&self) -> &str {
        self.pattern.as_deref().unwrap_or(DEFAULT_FILE_PATTERN)
    }

    #[must_use]
    pub fn ignore_pattern(&self) -> &str {
        self.ignore_pattern.as_deref().unwrap_or(DEFAULT_IGNORE_PATTERN)
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.depth.unwrap_or(DEFAULT_DEPTH)
    }

    /// Settings for the remote resolver, with `~` and `$VAR` expanded in
    /// every path.
    ///
    /// # Errors
    ///
    /// Returns an error if a path references an undefined variable.
    pub fn resolver_config(&self) -> Result<ResolverConfig> {
        let ssh_key = self
            .ssh_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .map(resolve_path)
            .transpose()
            .context("Invalid ssh_key path")?;
        let clone_dir = match self.clone_dir.as_deref() {
            Some(dir) => resolve_path(dir).context("Invalid clone_dir path")?,
            None => default_clone_dir(),
        };

        Ok(ResolverConfig {
            ssh_key,
            clone_dir,
            git_timeout: self.git_timeout_secs.map_or(DEFAULT_GIT_TIMEOUT, Duration::from_secs),
            registry_url: self.registry_url.clone().unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string()),
            provider_namespace: self
                .provider_namespace
                .clone()
                .unwrap_or_else(|| DEFAULT_PROVIDER_NAMESPACE.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_defaults() {
        let config = CheckConfig::default();
        assert_eq!(config.file_pattern(), r".+\.tf");
        assert_eq!(config.ignore_pattern(), "test");
        assert_eq!(config.max_depth(), 10);

        let resolver = config.resolver_config().unwrap();
        assert!(resolver.ssh_key.is_none());
        assert_eq!(resolver.registry_url, "https://registry.terraform.io");
        assert_eq!(resolver.provider_namespace, "hashicorp");
        assert_eq!(resolver.git_timeout, DEFAULT_GIT_TIMEOUT);
        assert_eq!(resolver.clone_dir, default_clone_dir());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
pattern = '.+\.tf$'
depth = 3
registry_url = "http://localhost:8080"
clone_dir = "/var/tmp/clones"
git_timeout_secs = 30
"#,
        )
        .unwrap();

        let config = CheckConfig::load_from(&path).await.unwrap();
        assert_eq!(config.file_pattern(), r".+\.tf$");
        assert_eq!(config.ignore_pattern(), "test");
        assert_eq!(config.max_depth(), 3);

        let resolver = config.resolver_config().unwrap();
        assert_eq!(resolver.registry_url, "http://localhost:8080");
        assert_eq!(resolver.clone_dir, PathBuf::from("/var/tmp/clones"));
        assert_eq!(resolver.git_timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = CheckConfig::load_with_optional(Some(temp.path().join("absent.toml"))).await.unwrap();
        assert_eq!(config, CheckConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "depth = \"deep\"").unwrap();

        let err = CheckConfig::load_with_optional(Some(path)).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
        assert!(matches!(err.downcast_ref::<VercheckError>(), Some(VercheckError::ConfigError { .. })));
    }

    #[test]
    fn test_overlay_prefers_overrides() {
        let file = CheckConfig {
            pattern: Some("file".to_string()),
            depth: Some(2),
            ssh_key: Some("/keys/file".to_string()),
            ..CheckConfig::default()
        };
        let flags = CheckConfig {
            depth: Some(7),
            ignore_pattern: Some("fixtures".to_string()),
            ..CheckConfig::default()
        };

        let merged = file.overlay(flags);
        assert_eq!(merged.file_pattern(), "file");
        assert_eq!(merged.ignore_pattern(), "fixtures");
        assert_eq!(merged.max_depth(), 7);
        assert_eq!(merged.ssh_key.as_deref(), Some("/keys/file"));
    }

    #[test]
    fn test_empty_ssh_key_means_none() {
        let config = CheckConfig {
            ssh_key: Some(String::new()),
            ..CheckConfig::default()
        };
        assert!(config.resolver_config().unwrap().ssh_key.is_none());
    }
}
