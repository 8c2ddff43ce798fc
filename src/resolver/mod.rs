//! Identifier resolution: turning a reference into a dependency with versions.
//!
//! Modules are resolved by cloning their git source into a fresh directory,
//! reading its semantic-version tags and checking out the pinned tag so the
//! crawl can read the module's own configuration at that version. Providers are
//! resolved through the provider registry.

pub mod registry;

pub use registry::{DEFAULT_PROVIDER_NAMESPACE, DEFAULT_REGISTRY_URL, RegistryClient};

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::VercheckError;
use crate::crawler::Resolve;
use crate::git::{DEFAULT_GIT_TIMEOUT, GitRepo, decompose_source_uri};
use crate::models::{Dependency, Identifier, Module, Provider, Resolved};
use crate::utils::default_clone_dir;
use crate::version;

/// Settings for [`RemoteResolver`].
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Private key for SSH clones; the SSH defaults apply when unset
    pub ssh_key: Option<PathBuf>,
    /// Parent directory of module checkouts
    pub clone_dir: PathBuf,
    /// Upper bound for a single git invocation
    pub git_timeout: Duration,
    /// Provider registry base URL
    pub registry_url: String,
    /// Registry namespace providers live in
    pub provider_namespace: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ssh_key: None,
            clone_dir: default_clone_dir(),
            git_timeout: DEFAULT_GIT_TIMEOUT,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            provider_namespace: DEFAULT_PROVIDER_NAMESPACE.to_string(),
        }
    }
}

/// [`Resolve`] implementation backed by git and the provider registry.
#[derive(Debug, Clone)]
pub struct RemoteResolver {
    config: ResolverConfig,
    registry: RegistryClient,
}

impl RemoteResolver {
    /// Create a resolver cloning into `config.clone_dir`.
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        let registry = RegistryClient::new(&config.registry_url, &config.provider_namespace);
        Self {
            config,
            registry,
        }
    }

    /// Clone a module source and describe it.
    ///
    /// # Errors
    ///
    /// Structural errors for malformed sources; resolution errors when the
    /// SSH key is missing or the clone or tag listing fails.
    pub async fn resolve_module(&self, source_uri: &str) -> Result<Module, VercheckError> {
        let source = decompose_source_uri(source_uri)?;

        if let Some(key) = &self.config.ssh_key
            && !key.is_file()
        {
            return Err(VercheckError::SshKeyMissing {
                path: key.display().to_string(),
            });
        }

        tokio::fs::create_dir_all(&self.config.clone_dir).await?;
        let target = self.config.clone_dir.join(Uuid::new_v4().to_string());
        debug!(uri = %source.clone_uri, target = %target.display(), "Cloning module");

        let repo = GitRepo::clone(
            &source.clone_uri,
            &target,
            self.config.ssh_key.as_deref(),
            self.config.git_timeout,
        )
        .await?;

        let mut versions = Vec::new();
        for tag in repo.list_tags().await? {
            if version::is_valid(&tag) {
                versions.push(tag);
            } else {
                debug!(repo = %source.repo_name, tag = %tag, "Ignoring non-semver tag");
            }
        }

        if let Err(err) = repo.checkout(&source.reference).await {
            warn!(
                repo = %source.repo_name,
                reference = %source.reference,
                error = %err,
                "Pinned version not found, reading the default branch instead"
            );
        }

        let dependency = Dependency::new(source.repo_name, source.reference, versions);
        debug!(
            module = %dependency.name,
            current = %dependency.current_version,
            latest = %dependency.latest_version,
            "Resolved module"
        );

        Ok(Module {
            dependency,
            source: source.clone_uri,
            path: target,
        })
    }

    /// Look a provider up in the registry.
    ///
    /// # Errors
    ///
    /// Returns [`VercheckError::RegistryError`] if the lookup fails.
    pub async fn resolve_provider(&self, name: &str, constraint: &str) -> Result<Provider, VercheckError> {
        let versions = self.registry.versions(name).await?;
        let dependency = Dependency::new(name, constraint, versions);
        debug!(provider = name, latest = %dependency.latest_version, "Resolved provider");
        Ok(Provider {
            dependency,
        })
    }
}

/// Delete the checkouts [`RemoteResolver`] created under `clone_dir`.
///
/// Only direct children of `clone_dir` are touched, so modules read from
/// anywhere else are left alone. Returns how many checkouts were removed.
pub async fn remove_checkouts<'a>(clone_dir: &Path, modules: impl IntoIterator<Item = &'a Module>) -> usize {
    let mut removed = 0;
    for module in modules {
        if module.path.parent() != Some(clone_dir) {
            continue;
        }
        match tokio::fs::remove_dir_all(&module.path).await {
            Ok(()) => removed += 1,
            Err(err) => warn!(path = %module.path.display(), error = %err, "Failed to remove module checkout"),
        }
    }
    debug!(removed, clone_dir = %clone_dir.display(), "Removed module checkouts");
    removed
}

#[async_trait]
impl Resolve for RemoteResolver {
    async fn resolve(&self, identifier: &Identifier) -> Result<Resolved, VercheckError> {
        match identifier {
            Identifier::Module {
                source_uri,
            } => self.resolve_module(source_uri).await.map(Resolved::Module),
            Identifier::Provider {
                name,
                constraint,
            } => self.resolve_provider(name, constraint).await.map(Resolved::Provider),
        }
    }
}
