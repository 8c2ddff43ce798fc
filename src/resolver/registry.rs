//! Provider version lookup against a Terraform provider registry.
//!
//! Uses the provider registry protocol's version listing:
//! `GET {base}/v1/providers/{namespace}/{name}/versions`.

use serde::Deserialize;
use tracing::debug;

use crate::core::VercheckError;

/// Default public registry.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.terraform.io";

/// Namespace providers are looked up in when the configuration names none.
pub const DEFAULT_PROVIDER_NAMESPACE: &str = "hashicorp";

#[derive(Debug, Deserialize)]
struct VersionsResponse {
    #[serde(default)]
    versions: Vec<RegistryVersion>,
}

#[derive(Debug, Deserialize)]
struct RegistryVersion {
    version: String,
}

/// HTTP client for one registry and namespace.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
    namespace: String,
}

impl RegistryClient {
    /// Create a client for `base_url`, looking providers up under `namespace`.
    ///
    /// A trailing slash on `base_url` is ignored.
    #[must_use]
    pub fn new(base_url: impl Into<String>, namespace: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            namespace: namespace.into(),
        }
    }

    /// URL of the version listing for `provider`.
    #[must_use]
    pub fn versions_url(&self, provider: &str) -> String {
        format!("{}/v1/providers/{}/{}/versions", self.base_url, self.namespace, provider)
    }

    /// Every published version of `provider`, each with a leading `v`.
    ///
    /// # Errors
    ///
    /// Returns [`VercheckError::RegistryError`] on transport failure, a
    /// non-success status, or an undecodable body.
    pub async fn versions(&self, provider: &str) -> Result<Vec<String>, VercheckError> {
        let url = self.versions_url(provider);
        debug!(provider, url = %url, "Fetching provider versions");

        let registry_error = |reason: String| VercheckError::RegistryError {
            provider: provider.to_string(),
            reason,
        };

        let response = self.client.get(&url).send().await.map_err(|e| registry_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(registry_error(format!("HTTP {}", response.status())));
        }

        let body: VersionsResponse = response.json().await.map_err(|e| registry_error(e.to_string()))?;
        Ok(body.versions.into_iter().map(|v| format!("v{}", v.version)).collect())
    }
}
