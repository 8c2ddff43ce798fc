//! Dependency records and the identifiers they are resolved from.
//!
//! An [`Identifier`] is what the extractor finds in a configuration file: either
//! a module source string or a provider name with a version constraint. The
//! resolver turns each identifier into a [`Resolved`] dependency carrying the
//! full version picture.

use std::fmt;
use std::path::PathBuf;

use crate::version::{self, latest_version};

/// A semantically versioned dependency.
///
/// `latest_version` is the maximum of `versions` by semantic-version ordering,
/// or [`crate::version::NO_VERSION`] when no valid version exists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dependency {
    /// Dependency name (repository name for modules, provider name otherwise)
    pub name: String,
    /// Version currently referenced by the configuration
    pub current_version: String,
    /// Highest available version
    pub latest_version: String,
    /// Every available version, in no particular order
    pub versions: Vec<String>,
}

impl Dependency {
    /// Build a dependency, deriving `latest_version` from `versions`.
    pub fn new(
        name: impl Into<String>,
        current_version: impl Into<String>,
        versions: Vec<String>,
    ) -> Self {
        let latest_version = latest_version(&versions);
        Self {
            name: name.into(),
            current_version: current_version.into(),
            latest_version,
            versions,
        }
    }

    /// Whether the referenced version differs from the latest one.
    ///
    /// Versions are compared semantically, so a `v1.2` pin is current when the
    /// latest tag is `v1.2.0`.
    #[must_use]
    pub fn is_outdated(&self) -> bool {
        !version::same_version(&self.current_version, &self.latest_version)
    }
}

/// A module fetched from a remote git source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Module {
    /// Version information
    pub dependency: Dependency,
    /// Clone URI of the remote repository
    pub source: String,
    /// Local checkout of the pinned version
    pub path: PathBuf,
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.source, self.dependency.current_version)
    }
}

/// A provider resolved through the registry. Providers have no checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Provider {
    /// Version information
    pub dependency: Dependency,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.dependency.name, self.dependency.current_version)
    }
}

/// A dependency reference found in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// `module "x" { source = "..." }`
    Module {
        /// Raw source string as written
        source_uri: String,
    },
    /// An entry of a `required_providers` block
    Provider {
        /// Provider name
        name: String,
        /// Version constraint, normalised to a leading `v`
        constraint: String,
    },
}

impl Identifier {
    /// Shorthand for a module identifier.
    pub fn module(source_uri: impl Into<String>) -> Self {
        Self::Module {
            source_uri: source_uri.into(),
        }
    }

    /// Shorthand for a provider identifier.
    pub fn provider(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self::Provider {
            name: name.into(),
            constraint: constraint.into(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module {
                source_uri,
            } => write!(f, "module {source_uri}"),
            Self::Provider {
                name,
                constraint,
            } => write!(f, "provider {name} {constraint}"),
        }
    }
}

/// The outcome of resolving one [`Identifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A module, which the crawler may descend into
    Module(Module),
    /// A provider, always a leaf
    Provider(Provider),
}

impl Resolved {
    /// Version information of either variant.
    #[must_use]
    pub const fn dependency(&self) -> &Dependency {
        match self {
            Self::Module(module) => &module.dependency,
            Self::Provider(provider) => &provider.dependency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::NO_VERSION;

    #[test]
    fn test_dependency_latest_is_maximum() {
        let dep = Dependency::new(
            "vpc",
            "v1.2.0",
            vec!["v1.2.0".to_string(), "v1.10.0".to_string(), "v1.9.3".to_string()],
        );
        assert_eq!(dep.latest_version, "v1.10.0");
        assert!(dep.is_outdated());
    }

    #[test]
    fn test_shorthand_pin_of_latest_is_current() {
        let dep = Dependency::new("net.git", "v1.2", vec!["v1.1.0".to_string(), "v1.2.0".to_string()]);
        assert_eq!(dep.latest_version, "v1.2.0");
        assert!(!dep.is_outdated());

        let dep = Dependency::new("net.git", "v1.1", vec!["v1.1.0".to_string(), "v1.2.0".to_string()]);
        assert!(dep.is_outdated());
    }

    #[test]
    fn test_resolved_exposes_dependency() {
        let resolved = Resolved::Provider(Provider {
            dependency: Dependency::new("helm", "v0.10", vec!["v0.10.4".to_string()]),
        });
        assert_eq!(resolved.dependency().name, "helm");
        assert_eq!(resolved.dependency().latest_version, "v0.10.4");
    }

    #[test]
    fn test_dependency_without_versions_uses_sentinel() {
        let dep = Dependency::new("vpc", "v1.0.0", Vec::new());
        assert_eq!(dep.latest_version, NO_VERSION);

        let dep = Dependency::new("vpc", "v1.0.0", vec!["main".to_string(), "dev".to_string()]);
        assert_eq!(dep.latest_version, NO_VERSION);
    }

    #[test]
    fn test_display() {
        let module = Module {
            dependency: Dependency::new("repo.git", "v3.2.0", Vec::new()),
            source: "git@github.com:org/repo.git".to_string(),
            path: PathBuf::from("/tmp/x"),
        };
        assert_eq!(module.to_string(), "git@github.com:org/repo.git - v3.2.0");
        assert_eq!(Identifier::provider("helm", "v0.10").to_string(), "provider helm v0.10");
    }
}
