//! The association graph assembled from a crawl.
//!
//! Discovered dependencies are stored in two append-only registries,
//! [`Modules`] and [`Providers`], and addressed by stable handles
//! ([`ModuleId`], [`ProviderId`]). Parent/child relationships live in
//! [`ModuleAssociations`] (a forest) and [`ProviderAssociations`] (a flat map),
//! both keyed by handle rather than by value: two modules with identical fields
//! discovered twice are two distinct nodes.
//!
//! [`Inventory`] is the aggregator: it drains the crawler's discovery stream and
//! fills all four structures in arrival order.

mod associations;

pub use associations::{ModuleAssociation, ModuleAssociations, ProviderAssociation, ProviderAssociations};

use std::collections::HashMap;
use std::fmt;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use crate::crawler::{Discovery, Found};
use crate::models::{Dependency, Module, Provider};

/// Stable handle of a discovered module.
///
/// Handles are minted by the crawler as module discoveries arrive, so a
/// module can be named as a parent before the aggregator has seen it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u64);

impl ModuleId {
    /// Wrap a raw handle value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw handle value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}", self.0)
    }
}

/// Handle of a provider inside a [`Providers`] registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(usize);

/// Modules in discovery order.
///
/// No deduplication is performed, by name, version or source.
#[derive(Debug, Default)]
pub struct Modules {
    entries: Vec<(ModuleId, Module)>,
    index: HashMap<ModuleId, usize>,
}

impl Modules {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a module under the handle it was discovered with.
    pub fn add(&mut self, id: ModuleId, module: Module) {
        if self.index.contains_key(&id) {
            warn!(module = %id, "Module handle registered twice, later entry shadows lookups");
        }
        self.index.insert(id, self.entries.len());
        self.entries.push((id, module));
    }

    /// Look a module up by handle.
    #[must_use]
    pub fn get(&self, id: ModuleId) -> Option<&Module> {
        self.index.get(&id).map(|&i| &self.entries[i].1)
    }

    /// Modules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.entries.iter().map(|(id, module)| (*id, module))
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no module has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Providers in discovery order, with no deduplication.
#[derive(Debug, Default)]
pub struct Providers {
    entries: Vec<Provider>,
}

impl Providers {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider and return its handle.
    pub fn add(&mut self, provider: Provider) -> ProviderId {
        self.entries.push(provider);
        ProviderId(self.entries.len() - 1)
    }

    /// Look a provider up by handle.
    #[must_use]
    pub fn get(&self, id: ProviderId) -> Option<&Provider> {
        self.entries.get(id.0)
    }

    /// Providers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ProviderId, &Provider)> {
        self.entries.iter().enumerate().map(|(i, provider)| (ProviderId(i), provider))
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no provider has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything a crawl discovered, ready for rendering.
#[derive(Debug, Default)]
pub struct Inventory {
    /// Every discovered module
    pub modules: Modules,
    /// Every discovered provider
    pub providers: Providers,
    /// Module to module forest rooted at the crawl root
    pub module_associations: ModuleAssociations,
    /// Module (or root) to provider map
    pub provider_associations: ProviderAssociations,
}

impl Inventory {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain a discovery stream until it closes.
    pub async fn collect(discoveries: &mut UnboundedReceiver<Discovery>) -> Self {
        let mut inventory = Self::new();
        while let Some(discovery) = discoveries.recv().await {
            inventory.record(discovery);
        }
        debug!(
            modules = inventory.modules.len(),
            providers = inventory.providers.len(),
            "Discovery stream closed"
        );
        inventory
    }

    /// Register one discovery and associate it with its parent.
    pub fn record(&mut self, discovery: Discovery) {
        match discovery.found {
            Found::Module {
                id,
                module,
            } => {
                self.modules.add(id, module);
                self.module_associations.associate(discovery.parent, id);
            }
            Found::Provider(provider) => {
                let id = self.providers.add(provider);
                self.provider_associations.associate(discovery.parent, id);
            }
        }
    }

    /// Every dependency's version record, modules first.
    pub fn dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.modules
            .iter()
            .map(|(_, module)| &module.dependency)
            .chain(self.providers.iter().map(|(_, provider)| &provider.dependency))
    }

    /// Modules whose pinned version is not the latest available.
    pub fn outdated_modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter().map(|(_, module)| module).filter(|module| module.dependency.is_outdated())
    }

    /// Whether any module has drifted from its latest version.
    #[must_use]
    pub fn has_drift(&self) -> bool {
        self.outdated_modules().next().is_some()
    }
}
