use super::{ModuleId, ProviderId};

/// One node of the module forest.
///
/// `module` is `None` only for the synthetic node standing for the crawl root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleAssociation {
    /// Module this node represents
    pub module: Option<ModuleId>,
    /// Indices of child nodes
    pub children: Vec<usize>,
}

/// Module to module relationships, stored as an arena of nodes.
///
/// Associating `(parent, child)` appends a fresh child node under the first
/// node whose module is `parent`; when no such node exists a new parent node
/// is created first. Callers must therefore associate top-down: associating a
/// grandchild before its parent produces a second, detached parent node.
#[derive(Debug, Default, Clone)]
pub struct ModuleAssociations {
    nodes: Vec<ModuleAssociation>,
}

impl ModuleAssociations {
    /// Create an empty forest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `child` below `parent` (`None` for the crawl root).
    pub fn associate(&mut self, parent: Option<ModuleId>, child: ModuleId) {
        let parent_index = self.find(parent);
        let child_index = self.nodes.len();
        self.nodes.push(ModuleAssociation {
            module: Some(child),
            children: Vec::new(),
        });

        match parent_index {
            Some(parent_index) => self.nodes[parent_index].children.push(child_index),
            None => self.nodes.push(ModuleAssociation {
                module: parent,
                children: vec![child_index],
            }),
        }
    }

    /// Index of the first node holding `module`.
    #[must_use]
    pub fn find(&self, module: Option<ModuleId>) -> Option<usize> {
        self.nodes.iter().position(|node| node.module == module)
    }

    /// Node at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` was not produced by this forest.
    #[must_use]
    pub fn node(&self, index: usize) -> &ModuleAssociation {
        &self.nodes[index]
    }

    /// Every node in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = (usize, &ModuleAssociation)> {
        self.nodes.iter().enumerate()
    }

    /// Indices of the top-level branches, the children of the crawl root.
    #[must_use]
    pub fn branches(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .filter(|node| node.module.is_none())
            .flat_map(|node| node.children.iter().copied())
            .collect()
    }

    /// Whether the subtree at `index` holds `target`, the node itself included.
    #[must_use]
    pub fn branch_contains(&self, index: usize, target: ModuleId) -> bool {
        let node = &self.nodes[index];
        if node.module == Some(target) {
            return true;
        }
        node.children.iter().any(|&child| self.branch_contains(child, target))
    }

    /// Whether some node for `parent` has a direct child node for `child`.
    #[must_use]
    pub fn contains(&self, parent: Option<ModuleId>, child: ModuleId) -> bool {
        self.nodes.iter().filter(|node| node.module == parent).any(|node| {
            node.children.iter().any(|&c| self.nodes[c].module == Some(child))
        })
    }

    /// Number of nodes, synthetic root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing has been associated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Providers referenced by one module, or by the crawl root when `module` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAssociation {
    /// Referencing module
    pub module: Option<ModuleId>,
    /// Referenced providers
    pub providers: Vec<ProviderId>,
}

/// Module to provider relationships.
///
/// Insertion scans linearly for the parent's entry, which is fine for the
/// size of a configuration tree.
#[derive(Debug, Default, Clone)]
pub struct ProviderAssociations {
    entries: Vec<ProviderAssociation>,
}

impl ProviderAssociations {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `parent` references `provider`.
    pub fn associate(&mut self, parent: Option<ModuleId>, provider: ProviderId) {
        match self.entries.iter_mut().find(|entry| entry.module == parent) {
            Some(entry) => entry.providers.push(provider),
            None => self.entries.push(ProviderAssociation {
                module: parent,
                providers: vec![provider],
            }),
        }
    }

    /// Entries in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &ProviderAssociation> {
        self.entries.iter()
    }

    /// Whether `parent` is recorded as referencing `provider`.
    #[must_use]
    pub fn contains(&self, parent: Option<ModuleId>, provider: ProviderId) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.module == parent && entry.providers.contains(&provider))
    }

    /// Number of distinct parents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been associated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Providers;
    use crate::models::Provider;

    fn id(raw: u64) -> ModuleId {
        ModuleId::new(raw)
    }

    #[test]
    fn test_same_parent_shares_one_node() {
        let mut assocs = ModuleAssociations::new();
        assocs.associate(Some(id(1)), id(2));
        assocs.associate(Some(id(1)), id(3));

        let parents: Vec<_> =
            assocs.nodes().filter(|(_, node)| node.module == Some(id(1))).collect();
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].1.children.len(), 2);
        assert!(assocs.contains(Some(id(1)), id(2)));
        assert!(assocs.contains(Some(id(1)), id(3)));
    }

    #[test]
    fn test_module_to_module_associations() {
        let mut assocs = ModuleAssociations::new();
        let pairs = [(None, id(1)), (Some(id(1)), id(2)), (Some(id(2)), id(3)), (Some(id(1)), id(3))];
        for (parent, child) in pairs {
            assocs.associate(parent, child);
        }
        for (parent, child) in pairs {
            assert!(assocs.contains(parent, child), "{parent:?} not associated to {child}");
        }
        assert_eq!(assocs.branches().len(), 1);
    }

    #[test]
    fn test_out_of_order_association_duplicates_parent() {
        let mut assocs = ModuleAssociations::new();
        assocs.associate(Some(id(2)), id(3));
        assocs.associate(Some(id(1)), id(2));

        let nodes_for_2 = assocs.nodes().filter(|(_, node)| node.module == Some(id(2))).count();
        assert_eq!(nodes_for_2, 2);
    }

    #[test]
    fn test_branch_contains() {
        let mut assocs = ModuleAssociations::new();
        assocs.associate(None, id(1));
        assocs.associate(None, id(4));
        assocs.associate(Some(id(1)), id(2));
        assocs.associate(Some(id(2)), id(3));

        let branches = assocs.branches();
        assert_eq!(branches.len(), 2);
        assert!(assocs.branch_contains(branches[0], id(1)));
        assert!(assocs.branch_contains(branches[0], id(3)));
        assert!(!assocs.branch_contains(branches[0], id(4)));
        assert!(assocs.branch_contains(branches[1], id(4)));
        assert!(!assocs.branch_contains(branches[1], id(9)));
    }

    #[test]
    fn test_module_to_provider_associations() {
        let mut providers = Providers::new();
        let p1 = providers.add(Provider::default());
        let p2 = providers.add(Provider::default());

        let mut assocs = ProviderAssociations::new();
        let pairs = [(Some(id(1)), p1), (Some(id(1)), p2), (Some(id(2)), p2)];
        for (parent, provider) in pairs {
            assocs.associate(parent, provider);
        }
        for (parent, provider) in pairs {
            assert!(assocs.contains(parent, provider));
        }
        assert_eq!(assocs.len(), 2);
        assert!(!assocs.contains(None, p1));
    }
}
