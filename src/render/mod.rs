//! Graphviz DOT rendering of a crawl's association graph.
//!
//! The output is a left-to-right `digraph` with one record node per distinct
//! dependency name. Each record lists the versions that some dependency of that
//! name actually uses (as its current or latest version), and every edge lands
//! on the port of the version its target is pinned to:
//!
//! ```text
//! digraph G {
//!     rankdir=LR;
//!     "root" [label="<name> root | <flatest> latest", shape="record"];
//!     "network.git" [label="<name> network.git | <fv1.0.0> v1.0.0 | <fv1.2.0> v1.2.0", shape="record"];
//!     "root":"flatest" -> "network.git":"fv1.0.0" [color="steelblue"];
//! }
//! ```
//!
//! # Coloring
//!
//! Each top-level module (a direct child of the crawl root) opens a branch and
//! gets its own palette color; every edge below it shares that color. Provider
//! edges take the color of the branch their parent module belongs to, black
//! when attached to the root, and no color when the parent sits in no branch.

pub mod html;
pub mod palette;

pub use html::render_html;
pub use palette::{PALETTE, ROOT_COLOR, pick_color};

use std::collections::HashMap;
use std::fmt::Write as _;

use rand::Rng;
use tracing::debug;

use crate::graph::{Inventory, ModuleAssociations, ModuleId, Modules, ProviderAssociations, Providers};
use crate::models::Dependency;
use crate::version;

const ROOT_NODE: &str = "root";
const ROOT_PORT: &str = "flatest";

/// One side of an edge: a node and the version port on it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoint {
    node: String,
    port: String,
}

impl Endpoint {
    fn root() -> Self {
        Self {
            node: ROOT_NODE.to_string(),
            port: ROOT_PORT.to_string(),
        }
    }

    fn of(dependency: &Dependency) -> Self {
        Self {
            node: dependency.name.clone(),
            port: port_id(&dependency.current_version),
        }
    }
}

#[derive(Debug)]
struct Edge {
    from: Endpoint,
    to: Endpoint,
    color: String,
}

/// Port name for a version: `f` followed by its canonical form.
fn port_id(version: &str) -> String {
    format!("f{}", version::canonicalize(version))
}

/// Wrap text in a double-quoted DOT identifier.
fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\\\""))
}

/// Escape characters with a meaning inside record labels.
fn escape_record(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '{' | '}' | '|' | '<' | '>') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Record label for the node named `name`, given every dependency sharing it.
fn record_label(name: &str, same_name: &[&Dependency]) -> String {
    let mut versions: Vec<String> = same_name
        .iter()
        .flat_map(|dep| dep.versions.iter())
        .filter(|v| version::is_valid(v))
        .filter(|v| {
            same_name.iter().any(|dep| {
                version::same_version(v, &dep.current_version) || version::same_version(v, &dep.latest_version)
            })
        })
        .cloned()
        .collect();
    version::sort_versions(&mut versions);

    let mut canonical: Vec<String> = versions.iter().map(|v| version::canonicalize(v)).collect();
    canonical.dedup();

    let mut label = format!("<name> {}", escape_record(name));
    for v in canonical {
        let _ = write!(label, " | <f{v}> {v}");
    }
    label
}

/// Render the association graph as DOT.
///
/// `rng` drives branch color selection; pass a seeded generator for
/// reproducible output.
pub fn render<R: Rng>(
    modules: &Modules,
    providers: &Providers,
    module_associations: &ModuleAssociations,
    provider_associations: &ProviderAssociations,
    rng: &mut R,
) -> String {
    // Nodes, one per distinct name in first-seen order
    let mut by_name: Vec<(&str, Vec<&Dependency>)> = Vec::new();
    let dependencies = modules
        .iter()
        .map(|(_, module)| &module.dependency)
        .chain(providers.iter().map(|(_, provider)| &provider.dependency));
    for dep in dependencies {
        match by_name.iter_mut().find(|(name, _)| *name == dep.name) {
            Some((_, deps)) => deps.push(dep),
            None => by_name.push((dep.name.as_str(), vec![dep])),
        }
    }

    // Module edges, one color per top-level branch
    let mut edges = Vec::new();
    let mut colors: HashMap<ModuleId, &'static str> = HashMap::new();
    let mut used: Vec<&'static str> = Vec::new();
    let branches = module_associations.branches();
    for &branch in &branches {
        let Some(id) = module_associations.node(branch).module else {
            continue;
        };
        let Some(module) = modules.get(id) else {
            debug!(module = %id, "Branch module missing from registry");
            continue;
        };

        let color = pick_color(rng, &used);
        used.push(color);
        colors.insert(id, color);

        let to = Endpoint::of(&module.dependency);
        edges.push(Edge {
            from: Endpoint::root(),
            to: to.clone(),
            color: color.to_string(),
        });
        connect_children(modules, module_associations, branch, &to, color, &mut edges);
    }

    // Provider edges, colored by the branch holding their parent
    for association in provider_associations.iter() {
        let (from, color) = match association.module {
            None => (Endpoint::root(), ROOT_COLOR),
            Some(id) => {
                let Some(module) = modules.get(id) else {
                    debug!(module = %id, "Provider parent missing from registry");
                    continue;
                };
                let color = branches
                    .iter()
                    .find(|&&branch| module_associations.branch_contains(branch, id))
                    .and_then(|&branch| module_associations.node(branch).module)
                    .and_then(|branch_module| colors.get(&branch_module).copied())
                    .unwrap_or("");
                (Endpoint::of(&module.dependency), color)
            }
        };

        for &provider_id in &association.providers {
            if let Some(provider) = providers.get(provider_id) {
                edges.push(Edge {
                    from: from.clone(),
                    to: Endpoint::of(&provider.dependency),
                    color: color.to_string(),
                });
            }
        }
    }

    let mut out = String::from("digraph G {\n\trankdir=LR;\n");
    let _ = writeln!(
        out,
        "\t{} [label={}, shape=\"record\"];",
        quote(ROOT_NODE),
        quote(&format!("<name> root | <{ROOT_PORT}> latest"))
    );
    for (name, same_name) in &by_name {
        let _ = writeln!(
            out,
            "\t{} [label={}, shape=\"record\"];",
            quote(name),
            quote(&record_label(name, same_name))
        );
    }
    for edge in &edges {
        let _ = writeln!(
            out,
            "\t{}:{} -> {}:{} [color={}];",
            quote(&edge.from.node),
            quote(&edge.from.port),
            quote(&edge.to.node),
            quote(&edge.to.port),
            quote(&edge.color)
        );
    }
    out.push_str("}\n");

    debug!(nodes = by_name.len() + 1, edges = edges.len(), branches = branches.len(), "Rendered graph");
    out
}

/// Emit edges from the module at `index` to each child, recursively.
fn connect_children(
    modules: &Modules,
    associations: &ModuleAssociations,
    index: usize,
    from: &Endpoint,
    color: &str,
    edges: &mut Vec<Edge>,
) {
    for &child in &associations.node(index).children {
        let Some(module) = associations.node(child).module.and_then(|id| modules.get(id)) else {
            continue;
        };
        let to = Endpoint::of(&module.dependency);
        edges.push(Edge {
            from: from.clone(),
            to: to.clone(),
            color: color.to_string(),
        });
        connect_children(modules, associations, child, &to, color, edges);
    }
}

/// Render everything an [`Inventory`] holds.
pub fn render_inventory<R: Rng>(inventory: &Inventory, rng: &mut R) -> String {
    render(
        &inventory.modules,
        &inventory.providers,
        &inventory.module_associations,
        &inventory.provider_associations,
        rng,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Module, Provider};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn versions(list: &[&str]) -> Vec<String> {
        list.iter().map(|v| v.to_string()).collect()
    }

    fn module(name: &str, current: &str, available: &[&str]) -> Module {
        Module {
            dependency: Dependency::new(name, current, versions(available)),
            ..Module::default()
        }
    }

    fn provider(name: &str, current: &str, available: &[&str]) -> Provider {
        Provider {
            dependency: Dependency::new(name, current, versions(available)),
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    /// Edge lines as (source, target, color) triples.
    fn edges(dot: &str) -> Vec<(String, String, String)> {
        dot.lines()
            .filter(|line| line.contains("->"))
            .map(|line| {
                let line = line.trim().trim_end_matches(';');
                let (route, attrs) = line.split_once(" [color=").unwrap();
                let (from, to) = route.split_once(" -> ").unwrap();
                (from.to_string(), to.to_string(), attrs.trim_end_matches(']').trim_matches('"').to_string())
            })
            .collect()
    }

    #[test]
    fn test_graph_without_branches() {
        let mut modules = Modules::new();
        let m1 = ModuleId::new(1);
        let m2 = ModuleId::new(2);
        modules.add(m1, module("Mod1", "v1", &["v1", "v2", "v3"]));
        modules.add(m2, module("Mod2", "v1", &["v1", "v2", "v3", "v4"]));

        let mut providers = Providers::new();
        let p1 = providers.add(provider("Dep1", "v1", &[]));
        let p2 = providers.add(provider("Dep1", "v1", &[]));
        let p3 = providers.add(provider("Dep2", "v1", &["v2", "v3"]));

        let mut module_associations = ModuleAssociations::new();
        module_associations.associate(Some(m1), m2);

        let mut provider_associations = ProviderAssociations::new();
        provider_associations.associate(Some(m1), p1);
        provider_associations.associate(Some(m1), p2);
        provider_associations.associate(Some(m1), p3);
        provider_associations.associate(Some(m2), p3);

        let dot = render(&modules, &providers, &module_associations, &provider_associations, &mut rng());
        let expected = r#"digraph G {
	rankdir=LR;
	"root" [label="<name> root | <flatest> latest", shape="record"];
	"Mod1" [label="<name> Mod1 | <fv1.0.0> v1.0.0 | <fv3.0.0> v3.0.0", shape="record"];
	"Mod2" [label="<name> Mod2 | <fv1.0.0> v1.0.0 | <fv4.0.0> v4.0.0", shape="record"];
	"Dep1" [label="<name> Dep1", shape="record"];
	"Dep2" [label="<name> Dep2 | <fv3.0.0> v3.0.0", shape="record"];
	"Mod1":"fv1.0.0" -> "Dep1":"fv1.0.0" [color=""];
	"Mod1":"fv1.0.0" -> "Dep1":"fv1.0.0" [color=""];
	"Mod1":"fv1.0.0" -> "Dep2":"fv1.0.0" [color=""];
	"Mod2":"fv1.0.0" -> "Dep2":"fv1.0.0" [color=""];
}
"#;
        assert_eq!(dot, expected);
    }

    #[test]
    fn test_two_modules_and_a_provider_at_root() {
        let mut inventory = Inventory::new();
        let a = ModuleId::new(0);
        let b = ModuleId::new(1);
        inventory.modules.add(a, module("network.git", "v1.0.0", &["v1.0.0", "v1.2.0"]));
        inventory.modules.add(b, module("dns.git", "v2.0.0", &["v2.0.0"]));
        inventory.module_associations.associate(None, a);
        inventory.module_associations.associate(None, b);
        let helm = inventory.providers.add(provider("helm", "v0.10", &["v0.10.4", "v1.0.0"]));
        inventory.provider_associations.associate(None, helm);

        let dot = render_inventory(&inventory, &mut rng());

        let node_lines = dot.lines().filter(|l| l.contains("shape=\"record\"")).count();
        assert_eq!(node_lines, 4, "root plus three dependencies");

        let edges = edges(&dot);
        assert_eq!(edges.len(), 3);
        let root_to_modules: Vec<_> = edges.iter().filter(|(_, to, _)| to.contains(".git")).collect();
        assert_eq!(root_to_modules.len(), 2);
        assert!(root_to_modules.iter().all(|(from, _, _)| from == r#""root":"flatest""#));
        assert_ne!(root_to_modules[0].2, root_to_modules[1].2);
        assert!(root_to_modules.iter().all(|(_, _, color)| PALETTE.contains(&color.as_str())));

        let provider_edge = edges.iter().find(|(_, to, _)| to.starts_with(r#""helm""#)).unwrap();
        assert_eq!(provider_edge.0, r#""root":"flatest""#);
        assert_eq!(provider_edge.1, r#""helm":"fv0.10.0""#);
        assert_eq!(provider_edge.2, ROOT_COLOR);
        assert!(inventory.has_drift());
    }

    #[test]
    fn test_branch_color_propagates() {
        let mut inventory = Inventory::new();
        let top = ModuleId::new(0);
        let mid = ModuleId::new(1);
        let leaf = ModuleId::new(2);
        let other = ModuleId::new(3);
        inventory.modules.add(top, module("top", "v1.0.0", &["v1.0.0"]));
        inventory.modules.add(mid, module("mid", "v1.0.0", &["v1.0.0"]));
        inventory.modules.add(leaf, module("leaf", "v1.0.0", &["v1.0.0"]));
        inventory.modules.add(other, module("other", "v1.0.0", &["v1.0.0"]));
        inventory.module_associations.associate(None, top);
        inventory.module_associations.associate(None, other);
        inventory.module_associations.associate(Some(top), mid);
        inventory.module_associations.associate(Some(mid), leaf);

        let azurerm = inventory.providers.add(provider("azurerm", "v1.41", &[]));
        let helm = inventory.providers.add(provider("helm", "v0.10", &[]));
        inventory.provider_associations.associate(Some(leaf), azurerm);
        inventory.provider_associations.associate(Some(other), helm);

        let dot = render_inventory(&inventory, &mut rng());
        let edges = edges(&dot);
        let color_of = |to: &str| {
            edges.iter().find(|(_, target, _)| target.starts_with(&format!("\"{to}\""))).unwrap().2.clone()
        };

        let branch = color_of("top");
        assert_eq!(color_of("mid"), branch);
        assert_eq!(color_of("leaf"), branch);
        assert_eq!(color_of("azurerm"), branch, "provider of a leaf module takes its branch color");
        assert_eq!(color_of("helm"), color_of("other"));
        assert_ne!(color_of("other"), branch);

        let leaf_edge = edges.iter().find(|(_, to, _)| to.starts_with("\"leaf\"")).unwrap();
        assert_eq!(leaf_edge.0, r#""mid":"fv1.0.0""#);
    }

    #[test]
    fn test_same_name_collapses_to_one_node() {
        let mut inventory = Inventory::new();
        let a = ModuleId::new(0);
        let b = ModuleId::new(1);
        inventory.modules.add(a, module("vpc.git", "v1.0.0", &["v1.0.0", "v1.1.0", "v2.0.0"]));
        inventory.modules.add(b, module("vpc.git", "v1.1.0", &["v1.0.0", "v1.1.0", "v2.0.0"]));
        inventory.module_associations.associate(None, a);
        inventory.module_associations.associate(None, b);

        let dot = render_inventory(&inventory, &mut rng());
        let nodes: Vec<_> = dot.lines().filter(|l| l.trim_start().starts_with("\"vpc.git\" [")).collect();
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].contains(
            "<name> vpc.git | <fv1.0.0> v1.0.0 | <fv1.1.0> v1.1.0 | <fv2.0.0> v2.0.0"
        ));

        let targets: Vec<_> = edges(&dot).into_iter().map(|(_, to, _)| to).collect();
        assert_eq!(targets, vec![r#""vpc.git":"fv1.0.0""#, r#""vpc.git":"fv1.1.0""#]);
    }

    #[test]
    fn test_labels_sort_and_canonicalize() {
        let deps = [
            Dependency::new("m", "v1.10", versions(&["v1.10", "v1.2.0", "v1.9.0", "v2.0.0-rc.1+b7"])),
            Dependency::new("m", "v1.2", Vec::new()),
        ];
        let refs: Vec<&Dependency> = deps.iter().collect();
        assert_eq!(
            record_label("m", &refs),
            "<name> m | <fv1.2.0> v1.2.0 | <fv1.10.0> v1.10.0 | <fv2.0.0-rc.1+b7> v2.0.0-rc.1+b7"
        );

        let deps = [Dependency::new("m", "v1", versions(&["v1.0.0", "v1.0.0+other", "v0.9.0"]))];
        let refs: Vec<&Dependency> = deps.iter().collect();
        assert_eq!(record_label("m", &refs), "<name> m | <fv1.0.0> v1.0.0 | <fv1.0.0+other> v1.0.0+other");
    }

    #[test]
    fn test_seeded_output_is_reproducible() {
        let mut inventory = Inventory::new();
        for i in 0..5 {
            let id = ModuleId::new(i);
            inventory.modules.add(id, module(&format!("m{i}"), "v1.0.0", &["v1.0.0"]));
            inventory.module_associations.associate(None, id);
        }
        let first = render_inventory(&inventory, &mut StdRng::seed_from_u64(9));
        let second = render_inventory(&inventory, &mut StdRng::seed_from_u64(9));
        assert_eq!(first, second);

        let colors: std::collections::HashSet<_> = edges(&first).into_iter().map(|(_, _, c)| c).collect();
        assert_eq!(colors.len(), 5);
    }

    #[test]
    fn test_record_text_is_escaped() {
        assert_eq!(escape_record("a|b"), "a\\|b");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
    }
}
