//! Crawl real `.tf` trees on disk with a resolver that maps module sources to
//! local directories instead of cloning them.

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tfvercheck::core::VercheckError;
use tfvercheck::crawler::{Crawler, Resolve};
use tfvercheck::extraction::{DEFAULT_FILE_PATTERN, DEFAULT_IGNORE_PATTERN, TerraformExtractor};
use tfvercheck::git::decompose_source_uri;
use tfvercheck::graph::{Inventory, ModuleId, ProviderId};
use tfvercheck::models::{Dependency, Identifier, Module, Provider, Resolved};
use tfvercheck::render::render_inventory;
use tfvercheck::test_utils::init_test_logging;

/// Serves module checkouts from `checkouts` (keyed by repository name) and
/// provider versions from `providers`.
struct LocalResolver {
    checkouts: PathBuf,
    modules: HashMap<&'static str, Vec<String>>,
    providers: HashMap<&'static str, Vec<String>>,
}

#[async_trait]
impl Resolve for LocalResolver {
    async fn resolve(&self, identifier: &Identifier) -> Result<Resolved, VercheckError> {
        match identifier {
            Identifier::Module {
                source_uri,
            } => {
                let source = decompose_source_uri(source_uri)?;
                let versions = self.modules.get(source.repo_name.as_str()).cloned().unwrap_or_default();
                let path = self.checkouts.join(source.repo_name.trim_end_matches(".git"));
                Ok(Resolved::Module(Module {
                    dependency: Dependency::new(source.repo_name, source.reference, versions),
                    source: source.clone_uri,
                    path,
                }))
            }
            Identifier::Provider {
                name,
                constraint,
            } => {
                let versions = self.providers.get(name.as_str()).cloned().unwrap_or_default();
                Ok(Resolved::Provider(Provider {
                    dependency: Dependency::new(name.clone(), constraint.clone(), versions),
                }))
            }
        }
    }
}

fn versions(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

fn write(dir: &Path, content: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("main.tf"), content).unwrap();
}

/// root -> network.git@v1.0.0 -> dns.git@v2.0.0, one provider at each level.
fn layout(temp: &TempDir) -> (PathBuf, LocalResolver) {
    let root = temp.path().join("plan");
    let checkouts = temp.path().join("checkouts");

    write(
        &root,
        r#"module "network" {
  source = "git::ssh://git@example.com/org/network.git?ref=v1.0.0"
}

terraform {
  required_providers {
    helm = "~> 1.2.0"
  }
}
"#,
    );
    write(
        &checkouts.join("network"),
        r#"module "dns" {
  source = "git::ssh://git@example.com/org/dns.git?ref=v2.0.0"
}

terraform {
  required_providers {
    azurerm = "~> 2.1.0"
  }
}
"#,
    );
    write(
        &checkouts.join("dns"),
        r#"terraform {
  required_providers {
    random = "~> 3.0.0"
  }
}
"#,
    );

    let resolver = LocalResolver {
        checkouts,
        modules: HashMap::from([
            ("network.git", versions(&["v1.0.0", "v1.1.0"])),
            ("dns.git", versions(&["v1.0.0", "v2.0.0"])),
        ]),
        providers: HashMap::from([
            ("helm", versions(&["v1.2.0", "v1.3.0"])),
            ("azurerm", versions(&["v2.1.0"])),
            ("random", versions(&["v3.0.0"])),
        ]),
    };
    (root, resolver)
}

async fn crawl(root: &Path, resolver: LocalResolver, max_depth: usize) -> Inventory {
    let extractor = TerraformExtractor::new(DEFAULT_FILE_PATTERN, DEFAULT_IGNORE_PATTERN).unwrap();
    let crawler = Crawler::new(extractor, resolver, max_depth);
    let mut discoveries = crawler.crawl(root).await.unwrap();
    Inventory::collect(&mut discoveries).await
}

fn module_id(inventory: &Inventory, name: &str) -> ModuleId {
    inventory.modules.iter().find(|(_, m)| m.dependency.name == name).map(|(id, _)| id).unwrap()
}

fn provider_id(inventory: &Inventory, name: &str) -> ProviderId {
    inventory.providers.iter().find(|(_, p)| p.dependency.name == name).map(|(id, _)| id).unwrap()
}

fn edge_color<'a>(dot: &'a str, prefix: &str) -> &'a str {
    let line = dot.lines().find(|line| line.trim_start().starts_with(prefix)).unwrap();
    let start = line.find("[color=\"").unwrap() + "[color=\"".len();
    let end = line[start..].find('"').unwrap() + start;
    &line[start..end]
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_nested_modules_are_associated() {
    init_test_logging(None);
    let temp = TempDir::new().unwrap();
    let (root, resolver) = layout(&temp);

    let inventory = crawl(&root, resolver, 10).await;
    assert_eq!(inventory.modules.len(), 2);
    assert_eq!(inventory.providers.len(), 3);

    let network = module_id(&inventory, "network.git");
    let dns = module_id(&inventory, "dns.git");
    assert!(inventory.module_associations.contains(None, network));
    assert!(inventory.module_associations.contains(Some(network), dns));
    assert!(!inventory.module_associations.contains(None, dns));

    assert!(inventory.provider_associations.contains(None, provider_id(&inventory, "helm")));
    assert!(inventory.provider_associations.contains(Some(network), provider_id(&inventory, "azurerm")));
    assert!(inventory.provider_associations.contains(Some(dns), provider_id(&inventory, "random")));

    // network is pinned behind its latest tag; dns is current
    let outdated: Vec<&str> = inventory.outdated_modules().map(|m| m.dependency.name.as_str()).collect();
    assert_eq!(outdated, vec!["network.git"]);
    assert!(inventory.has_drift());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_depth_limit_stops_descent() {
    let temp = TempDir::new().unwrap();
    let (root, resolver) = layout(&temp);

    // Root modules are still read, but nothing found inside them is
    let inventory = crawl(&root, resolver, 0).await;
    let mut names: Vec<&str> = inventory.dependencies().map(|d| d.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["azurerm", "dns.git", "helm", "network.git"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rendered_branch_shares_one_color() {
    let temp = TempDir::new().unwrap();
    let (root, resolver) = layout(&temp);
    let inventory = crawl(&root, resolver, 10).await;

    let dot = render_inventory(&inventory, &mut StdRng::seed_from_u64(42));

    assert!(dot.starts_with("digraph G {\n\trankdir=LR;\n"));
    assert!(dot.contains(
        "\t\"network.git\" [label=\"<name> network.git | <fv1.0.0> v1.0.0 | <fv1.1.0> v1.1.0\", shape=\"record\"];"
    ));
    assert!(dot.contains("\t\"dns.git\" [label=\"<name> dns.git | <fv2.0.0> v2.0.0\", shape=\"record\"];"));

    let branch = edge_color(&dot, "\"root\":\"flatest\" -> \"network.git\"");
    assert!(!branch.is_empty());
    assert_eq!(edge_color(&dot, "\"network.git\":\"fv1.0.0\" -> \"dns.git\""), branch);
    assert_eq!(edge_color(&dot, "\"network.git\":\"fv1.0.0\" -> \"azurerm\""), branch);
    assert_eq!(edge_color(&dot, "\"dns.git\":\"fv2.0.0\" -> \"random\""), branch);
    assert_eq!(edge_color(&dot, "\"root\":\"flatest\" -> \"helm\""), "black");
}
