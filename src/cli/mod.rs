//! Command-line interface for tfvercheck.
//!
//! A single command: crawl a Terraform configuration tree, report module drift
//! and optionally write the dependency graph.
//!
//! ```bash
//! # Check the current directory
//! tfvercheck
//!
//! # Check a plan with a dedicated deploy key and write the graph
//! tfvercheck --directory ./infra --key ~/.ssh/deploy --graph deps.dot --html deps.html
//!
//! # Only follow modules two levels deep, skipping fixtures
//! tfvercheck --depth 2 --ignore-pattern 'test|fixtures'
//! ```
//!
//! # Exit status
//!
//! - `0`: every module is on its latest version
//! - `1`: at least one module has a newer version available
//! - `2`: the run could not complete (bad directory, config or pattern)

mod logging;

pub use logging::init_logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};

use crate::config::CheckConfig;
use crate::crawler::{Crawler, Found};
use crate::extraction::TerraformExtractor;
use crate::graph::Inventory;
use crate::render::{render_html, render_inventory};
use crate::resolver::{RemoteResolver, remove_checkouts};
use crate::utils::ProgressBar;

/// Exit status when a module has drifted from its latest version.
pub const EXIT_DRIFT: i32 = 1;

/// Exit status when the run itself failed.
pub const EXIT_FAILURE: i32 = 2;

/// Terraform module and provider version checker.
#[derive(Parser, Debug)]
#[command(
    name = "tfvercheck",
    about = "Check Terraform module and provider versions across a configuration tree",
    version,
    long_about = "Crawls a Terraform configuration tree, following git-sourced modules into \
                  their pinned versions, and reports every module that is behind its latest tag. \
                  The dependency graph can be written as Graphviz DOT or a standalone HTML page."
)]
pub struct Cli {
    /// Root Terraform plan directory
    #[arg(short, long, default_value = "./")]
    directory: PathBuf,

    /// Regex selecting the files to scan [default: .+\.tf]
    #[arg(long)]
    pattern: Option<String>,

    /// Regex naming directories to skip [default: test]
    #[arg(long, visible_alias = "ignorepattern")]
    ignore_pattern: Option<String>,

    /// SSH private key for cloning module repositories
    #[arg(short, long)]
    key: Option<String>,

    /// Also write log output to this file
    #[arg(long)]
    log: Option<PathBuf>,

    /// Write the Graphviz DOT graph to this file
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Write an HTML page rendering the graph to this file
    #[arg(long)]
    html: Option<PathBuf>,

    /// How many levels of nested modules to follow [default: 10]
    #[arg(long)]
    depth: Option<usize>,

    /// Provider registry base URL [default: https://registry.terraform.io]
    #[arg(long)]
    registry_url: Option<String>,

    /// Directory module repositories are cloned into
    #[arg(long)]
    clone_dir: Option<String>,

    /// Path to the configuration file [default: ~/.tfvercheck/config.toml]
    #[arg(short, long, env = "TFVERCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Disable the progress spinner
    #[arg(long)]
    no_progress: bool,
}

impl Cli {
    /// Run the check and return the process exit status.
    ///
    /// # Errors
    ///
    /// Returns an error if logging, configuration, the file patterns or the
    /// root directory are invalid, or if an output file cannot be written.
    pub async fn execute(self) -> Result<i32> {
        init_logging(self.verbose, self.quiet, self.log.as_deref())?;

        let config = CheckConfig::load_with_optional(self.config.clone()).await?.overlay(self.overrides());
        info!(directory = %self.directory.display(), depth = config.max_depth(), "Running tfvercheck");

        let extractor = TerraformExtractor::new(config.file_pattern(), config.ignore_pattern())?;
        let resolver_config = config.resolver_config()?;
        let clone_dir = resolver_config.clone_dir.clone();
        let resolver = RemoteResolver::new(resolver_config);
        let crawler = Crawler::new(extractor, resolver, config.max_depth());

        let mut discoveries = crawler
            .crawl(&self.directory)
            .await
            .with_context(|| format!("Failed to crawl {}", self.directory.display()))?;

        let progress = ProgressBar::new_spinner(self.no_progress || self.quiet);
        progress.set_prefix("Crawling");
        let mut inventory = Inventory::new();
        while let Some(discovery) = discoveries.recv().await {
            progress.inc(1);
            let name = match &discovery.found {
                Found::Module {
                    module,
                    ..
                } => &module.dependency.name,
                Found::Provider(provider) => &provider.dependency.name,
            };
            progress.set_message(format!("{} discovered, last: {name}", progress.position()));
            inventory.record(discovery);
        }
        progress.finish_and_clear();
        remove_checkouts(&clone_dir, inventory.modules.iter().map(|(_, module)| module)).await;

        self.write_outputs(&inventory).await?;

        for module in inventory.outdated_modules() {
            warn!(
                module = %module.dependency.name,
                source = %module.source,
                current = %module.dependency.current_version,
                latest = %module.dependency.latest_version,
                "Module is behind its latest version"
            );
        }

        let outdated = inventory.outdated_modules().count();
        info!(
            modules = inventory.modules.len(),
            providers = inventory.providers.len(),
            outdated,
            "Check complete"
        );

        Ok(if inventory.has_drift() {
            EXIT_DRIFT
        } else {
            0
        })
    }

    /// Config values given on the command line.
    fn overrides(&self) -> CheckConfig {
        CheckConfig {
            pattern: self.pattern.clone(),
            ignore_pattern: self.ignore_pattern.clone(),
            ssh_key: self.key.clone(),
            depth: self.depth,
            registry_url: self.registry_url.clone(),
            provider_namespace: None,
            clone_dir: self.clone_dir.clone(),
            git_timeout_secs: None,
        }
    }

    async fn write_outputs(&self, inventory: &Inventory) -> Result<()> {
        if self.graph.is_none() && self.html.is_none() {
            return Ok(());
        }

        let dot = render_inventory(inventory, &mut rand::rng());

        if let Some(path) = &self.graph {
            fs::write(path, &dot)
                .await
                .with_context(|| format!("Failed to write graph to {}", path.display()))?;
            info!(path = %path.display(), "Created DOT graph");
        }

        if let Some(path) = &self.html {
            let page = render_html(&dot)?;
            fs::write(path, page)
                .await
                .with_context(|| format!("Failed to write HTML to {}", path.display()))?;
            info!(path = %path.display(), "Created HTML");
        }

        Ok(())
    }
}
