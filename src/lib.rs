//! tfvercheck - Terraform module and provider version checker
//!
//! Inventories the modules and providers referenced across a Terraform
//! configuration tree, resolves the versions each one could be on, and renders
//! the result as a dependency graph that highlights version drift.
//!
//! # Architecture Overview
//!
//! ```text
//! root dir ──▶ Crawler ──(Discovery stream)──▶ Inventory ──▶ render ──▶ DOT / HTML
//!               │  ▲
//!   Extract ────┘  └──── Resolve (git clone + tags, registry lookup)
//! ```
//!
//! - The [`crawler`] extracts identifiers from a directory, resolves each one
//!   concurrently and descends into every resolved module's checkout until the
//!   depth limit. It emits [`crawler::Discovery`] events in no particular order
//!   across siblings, but always after the event for their parent.
//! - The [`graph`] module folds those events into a module forest plus a flat
//!   module-to-provider map.
//! - The [`render`] module turns the graph into Graphviz DOT, coloring each
//!   top-level branch, and can wrap it into an HTML page.
//!
//! # Modules
//!
//! - [`cli`] - Command-line entry point and log setup
//! - [`config`] - Optional `~/.tfvercheck/config.toml`
//! - [`core`] - Error types and user-facing error reporting
//! - [`crawler`] - Concurrent, depth-bounded recursive discovery
//! - [`extraction`] - Line-oriented scanning of `.tf` files
//! - [`git`] - System git wrapper and module source parsing
//! - [`graph`] - Module handles, registries and associations
//! - [`models`] - Dependency, module and provider records
//! - [`render`] - DOT and HTML output
//! - [`resolver`] - Git and registry backed resolution
//! - [`utils`] - Platform helpers and progress display
//! - [`version`] - Semantic version parsing and comparison

pub mod cli;
pub mod config;
pub mod core;
pub mod crawler;
pub mod extraction;
pub mod git;
pub mod graph;
pub mod models;
pub mod render;
pub mod resolver;
pub mod utils;
pub mod version;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
