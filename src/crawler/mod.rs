//! Concurrent, depth-bounded crawl of a module tree.
//!
//! The crawl starts by extracting dependency identifiers from the root
//! directory. Every identifier is resolved in its own task; resolved
//! dependencies are funnelled through a single pump which mints module handles,
//! forwards each [`Discovery`] to the consumer and, for modules within the
//! depth limit, schedules extraction of the module's checkout one level deeper.
//!
//! # Termination
//!
//! Outstanding work is tracked by a [`JoinBarrier`]. A resolution task carries
//! its [`WorkToken`] inside the signal it sends, and the pump acquires tokens for
//! any recursive work before dropping it. The barrier therefore reaches zero only
//! after the last signal has been handled; a watcher then sends a drain signal
//! and the pump closes the discovery stream exactly once.
//!
//! # Failure isolation
//!
//! Only a failure to extract the root is returned to the caller. Failures
//! while resolving an identifier or extracting a module's subtree are logged
//! and drop that subtree; everything else still arrives.

mod barrier;

pub use barrier::{JoinBarrier, WorkToken};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::core::VercheckError;
use crate::graph::ModuleId;
use crate::models::{Identifier, Module, Provider, Resolved};

/// Turns a directory into the dependency identifiers it references.
///
/// Extraction is blocking file I/O and runs on tokio's blocking pool.
pub trait Extract: Send + Sync + 'static {
    /// Identifiers referenced by configuration files below `directory`.
    fn extract(&self, directory: &Path) -> Result<Vec<Identifier>, VercheckError>;
}

/// Turns an identifier into a dependency with its version picture.
#[async_trait]
pub trait Resolve: Send + Sync + 'static {
    /// Resolve a single identifier.
    async fn resolve(&self, identifier: &Identifier) -> Result<Resolved, VercheckError>;
}

/// What a discovery carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Found {
    /// A module, with the handle minted for it
    Module {
        /// Handle later discoveries use to name this module as parent
        id: ModuleId,
        /// The resolved module
        module: Module,
    },
    /// A provider
    Provider(Provider),
}

/// One resolved dependency, tagged with where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Module whose checkout referenced this dependency, `None` for the root
    pub parent: Option<ModuleId>,
    /// Recursion depth at which it was found, root is 0
    pub depth: usize,
    /// The dependency
    pub found: Found,
}

enum Signal {
    Found {
        parent: Option<ModuleId>,
        depth: usize,
        resolved: Resolved,
        token: WorkToken,
    },
    Drained,
}

/// Crawls a directory tree with a pluggable extractor and resolver.
pub struct Crawler<E, R> {
    extractor: Arc<E>,
    resolver: Arc<R>,
    max_depth: usize,
}

impl<E: Extract, R: Resolve> Crawler<E, R> {
    /// Create a crawler that descends into modules found at depth `max_depth` or less.
    pub fn new(extractor: E, resolver: R, max_depth: usize) -> Self {
        Self {
            extractor: Arc::new(extractor),
            resolver: Arc::new(resolver),
            max_depth,
        }
    }

    /// Start crawling `root` and return the discovery stream.
    ///
    /// The stream closes once every spawned task has finished. Must be called
    /// from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a directory or cannot be extracted.
    pub async fn crawl(&self, root: impl AsRef<Path>) -> Result<UnboundedReceiver<Discovery>, VercheckError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(VercheckError::InvalidRootDirectory {
                path: root.display().to_string(),
            });
        }

        let identifiers = extract_blocking(Arc::clone(&self.extractor), root.to_path_buf()).await?;
        info!(directory = %root.display(), identifiers = identifiers.len(), "Extracted root directory");

        let (signals, signal_rx) = mpsc::unbounded_channel();
        let (discoveries, discovery_rx) = mpsc::unbounded_channel();
        let run = Arc::new(Run {
            extractor: Arc::clone(&self.extractor),
            resolver: Arc::clone(&self.resolver),
            barrier: JoinBarrier::new(),
            signals,
            max_depth: self.max_depth,
        });

        run.launch(identifiers, None, 0);
        tokio::spawn(watch(Arc::clone(&run)));
        tokio::spawn(pump(run, signal_rx, discoveries));

        Ok(discovery_rx)
    }
}

struct Run<E, R> {
    extractor: Arc<E>,
    resolver: Arc<R>,
    barrier: Arc<JoinBarrier>,
    signals: UnboundedSender<Signal>,
    max_depth: usize,
}

impl<E: Extract, R: Resolve> Run<E, R> {
    /// Spawn one resolution task per identifier.
    fn launch(self: &Arc<Self>, identifiers: Vec<Identifier>, parent: Option<ModuleId>, depth: usize) {
        for identifier in identifiers {
            let token = self.barrier.acquire();
            let run = Arc::clone(self);
            tokio::spawn(async move {
                match run.resolver.resolve(&identifier).await {
                    Ok(resolved) => {
                        let dependency = resolved.dependency();
                        debug!(
                            %identifier,
                            depth,
                            current = %dependency.current_version,
                            latest = %dependency.latest_version,
                            "Resolved"
                        );
                        // A closed channel drops the token along with the signal
                        let _ = run.signals.send(Signal::Found {
                            parent,
                            depth,
                            resolved,
                            token,
                        });
                    }
                    Err(err) if err.is_structural() => {
                        error!(%identifier, error = %err, "Malformed dependency reference");
                    }
                    Err(err) => {
                        warn!(%identifier, error = %err, "Failed to resolve dependency");
                    }
                }
            });
        }
    }

    /// Extract a module checkout and resolve what it references.
    async fn descend(self: Arc<Self>, directory: PathBuf, parent: ModuleId, depth: usize, token: WorkToken) {
        match extract_blocking(Arc::clone(&self.extractor), directory.clone()).await {
            Ok(identifiers) => {
                debug!(module = %parent, depth, identifiers = identifiers.len(), "Extracted module");
                self.launch(identifiers, Some(parent), depth);
            }
            Err(err) => {
                warn!(module = %parent, directory = %directory.display(), error = %err, "Failed to extract module");
            }
        }
        drop(token);
    }
}

async fn extract_blocking<E: Extract>(extractor: Arc<E>, directory: PathBuf) -> Result<Vec<Identifier>, VercheckError> {
    tokio::task::spawn_blocking(move || extractor.extract(&directory)).await.map_err(|e| VercheckError::Other {
        message: format!("Extraction task failed: {e}"),
    })?
}

async fn watch<E: Extract, R: Resolve>(run: Arc<Run<E, R>>) {
    run.barrier.wait().await;
    let _ = run.signals.send(Signal::Drained);
}

async fn pump<E: Extract, R: Resolve>(
    run: Arc<Run<E, R>>,
    mut signals: UnboundedReceiver<Signal>,
    discoveries: UnboundedSender<Discovery>,
) {
    let mut next_id = 0;
    while let Some(signal) = signals.recv().await {
        let (parent, depth, resolved, token) = match signal {
            Signal::Drained => break,
            Signal::Found {
                parent,
                depth,
                resolved,
                token,
            } => (parent, depth, resolved, token),
        };

        let found = match resolved {
            Resolved::Module(module) => {
                let id = ModuleId::new(next_id);
                next_id += 1;
                if depth <= run.max_depth {
                    info!(module = %module.dependency.name, depth, "Parsing submodule");
                    let work = run.barrier.acquire();
                    tokio::spawn(Arc::clone(&run).descend(module.path.clone(), id, depth + 1, work));
                }
                Found::Module {
                    id,
                    module,
                }
            }
            Resolved::Provider(provider) => Found::Provider(provider),
        };

        if discoveries
            .send(Discovery {
                parent,
                depth,
                found,
            })
            .is_err()
        {
            debug!("Discovery consumer dropped");
        }
        drop(token);
    }
    debug!(modules = next_id, "Crawl finished");
}
