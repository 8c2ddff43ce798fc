use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

/// Counts outstanding crawl work across every recursion level.
///
/// Each unit of work holds a [`WorkToken`]; dropping the last token wakes
/// [`JoinBarrier::wait`]. Work that spawns further work must acquire the new
/// tokens before releasing its own, so the count can only reach zero once
/// nothing is left that could produce more.
#[derive(Debug, Default)]
pub struct JoinBarrier {
    outstanding: AtomicUsize,
    idle: Notify,
}

impl JoinBarrier {
    /// Create a barrier with no outstanding work.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register one unit of work.
    #[must_use = "dropping the token immediately releases the work again"]
    pub fn acquire(self: &Arc<Self>) -> WorkToken {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        WorkToken {
            barrier: Arc::clone(self),
        }
    }

    /// Current number of live tokens.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Resolve once no token is alive.
    pub async fn wait(&self) {
        loop {
            // Register interest before checking so a release in between is not missed
            let notified = self.idle.notified();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn release(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Proof of one outstanding unit of work. Released on drop.
#[derive(Debug)]
pub struct WorkToken {
    barrier: Arc<JoinBarrier>,
}

impl Drop for WorkToken {
    fn drop(&mut self) {
        self.barrier.release();
    }
}
