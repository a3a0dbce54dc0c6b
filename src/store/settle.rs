use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::state::{Mutation, StateCell};

/// How an action hands `fetched = true` back to its subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlePolicy {
    /// Commit right away, before the action returns.
    Immediate,
    /// Commit after the delay unless a newer action starts first.
    Debounced(Duration),
}

type Pending = Arc<Mutex<Option<CancellationToken>>>;

/// Owns at most one pending delayed `fetched` commit.
///
/// Every commit to the `fetched` flag made through the settler happens while
/// holding `pending`, so a timer that lost the race to `mark_fetching` can
/// never land after it.
#[derive(Default)]
pub struct Settler {
    pending: Pending,
}

impl Settler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lower `fetched` and drop the pending delayed commit in one step.
    pub fn mark_fetching(&self, cell: &StateCell) {
        let mut pending = lock(&self.pending);
        cancel(pending.take());
        cell.commit(Mutation::MarkFetching);
    }

    /// Raise `fetched` per `policy`. `on_settled` runs once the commit landed
    /// or once a newer `mark_fetching`/settle superseded it.
    pub fn settle<F>(&self, policy: SettlePolicy, cell: &Arc<StateCell>, on_settled: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match policy {
            SettlePolicy::Immediate => {
                {
                    let mut pending = lock(&self.pending);
                    cancel(pending.take());
                    cell.commit(Mutation::MarkFetched);
                }
                on_settled();
            }
            SettlePolicy::Debounced(delay) => self.schedule(delay, Arc::clone(cell), on_settled),
        }
    }

    fn schedule<F>(&self, delay: Duration, cell: Arc<StateCell>, on_settled: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let token = CancellationToken::new();
        cancel(lock(&self.pending).replace(token.clone()));

        let pending = Arc::clone(&self.pending);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => debug!("pending settle superseded"),
                _ = tokio::time::sleep(delay) => {
                    let _pending = lock(&pending);
                    if !token.is_cancelled() {
                        cell.commit(Mutation::MarkFetched);
                        // Spent; cancelling it later is a no-op.
                        token.cancel();
                    }
                }
            }
            on_settled();
        });
    }
}

fn lock(pending: &Mutex<Option<CancellationToken>>) -> MutexGuard<'_, Option<CancellationToken>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

fn cancel(token: Option<CancellationToken>) {
    if let Some(token) = token {
        token.cancel();
    }
}
