//! Batch state shared by every model bound together.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tokio::sync::{watch, OnceCell};
use tracing::warn;

use crate::engine::Engine;
use crate::error::{BuildCancelled, LoadError};
use crate::metrics::RESOLVER_BUILD_ERRORS_TOTAL;
use crate::model::Model;

/// Published outcome of a builder: a type-erased resolver or the build error.
pub(crate) type Outcome = Result<Arc<dyn Any + Send + Sync>, LoadError>;

/// Memoized builder slot for one cache key.
///
/// The first caller claims the slot and runs the build; later callers wait
/// for its outcome. The cell is written at most once and every caller of the
/// key observes the same outcome. If the claiming caller is dropped before
/// its build finishes, a [`BuildCancelled`] error is published in its place.
pub(crate) struct BuilderEntry {
    outcome: OnceCell<Outcome>,
    claimed: AtomicBool,
    published: watch::Sender<bool>,
}

impl Default for BuilderEntry {
    fn default() -> Self {
        let (published, _) = watch::channel(false);
        Self {
            outcome: OnceCell::new(),
            claimed: AtomicBool::new(false),
            published,
        }
    }
}

impl BuilderEntry {
    /// The published outcome, if the builder already ran.
    pub(crate) fn get(&self) -> Option<&Outcome> {
        self.outcome.get()
    }

    /// Runs `build` unless another caller already claimed the slot, then
    /// returns the published outcome.
    pub(crate) async fn get_or_build<F, Fut>(&self, cache_key: &str, build: F) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        if self.claimed.swap(true, Ordering::AcqRel) {
            return self.wait(cache_key).await;
        }

        let guard = PublishGuard {
            entry: self,
            cache_key,
            completed: false,
        };
        let outcome = build().await;
        guard.complete(outcome.clone());
        outcome
    }

    async fn wait(&self, cache_key: &str) -> Outcome {
        let mut published = self.published.subscribe();
        // Only fails once the sender is gone, and the entry owns it.
        let _ = published.wait_for(|done| *done).await;
        match self.outcome.get() {
            Some(outcome) => outcome.clone(),
            None => Err(LoadError::InternalInvariant {
                message: format!("builder for '{cache_key}' finished without an outcome"),
            }),
        }
    }

    fn publish(&self, outcome: Outcome) {
        // The claim admits a single publisher.
        let _ = self.outcome.set(outcome);
        self.published.send_replace(true);
    }
}

/// Publishes a cancellation if the claiming caller never completes.
struct PublishGuard<'a> {
    entry: &'a BuilderEntry,
    cache_key: &'a str,
    completed: bool,
}

impl PublishGuard<'_> {
    fn complete(mut self, outcome: Outcome) {
        self.entry.publish(outcome);
        self.completed = true;
    }
}

impl Drop for PublishGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            warn!(cache_key = self.cache_key, "resolver build cancelled");
            metrics::counter!(RESOLVER_BUILD_ERRORS_TOTAL).increment(1);
            self.entry.publish(Err(LoadError::upstream(BuildCancelled {
                cache_key: self.cache_key.to_string(),
            })));
        }
    }
}

/// State shared by reference among all models of one batch.
///
/// Members are held weakly (`Vec<Weak<M>>`, type-erased): models keep the
/// state alive through their handles, never the other way around.
pub(crate) struct BatchState {
    engine: Engine,
    members: Box<dyn Any + Send + Sync>,
    len: usize,
    entries: DashMap<String, Arc<BuilderEntry>>,
}

impl BatchState {
    pub(crate) fn new<M: Model>(engine: Engine, members: &[Arc<M>]) -> Self {
        let weak: Vec<Weak<M>> = members.iter().map(Arc::downgrade).collect();
        Self {
            engine,
            members: Box::new(weak),
            len: members.len(),
            entries: DashMap::new(),
        }
    }

    /// The engine that bound this batch.
    pub(crate) fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Number of models bound into the batch.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Members still alive, in binding order.
    ///
    /// Returns `None` if the batch was bound for a model type other than `M`.
    pub(crate) fn live_members<M: Model>(&self) -> Option<Vec<Arc<M>>> {
        self.members
            .downcast_ref::<Vec<Weak<M>>>()
            .map(|members| members.iter().filter_map(Weak::upgrade).collect())
    }

    /// Looks up the builder entry for `cache_key`, creating it if missing.
    ///
    /// Only the shard holding the key is locked, so unrelated keys do not
    /// serialize. The returned entry is detached from the map guard.
    pub(crate) fn entry(&self, cache_key: &str) -> Arc<BuilderEntry> {
        if let Some(entry) = self.entries.get(cache_key) {
            return Arc::clone(entry.value());
        }
        let entry = self.entries.entry(cache_key.to_string()).or_default();
        Arc::clone(entry.value())
    }

    /// Number of cache keys with an entry.
    pub(crate) fn cached_keys(&self) -> usize {
        self.entries.len()
    }

    /// Drops every builder entry.
    pub(crate) fn clear(&self) {
        self.entries.clear();
    }
}

impl fmt::Debug for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchState")
            .field("len", &self.len)
            .field("cached_keys", &self.entries.len())
            .finish()
    }
}
