//! Loading engine: binds model collections to shared batch states.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::model::{Model, ModelSet};
use crate::state::BatchState;

/// Entry point for binding models.
///
/// An engine is immutable configuration; cloning it is cheap and clones
/// share nothing mutable. Each batch state keeps a clone so that fetched
/// relations can be bound into the same engine.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration for this engine.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Binds a collection of models to shared batch states.
    ///
    /// The collection is normalized to an ordered sequence of references
    /// (see [`ModelSet`]). If every model is already bound to one and the
    /// same batch, nothing happens. Otherwise the whole sequence is split
    /// into contiguous chunks of at most `batch_size` models and each
    /// chunk gets a fresh batch state. Models that were bound elsewhere are
    /// moved onto the new states.
    ///
    /// Never fails and never touches anything but the handles.
    pub fn init_handles<S: ModelSet + ?Sized>(&self, models: &S) {
        let refs = models.model_refs();
        if refs.is_empty() {
            return;
        }
        if !needs_bind(&refs) {
            trace!(models = refs.len(), "models already share a batch, skipping bind");
            return;
        }
        self.bind(&refs);
    }

    /// Moves plain model values into shared storage and binds them.
    ///
    /// The returned vector is that storage: callers keep using it, and every
    /// reference handed out by the loader points into it.
    pub fn bind_values<M, I>(&self, values: I) -> Vec<Arc<M>>
    where
        M: Model,
        I: IntoIterator<Item = M>,
    {
        let models: Vec<Arc<M>> = values.into_iter().map(Arc::new).collect();
        self.init_handles(&models);
        models
    }

    fn bind<M: Model>(&self, models: &[Arc<M>]) {
        let batch_size = self.config.effective_batch_size();
        let mut batches = 0_usize;
        for chunk in models.chunks(batch_size) {
            let state = Arc::new(BatchState::new(self.clone(), chunk));
            for model in chunk {
                model.handle().attach(Arc::clone(&state));
            }
            batches += 1;
        }
        metrics::counter!(crate::metrics::MODELS_BOUND_TOTAL).increment(models.len() as u64);
        debug!(models = models.len(), batches, batch_size, "bound models");
    }
}

/// A bind is needed when some model is unbound or the models disagree on
/// their batch.
fn needs_bind<M: Model>(models: &[Arc<M>]) -> bool {
    let Some(first) = models[0].handle().state() else {
        return true;
    };
    models[1..]
        .iter()
        .any(|model| !model.handle().is_attached_to(&first))
}
