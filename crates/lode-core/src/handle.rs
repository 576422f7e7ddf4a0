//! Per-model slot holding the model's batch state.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::engine::Engine;
use crate::state::BatchState;

/// Capability slot embedded in every model.
///
/// A handle starts unbound. [`Engine::init_handles`] attaches it to the
/// batch state shared by every model bound in the same call (or
/// partition). Attachment must finish before the model is resolved
/// concurrently; loading itself only reads the slot.
///
/// Cloning produces an unbound handle: a handle belongs to exactly one
/// model instance, so a cloned model has to be bound again.
#[derive(Default)]
pub struct Handle {
    state: ArcSwapOption<BatchState>,
}

impl Handle {
    /// Creates an unbound handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every cached resolver of this handle's batch.
    ///
    /// The clear is visible to all models sharing the batch, and the batch
    /// state itself is kept, so those models stay bound. No-op when unbound.
    pub fn reset(&self) {
        if let Some(state) = &*self.state.load() {
            state.clear();
        }
    }

    /// Returns true once the handle has been attached to a batch.
    pub fn is_bound(&self) -> bool {
        self.state.load().is_some()
    }

    /// Returns true if both handles point at the same batch state.
    pub fn shares_batch_with(&self, other: &Handle) -> bool {
        match (&*self.state.load(), &*other.state.load()) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Number of models bound into this handle's batch, or `None` when unbound.
    pub fn batch_len(&self) -> Option<usize> {
        self.state.load().as_deref().map(BatchState::len)
    }

    /// Number of cache keys currently held by this handle's batch.
    pub fn cached_keys(&self) -> usize {
        self.state
            .load()
            .as_deref()
            .map_or(0, BatchState::cached_keys)
    }

    pub(crate) fn state(&self) -> Option<Arc<BatchState>> {
        self.state.load_full()
    }

    pub(crate) fn engine(&self) -> Option<Engine> {
        self.state
            .load()
            .as_deref()
            .map(|state| state.engine().clone())
    }

    pub(crate) fn attach(&self, state: Arc<BatchState>) {
        self.state.store(Some(state));
    }

    pub(crate) fn is_attached_to(&self, state: &Arc<BatchState>) -> bool {
        match &*self.state.load() {
            Some(current) => Arc::ptr_eq(current, state),
            None => false,
        }
    }
}

impl Clone for Handle {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("bound", &self.is_bound())
            .field("batch_len", &self.batch_len())
            .finish()
    }
}
