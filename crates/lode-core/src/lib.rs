//! lode-core: Batched relation loading for model collections
//!
//! This crate binds groups of models to a shared per-batch state so that
//! per-model accessor calls collapse into one batched computation per
//! cache key. The calling convention stays per-model:
//!
//! ```rust,ignore
//! for author in &authors {
//!     // One fetch for every author in the batch, not one per author.
//!     let books = author.books(&db).await?;
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 lode-core                   │
//! ├─────────────────────────────────────────────┤
//! │  model.rs    - Model trait & input shapes   │
//! │  handle.rs   - Per-model state slot         │
//! │  engine.rs   - Binding & batch partitioning │
//! │  state.rs    - Shared batch state           │
//! │  resolve.rs  - Memoized per-key builders    │
//! │  relation.rs - Many / One relation loading  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Guarantees
//!
//! - A builder runs at most once per (batch state, cache key), no matter
//!   how many models of the batch ask for that key or how concurrently.
//! - Binding is idempotent and never fails.
//! - Published outcomes (including errors) stay cached until
//!   [`Handle::reset`] clears the batch.

pub mod config;
pub mod engine;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod model;
pub mod relation;
pub mod resolve;
mod state;

#[cfg(test)]
mod testing;

// Re-export commonly used types at the crate root
pub use config::{ConfigError, EngineConfig, DEFAULT_BATCH_SIZE};
pub use engine::Engine;
pub use error::{BoxError, BuildCancelled, LoadError, LoadResult};
pub use handle::Handle;
pub use model::{Model, ModelSet};
pub use relation::{many, one, RelationSpec};
pub use resolve::{resolve, resolver_fn, ResolveSpec, ResolverFn};
