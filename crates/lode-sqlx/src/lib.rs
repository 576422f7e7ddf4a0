//! lode-sqlx: SQLx adapter for batched relation loading
//!
//! This crate connects `lode-core` relations to SQLite through SQLx:
//! - `fetch_in` builds the fetch function of a relation as one
//!   `SELECT ... WHERE column IN (...)` query per batch
//! - `BoundPool` runs queries and binds every returned model before
//!   handing it out, so accessors work on freshly loaded rows
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 lode-sqlx                   │
//! ├─────────────────────────────────────────────┤
//! │  error.rs - AdapterError                    │
//! │  fetch.rs - IN-list fetch functions         │
//! │  pool.rs  - Pool wrapper that binds rows    │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod fetch;
pub mod pool;

// Re-export commonly used types
pub use error::{AdapterError, AdapterResult};
pub use fetch::{fetch_in, validate_identifier, FetchFuture};
pub use pool::{BoundPool, PoolConfig};
