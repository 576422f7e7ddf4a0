//! Configuration for the loading engine.

use serde::{Deserialize, Serialize};

/// Default number of models sharing one batch state.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Engine configuration.
///
/// Deserializable so that applications can embed it in their own
/// configuration files:
///
/// ```yaml
/// engine:
///   batch_size: 1000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of models bound to one batch state.
    ///
    /// Larger batches mean fewer fetches but larger `IN (...)` key sets.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Errors produced when validating an [`EngineConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The batch size cannot hold any model.
    #[error("engine.batch_size must be greater than 0, got {0}")]
    InvalidBatchSize(usize),
}

impl EngineConfig {
    /// Sets the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }
        Ok(())
    }

    /// Batch size used for partitioning; never zero.
    pub(crate) fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}
