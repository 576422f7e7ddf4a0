//! Error types for batched loading.

use std::any::type_name;
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Boxed error accepted from builders and fetch functions.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Errors reported by [`resolve`](crate::resolve()), [`many`](crate::many) and
/// [`one`](crate::one).
///
/// The type is cheap to clone: a published build error is shared by every
/// caller of the same (batch, cache key) pair.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// The requesting model was never bound to a batch.
    #[error("model not initialized with loader")]
    NotInitialized,

    /// The cache key was already used on this batch with a different result
    /// type, or the batch was bound for another model type.
    #[error("cache key '{cache_key}' used with incompatible type (expected {expected})")]
    TypeMismatch {
        cache_key: String,
        expected: &'static str,
    },

    /// The loader reached a state that correct use cannot produce.
    #[error("internal loader error: {message}")]
    InternalInvariant { message: String },

    /// Error returned by a builder or fetch function, passed through as is.
    #[error(transparent)]
    Upstream(Arc<dyn StdError + Send + Sync>),
}

impl LoadError {
    /// Wraps a builder or fetch error.
    ///
    /// A `LoadError` coming back from a nested load is returned unchanged
    /// instead of being wrapped a second time.
    pub fn upstream(err: impl Into<BoxError>) -> Self {
        match err.into().downcast::<LoadError>() {
            Ok(load_err) => *load_err,
            Err(other) => LoadError::Upstream(Arc::from(other)),
        }
    }

    pub(crate) fn type_mismatch<T: ?Sized>(cache_key: &str) -> Self {
        LoadError::TypeMismatch {
            cache_key: cache_key.to_string(),
            expected: type_name::<T>(),
        }
    }

    /// Returns the upstream error as `E` if it has that concrete type.
    pub fn downcast_upstream<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            LoadError::Upstream(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns true for [`LoadError::NotInitialized`].
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, LoadError::NotInitialized)
    }
}

/// Published when the caller running a builder is dropped before it finishes.
///
/// Callers waiting on that build receive it as [`LoadError::Upstream`], and it
/// stays cached for the key until [`Handle::reset`](crate::Handle::reset).
#[derive(Debug, Error)]
#[error("build for cache key '{cache_key}' was cancelled")]
pub struct BuildCancelled {
    pub cache_key: String,
}

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("connection refused")]
    struct ConnectionRefused;

    #[test]
    fn test_upstream_preserves_message_and_type() {
        let err = LoadError::upstream(ConnectionRefused);

        assert_eq!(err.to_string(), "connection refused");
        assert!(err.downcast_upstream::<ConnectionRefused>().is_some());
        assert!(err.downcast_upstream::<std::fmt::Error>().is_none());
    }

    #[test]
    fn test_upstream_does_not_rewrap_load_errors() {
        let err = LoadError::upstream(LoadError::NotInitialized);

        assert!(err.is_not_initialized());
    }

    #[test]
    fn test_upstream_accepts_string_errors() {
        let err = LoadError::upstream("query timed out");

        assert!(matches!(err, LoadError::Upstream(_)));
        assert_eq!(err.to_string(), "query timed out");
    }

    #[test]
    fn test_build_cancelled_is_recoverable_from_upstream() {
        let err = LoadError::upstream(BuildCancelled {
            cache_key: "books".to_string(),
        });

        let cancelled = err.downcast_upstream::<BuildCancelled>().unwrap();
        assert_eq!(cancelled.cache_key, "books");
        assert!(err.to_string().contains("'books' was cancelled"));
    }

    #[test]
    fn test_type_mismatch_names_expected_type() {
        let err = LoadError::type_mismatch::<String>("greet");

        let message = err.to_string();
        assert!(message.contains("greet"));
        assert!(message.contains("String"));
    }
}
