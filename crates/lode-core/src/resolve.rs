//! Memoized per-key builders.
//!
//! [`resolve`] turns a per-model request into one batched computation: the
//! first request for a cache key hands the whole batch to the builder, and
//! every model of the batch then reads its own answer from the published
//! resolver.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::{BoxError, LoadError, LoadResult};
use crate::metrics::{
    RESOLVER_BUILDS_TOTAL, RESOLVER_BUILD_ERRORS_TOTAL, RESOLVER_CACHE_HITS_TOTAL,
};
use crate::model::Model;
use crate::state::Outcome;

/// Per-model projection produced once per batch and cache key.
pub type ResolverFn<M, R> = Arc<dyn Fn(&M) -> R + Send + Sync>;

/// Wraps a closure as a [`ResolverFn`].
pub fn resolver_fn<M, R, F>(f: F) -> ResolverFn<M, R>
where
    F: Fn(&M) -> R + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Request for [`resolve`].
pub struct ResolveSpec<'a, M, B> {
    /// Identifies the resolver within the model's batch.
    pub cache_key: &'a str,
    /// The requesting model; `None` yields the zero result.
    pub model: Option<&'a M>,
    /// Builds the resolver from the full batch.
    pub build: B,
}

impl<'a, M, B> ResolveSpec<'a, M, B> {
    /// Creates a resolve request.
    pub fn new(cache_key: &'a str, model: impl Into<Option<&'a M>>, build: B) -> Self {
        Self {
            cache_key,
            model: model.into(),
            build,
        }
    }
}

/// Resolves `spec.model` through the resolver cached under `spec.cache_key`.
///
/// The builder receives every live model of the requester's batch and runs
/// at most once per (batch, cache key), however many models ask and however
/// concurrently. Callers arriving while it runs wait for it. Its outcome,
/// error included, is reused until [`Handle::reset`](crate::Handle::reset).
///
/// The resolver applies to any model bound to the batch, including one whose
/// `Arc` is no longer alive and so was not handed to the builder.
///
/// Dropping the caller that runs the builder publishes a
/// [`BuildCancelled`](crate::BuildCancelled) error, which every waiter on the
/// key receives. Dropping a waiting caller affects nobody else.
///
/// # Errors
///
/// - [`LoadError::NotInitialized`] if the model was never bound.
/// - [`LoadError::TypeMismatch`] if the key already holds a resolver with
///   another result type.
/// - [`LoadError::Upstream`] with the builder's error, or with
///   [`BuildCancelled`](crate::BuildCancelled).
pub async fn resolve<M, R, B, Fut, E>(spec: ResolveSpec<'_, M, B>) -> LoadResult<R>
where
    M: Model,
    R: Default + 'static,
    B: FnOnce(Vec<Arc<M>>) -> Fut,
    Fut: Future<Output = Result<ResolverFn<M, R>, E>>,
    E: Into<BoxError>,
{
    let ResolveSpec {
        cache_key,
        model,
        build,
    } = spec;
    let Some(model) = model else {
        return Ok(R::default());
    };
    let state = model.handle().state().ok_or(LoadError::NotInitialized)?;
    let entry = state.entry(cache_key);

    let outcome = match entry.get() {
        Some(outcome) => {
            trace!(cache_key, "resolver cache hit");
            metrics::counter!(RESOLVER_CACHE_HITS_TOTAL).increment(1);
            outcome.clone()
        }
        None => {
            entry
                .get_or_build(cache_key, || async {
                    match state.live_members::<M>() {
                        Some(members) => run_build(cache_key, members, build).await,
                        None => Err(LoadError::type_mismatch::<M>(cache_key)),
                    }
                })
                .await
        }
    };

    apply(&outcome, cache_key, model)
}

async fn run_build<M, R, B, Fut, E>(cache_key: &str, members: Vec<Arc<M>>, build: B) -> Outcome
where
    M: Model,
    R: 'static,
    B: FnOnce(Vec<Arc<M>>) -> Fut,
    Fut: Future<Output = Result<ResolverFn<M, R>, E>>,
    E: Into<BoxError>,
{
    let batch_len = members.len();
    metrics::counter!(RESOLVER_BUILDS_TOTAL).increment(1);
    match build(members).await {
        Ok(resolver) => {
            debug!(cache_key, batch_len, "built resolver");
            Ok(Arc::new(resolver) as Arc<dyn Any + Send + Sync>)
        }
        Err(err) => {
            let err = LoadError::upstream(err);
            warn!(cache_key, batch_len, error = %err, "resolver build failed");
            metrics::counter!(RESOLVER_BUILD_ERRORS_TOTAL).increment(1);
            Err(err)
        }
    }
}

fn apply<M, R>(outcome: &Outcome, cache_key: &str, model: &M) -> LoadResult<R>
where
    M: Model,
    R: 'static,
{
    let published = outcome.as_ref().map_err(LoadError::clone)?;
    let resolver = published
        .downcast_ref::<ResolverFn<M, R>>()
        .ok_or_else(|| LoadError::type_mismatch::<R>(cache_key))?;
    Ok(resolver(model))
}
