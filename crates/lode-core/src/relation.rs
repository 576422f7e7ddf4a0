//! Batched one-to-many and many-to-one relation loading.
//!
//! Both helpers are built on [`resolve`]: the builder gathers the join keys
//! of the whole batch, calls the fetch function once, binds the fetched
//! relations into one new batch and groups them by key.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexSet;
use tracing::debug;

use crate::error::{BoxError, LoadError, LoadResult};
use crate::metrics::RELATION_FETCHES_TOTAL;
use crate::model::Model;
use crate::resolve::{resolve, resolver_fn, ResolveSpec};

/// Request for [`many`] and [`one`].
///
/// - `model_key` extracts the join key from a parent model. `None` means the
///   parent has no related rows (a null foreign key, for instance).
/// - `relation_key` extracts the join key from a fetched relation.
/// - `fetch` receives the distinct keys of the batch, in first-seen order,
///   and returns the matching relations as plain values.
pub struct RelationSpec<'a, M, MK, RK, F> {
    pub cache_key: &'a str,
    pub model: Option<&'a M>,
    pub model_key: MK,
    pub relation_key: RK,
    pub fetch: F,
}

impl<'a, M, MK, RK, F> RelationSpec<'a, M, MK, RK, F> {
    /// Creates a relation request.
    pub fn new(
        cache_key: &'a str,
        model: impl Into<Option<&'a M>>,
        model_key: MK,
        relation_key: RK,
        fetch: F,
    ) -> Self {
        Self {
            cache_key,
            model: model.into(),
            model_key,
            relation_key,
            fetch,
        }
    }
}

/// Loads every relation whose key matches the model's key.
///
/// Returns an empty vector when the model is absent or has no key; in that
/// case nothing is fetched and the model does not even need to be bound.
/// Otherwise the first call for `cache_key` in the model's batch fetches for
/// the whole batch and later calls are served from the cache.
///
/// Fetched relations are bound together into one new batch, so their own
/// accessors batch across every parent of the original batch.
///
/// # Errors
///
/// Same as [`resolve`]; a fetch error is returned as
/// [`LoadError::Upstream`] to every caller of the batch.
pub async fn many<M, Rel, K, MK, RK, F, Fut, E>(
    spec: RelationSpec<'_, M, MK, RK, F>,
) -> LoadResult<Vec<Arc<Rel>>>
where
    M: Model,
    Rel: Model,
    K: Eq + Hash + Send + Sync + 'static,
    MK: Fn(&M) -> Option<K> + Send + Sync + 'static,
    RK: Fn(&Rel) -> K,
    F: FnOnce(Vec<K>) -> Fut,
    Fut: Future<Output = Result<Vec<Rel>, E>>,
    E: Into<BoxError>,
{
    let RelationSpec {
        cache_key,
        model,
        model_key,
        relation_key,
        fetch,
    } = spec;
    let Some(model) = model else {
        return Ok(Vec::new());
    };
    if model_key(model).is_none() {
        return Ok(Vec::new());
    }
    let engine = model.handle().engine().ok_or(LoadError::NotInitialized)?;

    resolve(ResolveSpec::new(
        cache_key,
        model,
        |members: Vec<Arc<M>>| async move {
            let keys: IndexSet<K> = members.iter().filter_map(|m| model_key(m)).collect();
            metrics::counter!(RELATION_FETCHES_TOTAL).increment(1);
            debug!(cache_key, keys = keys.len(), "fetching relation");

            let fetched = fetch(keys.into_iter().collect()).await?;
            let relations = engine.bind_values(fetched);

            let mut grouped: HashMap<K, Vec<Arc<Rel>>> = HashMap::new();
            for relation in relations {
                grouped
                    .entry(relation_key(&relation))
                    .or_default()
                    .push(relation);
            }
            Ok::<_, E>(resolver_fn(move |m: &M| {
                model_key(m)
                    .and_then(|key| grouped.get(&key).cloned())
                    .unwrap_or_default()
            }))
        },
    ))
    .await
}

/// Loads the first relation whose key matches the model's key.
///
/// Behaves like [`many`] and keeps only the first match; `None` when there
/// is none, the model is absent, or the model has no key.
pub async fn one<M, Rel, K, MK, RK, F, Fut, E>(
    spec: RelationSpec<'_, M, MK, RK, F>,
) -> LoadResult<Option<Arc<Rel>>>
where
    M: Model,
    Rel: Model,
    K: Eq + Hash + Send + Sync + 'static,
    MK: Fn(&M) -> Option<K> + Send + Sync + 'static,
    RK: Fn(&Rel) -> K,
    F: FnOnce(Vec<K>) -> Fut,
    Fut: Future<Output = Result<Vec<Rel>, E>>,
    E: Into<BoxError>,
{
    Ok(many(spec).await?.into_iter().next())
}
