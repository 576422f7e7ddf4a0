//! Loader metrics.
//!
//! Counters are recorded through the `metrics` facade; nothing is exported
//! unless the application installs a recorder.

/// Total number of resolver builds started.
pub const RESOLVER_BUILDS_TOTAL: &str = "lode_resolver_builds_total";
/// Total number of resolve calls served from an already published outcome.
pub const RESOLVER_CACHE_HITS_TOTAL: &str = "lode_resolver_cache_hits_total";
/// Total number of resolver builds that published an error.
pub const RESOLVER_BUILD_ERRORS_TOTAL: &str = "lode_resolver_build_errors_total";
/// Total number of models attached to a batch state.
pub const MODELS_BOUND_TOTAL: &str = "lode_models_bound_total";
/// Total number of batched relation fetches.
pub const RELATION_FETCHES_TOTAL: &str = "lode_relation_fetches_total";

/// Registers loader metric descriptions.
///
/// Call once during application startup, after installing a recorder.
/// Optional; it only improves the exported documentation.
///
/// ```ignore
/// use lode_core::metrics::register_loader_metrics;
///
/// register_loader_metrics();
/// ```
pub fn register_loader_metrics() {
    metrics::describe_counter!(RESOLVER_BUILDS_TOTAL, "Total number of resolver builds");
    metrics::describe_counter!(
        RESOLVER_CACHE_HITS_TOTAL,
        "Total number of resolve calls served from cache"
    );
    metrics::describe_counter!(
        RESOLVER_BUILD_ERRORS_TOTAL,
        "Total number of resolver builds that failed"
    );
    metrics::describe_counter!(MODELS_BOUND_TOTAL, "Total number of models bound to a batch");
    metrics::describe_counter!(
        RELATION_FETCHES_TOTAL,
        "Total number of batched relation fetches"
    );
}
