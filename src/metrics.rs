/// Prometheus instrumentation for the traversal engine.
///
/// Everything registers into a dedicated registry so the exposition endpoint
/// only ever reports our own metrics.
use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Latency buckets for traversal and path-search histograms (seconds).
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0];

lazy_static! {
    /// Registry backing `GET /metrics`.
    pub static ref REGISTRY: Registry = Registry::new();

    /// Completed traversals by algorithm.
    /// Labels: algo (dfs, bfs)
    pub static ref TRAVERSALS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("orbgraph_traversals_total", "Completed traversals by algorithm"),
        &["algo"]
    ).unwrap();

    /// Traversal wall-clock time by algorithm.
    pub static ref TRAVERSAL_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "orbgraph_traversal_duration_seconds",
            "Traversal wall-clock time by algorithm"
        ).buckets(LATENCY_BUCKETS.to_vec()),
        &["algo"]
    ).unwrap();

    /// Unique transactions accumulated into result graphs.
    pub static ref TXS_COLLECTED: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "orbgraph_transactions_collected_total",
            "Unique transactions accumulated into result graphs"
        ),
        &["algo"]
    ).unwrap();

    /// Store lookups that failed and were treated as empty data.
    pub static ref STORE_MISSES: IntCounter = IntCounter::new(
        "orbgraph_store_misses_total",
        "Store lookups that failed and were treated as empty data"
    ).unwrap();

    /// Path enumerations started.
    pub static ref PATH_SEARCHES: IntCounter = IntCounter::new(
        "orbgraph_path_searches_total",
        "All-simple-paths enumerations started"
    ).unwrap();

    /// Path enumerations that hit the wall-clock budget.
    pub static ref PATH_TIMEOUTS: IntCounter = IntCounter::new(
        "orbgraph_path_timeouts_total",
        "Path enumerations aborted by the wall-clock budget"
    ).unwrap();
}

/// Register every metric with the registry. Call once at startup; repeat
/// registrations are ignored so tests can call this freely.
pub fn register_metrics() {
    let _ = REGISTRY.register(Box::new(TRAVERSALS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(TRAVERSAL_DURATION.clone()));
    let _ = REGISTRY.register(Box::new(TXS_COLLECTED.clone()));
    let _ = REGISTRY.register(Box::new(STORE_MISSES.clone()));
    let _ = REGISTRY.register(Box::new(PATH_SEARCHES.clone()));
    let _ = REGISTRY.register(Box::new(PATH_TIMEOUTS.clone()));
}

/// Text exposition of the registry for `GET /metrics`.
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!(error = %err, "metrics encoding failed");
    }
    String::from_utf8(buffer).unwrap_or_default()
}
