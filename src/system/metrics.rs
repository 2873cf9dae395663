//! Metrics collection for the feed store
//!
//! Prometheus counters for the store primitives and the mutation operations,
//! registered once in a process-global registry.

use crate::core::error::Result;
use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramTimer, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

/// Global metrics registry
static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Counters and timings for everything the store does
pub struct Metrics {
    /// Documents returned by `read`
    pub documents_read: IntCounter,
    /// Documents replaced by `write`
    pub documents_written: IntCounter,
    /// Documents stored by `add`
    pub documents_added: IntCounter,
    /// Documents removed by `delete`
    pub documents_deleted: IntCounter,
    /// Mutation operations started, by operation name
    pub mutations: IntCounterVec,
    /// Mutation durations in seconds, by operation name
    pub mutation_duration: HistogramVec,
    /// Foreign keys that pointed at missing documents
    pub dangling_references: IntCounter,
}

impl Metrics {
    /// Create and register a metrics set in `registry`
    pub fn new(registry: &Registry) -> Result<Self> {
        let metrics = Self {
            documents_read: IntCounter::new(
                "feedstore_documents_read_total",
                "Total number of documents read",
            )?,
            documents_written: IntCounter::new(
                "feedstore_documents_written_total",
                "Total number of documents written back",
            )?,
            documents_added: IntCounter::new(
                "feedstore_documents_added_total",
                "Total number of documents added",
            )?,
            documents_deleted: IntCounter::new(
                "feedstore_documents_deleted_total",
                "Total number of documents deleted",
            )?,
            mutations: IntCounterVec::new(
                Opts::new("feedstore_mutations_total", "Total number of mutation operations"),
                &["operation"],
            )?,
            mutation_duration: HistogramVec::new(
                HistogramOpts::new(
                    "feedstore_mutation_duration_seconds",
                    "Duration of mutation operations in seconds",
                )
                .buckets(vec![0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05]),
                &["operation"],
            )?,
            dangling_references: IntCounter::new(
                "feedstore_dangling_references_total",
                "Total number of unresolvable foreign keys encountered",
            )?,
        };

        registry.register(Box::new(metrics.documents_read.clone()))?;
        registry.register(Box::new(metrics.documents_written.clone()))?;
        registry.register(Box::new(metrics.documents_added.clone()))?;
        registry.register(Box::new(metrics.documents_deleted.clone()))?;
        registry.register(Box::new(metrics.mutations.clone()))?;
        registry.register(Box::new(metrics.mutation_duration.clone()))?;
        registry.register(Box::new(metrics.dangling_references.clone()))?;

        Ok(metrics)
    }

    /// Get the global metrics instance
    pub fn global() -> &'static Metrics {
        static INSTANCE: Lazy<Metrics> = Lazy::new(|| {
            Metrics::new(&REGISTRY).expect("Failed to initialize metrics")
        });
        &INSTANCE
    }

    /// Count a mutation and time it until the returned timer is dropped
    pub fn start_mutation(&self, operation: &str) -> HistogramTimer {
        self.mutations.with_label_values(&[operation]).inc();
        self.mutation_duration
            .with_label_values(&[operation])
            .start_timer()
    }
}

/// Get the Prometheus registry holding the store metrics
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Collect and return all metrics in the Prometheus text exposition format
pub fn gather_text() -> String {
    let _ = Metrics::global();
    let encoder = prometheus::TextEncoder::new();
    let metric_families = registry().gather();
    encoder.encode_to_string(&metric_families).unwrap_or_default()
}
