//! Prometheus metrics for filter evaluation.

use prometheus_client::metrics::counter::Counter;
use prometheus_client::registry::Registry;

/// Container for all Prometheus metrics.
///
/// Counters are cheap to clone and update atomically, so one instance can be
/// shared by every thread of a parallel search.
pub struct FilterMetrics {
    registry: Registry,

    /// Counter of documents evaluated, whatever the outcome.
    pub documents_evaluated_total: Counter,

    /// Counter of documents that passed the filter.
    pub documents_passed_total: Counter,

    /// Counter of documents whose value could not be read.
    pub evaluation_errors_total: Counter,

    /// Counter of segments that had no values for the filtered field.
    pub segments_missing_field_total: Counter,
}

impl Default for FilterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterMetrics {
    /// Create a new metrics registry with all metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        // exposed with a `_total` suffix
        let documents_evaluated_total = Counter::default();
        registry.register(
            "fastfilter_documents_evaluated",
            "Total number of documents evaluated by fast filters",
            documents_evaluated_total.clone(),
        );

        let documents_passed_total = Counter::default();
        registry.register(
            "fastfilter_documents_passed",
            "Total number of documents that passed a fast filter",
            documents_passed_total.clone(),
        );

        let evaluation_errors_total = Counter::default();
        registry.register(
            "fastfilter_evaluation_errors",
            "Total number of documents whose value could not be evaluated",
            evaluation_errors_total.clone(),
        );

        let segments_missing_field_total = Counter::default();
        registry.register(
            "fastfilter_segments_missing_field",
            "Total number of segments without values for the filtered field",
            segments_missing_field_total.clone(),
        );

        Self {
            registry,
            documents_evaluated_total,
            documents_passed_total,
            evaluation_errors_total,
            segments_missing_field_total,
        }
    }

    /// Returns a mutable reference to the underlying Prometheus registry.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Encode all metrics to Prometheus text format.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        if let Err(e) = prometheus_client::encoding::text::encode(&mut buffer, &self.registry) {
            tracing::warn!("Failed to encode metrics: {}", e);
        }
        buffer
    }
}
