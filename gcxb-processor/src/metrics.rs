//! Metrics collection for observability
//!
//! Prometheus metrics for the apply path, registered on a private registry so
//! several handlers can live in one process.
//!
//! # Metrics
//!
//! - `gcxb_transactions_applied_total` - Transactions applied, by type
//! - `gcxb_transactions_rejected_total` - Failed applies, by reason
//! - `gcxb_state_writes_total` - State entries committed
//! - `gcxb_apply_duration_seconds` - Histogram of apply latencies

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Applied transactions by type
    pub applied_total: IntCounterVec,

    /// Failed applies by reason
    pub rejected_total: IntCounterVec,

    /// Committed state entries
    pub state_writes_total: IntCounter,

    /// Apply duration histogram
    pub apply_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("state_writes_total", &self.state_writes_total.get())
            .field("apply_samples", &self.apply_duration.get_sample_count())
            .finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let applied_total = IntCounterVec::new(
            Opts::new("gcxb_transactions_applied_total", "Transactions applied"),
            &["type"],
        )?;
        registry.register(Box::new(applied_total.clone()))?;

        let rejected_total = IntCounterVec::new(
            Opts::new("gcxb_transactions_rejected_total", "Failed transaction applies"),
            &["reason"],
        )?;
        registry.register(Box::new(rejected_total.clone()))?;

        let state_writes_total =
            IntCounter::new("gcxb_state_writes_total", "State entries committed")?;
        registry.register(Box::new(state_writes_total.clone()))?;

        let apply_duration = Histogram::with_opts(
            HistogramOpts::new("gcxb_apply_duration_seconds", "Histogram of apply latencies")
                .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500, 1.0]),
        )?;
        registry.register(Box::new(apply_duration.clone()))?;

        Ok(Self {
            applied_total,
            rejected_total,
            state_writes_total,
            apply_duration,
            registry,
        })
    }

    /// Record an applied transaction
    pub fn record_applied(&self, transaction_type: &str, writes: usize) {
        self.applied_total.with_label_values(&[transaction_type]).inc();
        self.state_writes_total.inc_by(writes as u64);
    }

    /// Record a failed apply
    pub fn record_rejected(&self, reason: &str) {
        self.rejected_total.with_label_values(&[reason]).inc();
    }

    /// Record apply duration
    pub fn record_apply_duration(&self, duration_seconds: f64) {
        self.apply_duration.observe(duration_seconds);
    }

    /// Export all metrics in Prometheus text format
    pub fn export(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.state_writes_total.get(), 0);
        // Two collectors can coexist
        assert!(Metrics::new().is_ok());
    }

    #[test]
    fn test_record_applied() {
        let metrics = Metrics::new().unwrap();
        metrics.record_applied("EXCHANGE", 1);
        metrics.record_applied("OTHER", 0);

        assert_eq!(metrics.applied_total.with_label_values(&["EXCHANGE"]).get(), 1);
        assert_eq!(metrics.applied_total.with_label_values(&["OTHER"]).get(), 1);
        assert_eq!(metrics.state_writes_total.get(), 1);
    }

    #[test]
    fn test_record_rejected() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rejected("duplicate_address");
        metrics.record_rejected("duplicate_address");
        assert_eq!(
            metrics.rejected_total.with_label_values(&["duplicate_address"]).get(),
            2
        );
    }

    #[test]
    fn test_record_apply_duration() {
        let metrics = Metrics::new().unwrap();
        metrics.record_apply_duration(0.002);
        assert_eq!(metrics.apply_duration.get_sample_count(), 1);
    }

    #[test]
    fn test_export_text_format() {
        let metrics = Metrics::new().unwrap();
        metrics.record_applied("EXCHANGE", 1);
        metrics.record_rejected("duplicate_address");

        let text = metrics.export().unwrap();
        assert!(text.contains("gcxb_transactions_applied_total{type=\"EXCHANGE\"} 1"));
        assert!(text.contains("gcxb_transactions_rejected_total{reason=\"duplicate_address\"} 1"));
        assert!(text.contains("gcxb_state_writes_total 1"));
    }
}
