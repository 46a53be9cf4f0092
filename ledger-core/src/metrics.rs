//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `ledger_transfers_admitted_total` - Transfers appended
//! - `ledger_transfers_rejected_total{kind}` - Transfers refused at admission
//! - `ledger_verifications_total` - Verification passes run
//! - `ledger_invalid_entries` - Invalid entries found by the last verification
//! - `ledger_entries` - Entries seen by the last verification

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Transfers appended
    pub transfers_admitted: IntCounter,

    /// Transfers refused, by error kind
    pub transfers_rejected: IntCounterVec,

    /// Verification passes
    pub verifications_total: IntCounter,

    /// Invalid entries at last verification
    pub invalid_entries: IntGauge,

    /// Ledger length at last verification
    pub entries: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create a collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transfers_admitted = IntCounter::new(
            "ledger_transfers_admitted_total",
            "Total number of transfers appended",
        )?;
        registry.register(Box::new(transfers_admitted.clone()))?;

        let transfers_rejected = IntCounterVec::new(
            Opts::new(
                "ledger_transfers_rejected_total",
                "Total number of transfers refused at admission",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(transfers_rejected.clone()))?;

        let verifications_total = IntCounter::new(
            "ledger_verifications_total",
            "Total number of verification passes",
        )?;
        registry.register(Box::new(verifications_total.clone()))?;

        let invalid_entries = IntGauge::new(
            "ledger_invalid_entries",
            "Invalid entries found by the last verification",
        )?;
        registry.register(Box::new(invalid_entries.clone()))?;

        let entries = IntGauge::new("ledger_entries", "Entries seen by the last verification")?;
        registry.register(Box::new(entries.clone()))?;

        Ok(Self {
            transfers_admitted,
            transfers_rejected,
            verifications_total,
            invalid_entries,
            entries,
            registry,
        })
    }

    /// Record an admission rejection
    pub fn record_rejection(&self, kind: &str) {
        self.transfers_rejected.with_label_values(&[kind]).inc();
    }

    /// Record a verification pass
    pub fn record_verification(&self, total: usize, invalid: usize) {
        self.verifications_total.inc();
        self.entries.set(total as i64);
        self.invalid_entries.set(invalid as i64);
    }

    /// Export metrics in Prometheus text format
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
    fn test_independent_registries() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.transfers_admitted.inc();
        assert_eq!(a.transfers_admitted.get(), 1);
        assert_eq!(b.transfers_admitted.get(), 0);
    }

    #[test]
    fn test_export() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rejection("validation_error");
        metrics.record_verification(3, 2);

        let text = metrics.export().unwrap();
        assert!(text.contains("ledger_transfers_rejected_total{kind=\"validation_error\"} 1"));
        assert!(text.contains("ledger_invalid_entries 2"));
        assert!(text.contains("ledger_verifications_total 1"));
    }
}
