//! Prometheus counters for the discovery pipeline

use crate::classifier::{Candidate, RejectReason};
use crate::diagnostics::Diagnostics;
use crate::{Prefix, PrefixError, Result};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Counts pipeline events into a prometheus registry
#[derive(Clone)]
pub struct MetricsDiagnostics {
    /// Candidates read from the address source
    pub addresses_seen_total: IntCounter,
    /// Candidates dropped, by reason
    pub addresses_rejected_total: IntCounterVec,
    /// Distinct prefixes that made it into the eligible set
    pub prefixes_accepted_total: IntCounter,
    /// Candidates that reduced to an existing prefix
    pub prefixes_collapsed_total: IntCounter,
    pub registry: Arc<Registry>,
}

impl MetricsDiagnostics {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let addresses_seen_total = IntCounter::new(
            "elastic_addresses_seen_total",
            "Addresses reported by the address source",
        )?;

        let addresses_rejected_total = IntCounterVec::new(
            Opts::new(
                "elastic_addresses_rejected_total",
                "Addresses not eligible for announcement",
            ),
            &["reason"],
        )?;

        let prefixes_accepted_total = IntCounter::new(
            "elastic_prefixes_accepted_total",
            "Distinct prefixes selected for announcement",
        )?;

        let prefixes_collapsed_total = IntCounter::new(
            "elastic_prefixes_collapsed_total",
            "Addresses folded into an already selected prefix",
        )?;

        registry.register(Box::new(addresses_seen_total.clone()))?;
        registry.register(Box::new(addresses_rejected_total.clone()))?;
        registry.register(Box::new(prefixes_accepted_total.clone()))?;
        registry.register(Box::new(prefixes_collapsed_total.clone()))?;

        Ok(Self {
            addresses_seen_total,
            addresses_rejected_total,
            prefixes_accepted_total,
            prefixes_collapsed_total,
            registry,
        })
    }

    /// Render all metrics in the Prometheus text format
    pub fn gather(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Diagnostics for MetricsDiagnostics {
    fn observed(&self, _candidate: &Candidate) {
        self.addresses_seen_total.inc();
    }

    fn unparseable(&self, _candidate: &Candidate, _error: &PrefixError) {
        self.addresses_rejected_total
            .with_label_values(&[RejectReason::Unparseable.as_str()])
            .inc();
    }

    fn rejected(&self, _prefix: &Prefix, reason: RejectReason) {
        self.addresses_rejected_total
            .with_label_values(&[reason.as_str()])
            .inc();
    }

    fn accepted(&self, _prefix: &Prefix) {
        self.prefixes_accepted_total.inc();
    }

    fn collapsed(&self, _prefix: &Prefix, _into: &Prefix) {
        self.prefixes_collapsed_total.inc();
    }
}
