use std::sync::Arc;

use prometheus::{Counter, CounterVec, GaugeVec, Opts, Registry, proto::MetricFamily};

use regsync_core::metrics::{MetricsBackend, OpOutcome, RegistryOp};

const NAMESPACE: &str = "regsync";

/// Prometheus metrics for the sync engine.
///
/// All labels are bounded: `kind` is one of the event kinds, `op` is register/deregister,
/// `outcome` success/failure, `action` register/deregister/unchanged.
#[derive(Clone)]
pub struct PrometheusMetrics {
    events: CounterVec,
    decode_failures: Counter,
    registry_ops: CounterVec,
    reconcile: GaugeVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let events = CounterVec::new(
            Opts::new("events_total", "Scheduler events consumed").namespace(NAMESPACE),
            &["kind"],
        )?;
        registry.register(Box::new(events.clone()))?;

        let decode_failures = Counter::with_opts(
            Opts::new(
                "decode_failures_total",
                "Event stream lines whose payload could not be decoded",
            )
            .namespace(NAMESPACE),
        )?;
        registry.register(Box::new(decode_failures.clone()))?;

        let registry_ops = CounterVec::new(
            Opts::new("registry_ops_total", "Registry calls by operation and outcome")
                .namespace(NAMESPACE),
            &["op", "outcome"],
        )?;
        registry.register(Box::new(registry_ops.clone()))?;

        let reconcile = GaugeVec::new(
            Opts::new(
                "reconcile_records",
                "Records per action in the last startup reconciliation",
            )
            .namespace(NAMESPACE),
            &["action"],
        )?;
        registry.register(Box::new(reconcile.clone()))?;

        Ok(Self {
            events,
            decode_failures,
            registry_ops,
            reconcile,
            registry,
        })
    }

    /// Backend with a private registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    /// Snapshot for exposition, e.g. with [`prometheus::TextEncoder`].
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_event(&self, kind: &str) {
        self.events.with_label_values(&[kind]).inc();
    }

    fn record_decode_failure(&self) {
        self.decode_failures.inc();
    }

    fn record_registry_op(&self, op: RegistryOp, outcome: OpOutcome) {
        self.registry_ops
            .with_label_values(&[op.as_label(), outcome.as_label()])
            .inc();
    }

    fn record_reconcile(&self, stale: usize, registered: usize, unchanged: usize) {
        for (action, n) in [
            ("deregister", stale),
            ("register", registered),
            ("unchanged", unchanged),
        ] {
            self.reconcile.with_label_values(&[action]).set(n as f64);
        }
    }
}
