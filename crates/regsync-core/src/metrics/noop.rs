use crate::metrics::backend::{MetricsBackend, OpOutcome, RegistryOp};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_event(&self, _: &str) {}

    #[inline(always)]
    fn record_decode_failure(&self) {}

    #[inline(always)]
    fn record_registry_op(&self, _: RegistryOp, _: OpOutcome) {}

    #[inline(always)]
    fn record_reconcile(&self, _: usize, _: usize, _: usize) {}
}
