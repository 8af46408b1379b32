use std::sync::Arc;

/// Registry operation kind for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryOp {
    Register,
    Deregister,
}

impl RegistryOp {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryOp::Register => "register",
            RegistryOp::Deregister => "deregister",
        }
    }
}

/// Outcome of a single registry operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
    Success,
    Failure,
}

impl OpOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            OpOutcome::Success => "success",
            OpOutcome::Failure => "failure",
        }
    }
}

/// Backend metrics collection interface.
///
/// This trait abstracts metrics collection across different backends.
/// Implementations are handed to the engine and the event stream parser.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record one decoded scheduler event.
    ///
    /// # Arguments
    /// - `kind`: event kind label (`status_update`, `application_updated`, `ignored`)
    fn record_event(&self, kind: &str);
    /// Record a `data:` line whose payload failed to decode.
    fn record_decode_failure(&self);
    /// Record a registry call and how it ended.
    fn record_registry_op(&self, op: RegistryOp, outcome: OpOutcome);
    /// Record the size of the last startup reconciliation plan.
    ///
    /// # Arguments
    /// - `stale`: records scheduled for deregistration
    /// - `registered`: records scheduled for registration
    /// - `unchanged`: records present on both sides
    fn record_reconcile(&self, stale: usize, registered: usize, unchanged: usize);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
