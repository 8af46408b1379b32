//! Metrics collection abstraction for the sync engine.
//!
//! Backends (prometheus, statsd, etc) implement [`MetricsBackend`] and are injected into the
//! engine and the event stream parser as a [`MetricsHandle`].
mod backend;
pub use backend::{MetricsBackend, MetricsHandle, OpOutcome, RegistryOp};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
