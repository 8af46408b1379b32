//! Prometheus backend for the registry sync engine.
//!
//! [`PrometheusMetrics`] implements [`regsync_core::metrics::MetricsBackend`]; hand it to the
//! engine as a `MetricsHandle` and serve [`PrometheusMetrics::gather`] from an HTTP endpoint.
//!
//! ## Metrics
//! - `regsync_events_total{kind}` - Counter
//! - `regsync_decode_failures_total` - Counter
//! - `regsync_registry_ops_total{op, outcome}` - Counter
//! - `regsync_reconcile_records{action}` - Gauge, size of the last startup plan
//!
//! ```rust
//! use std::sync::Arc;
//! use regsync_prometheus::{Encoder, PrometheusMetrics, TextEncoder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let handle: regsync_core::metrics::MetricsHandle = Arc::new(metrics.clone());
//!
//! let mut buf = Vec::new();
//! TextEncoder::new().encode(&metrics.gather(), &mut buf)?;
//! # drop(handle);
//! # Ok(())
//! # }
//! ```
mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
