//! Reconnect supervision on top of taskvisor.
//!
//! One engine run is one taskvisor task. The outcome of a run decides what the supervisor does
//! next:
//! - a startup failure on the very first run is fatal;
//! - a stream that failed before delivering any event, or a later startup failure, is a
//!   retryable failure, so consecutive ones back off exponentially;
//! - a stream lost after delivering events counts as a completed run: the backoff resets
//!   and the next run starts after `first_ms`.
use std::{
    sync::{
        Arc, Mutex as StdMutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use taskvisor::{
    BackoffPolicy, Config as SupervisorConfig, JitterPolicy, RestartPolicy, Supervisor, TaskError,
    TaskFn, TaskRef, TaskSpec,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::ReconciliationEngine;
use crate::error::RunError;

const TASK_NAME: &str = "regsync-reconcile";

type Outcome = Arc<StdMutex<Option<RunError>>>;

/// Restart behaviour after the event stream is lost.
///
/// Disabled by default: a lost stream ends the process. When enabled, each restart re-runs
/// the startup reconciliation so transitions missed while disconnected are repaired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    /// Delay before the first retry, and after a run whose stream was healthy.
    pub first_ms: u64,
    /// Upper bound for any delay.
    pub max_ms: u64,
    /// Growth factor between consecutive failed runs.
    pub factor: f64,
    /// Spread delays randomly (equal jitter).
    pub jitter: bool,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            first_ms: 1_000,
            max_ms: 60_000,
            factor: 2.0,
            jitter: false,
        }
    }
}

impl ReconnectPolicy {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    pub fn restart_policy(&self) -> RestartPolicy {
        if self.enabled {
            RestartPolicy::Always
        } else {
            RestartPolicy::Never
        }
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        let first = Duration::from_millis(self.first_ms);
        let factor = if self.factor.is_finite() && self.factor >= 1.0 {
            self.factor
        } else {
            1.0
        };
        BackoffPolicy {
            success_delay: Some(first),
            jitter: if self.jitter {
                JitterPolicy::Equal
            } else {
                JitterPolicy::None
            },
            factor,

            first,
            max: Duration::from_millis(self.max_ms.max(self.first_ms)),
        }
    }
}

impl ReconciliationEngine {
    /// Run until cancelled or until a failure the policy does not retry.
    ///
    /// Returns `Ok(())` only on cancellation. A registry call in flight when `cancel` fires
    /// is allowed to finish.
    pub async fn supervise(
        self,
        policy: ReconnectPolicy,
        cancel: CancellationToken,
    ) -> Result<(), RunError> {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let outcome: Outcome = Arc::new(StdMutex::new(None));
        let task = reconcile_task(self, policy.enabled, cancel, Arc::clone(&outcome));
        let spec = TaskSpec::new(
            task,
            policy.restart_policy(),
            policy.backoff_policy(),
            None,
        );

        let sup = Supervisor::builder(SupervisorConfig::default())
            .with_subscribers(Vec::new())
            .build();
        if let Err(e) = sup.run(vec![spec]).await {
            warn!(error = %e, "supervisor stopped with an error");
        }

        let last = outcome.lock().map(|mut slot| slot.take()).unwrap_or_default();
        match last {
            Some(e) => Err(e),
            None => {
                info!("shutdown requested");
                Ok(())
            }
        }
    }
}

fn reconcile_task(
    engine: ReconciliationEngine,
    reconnect: bool,
    cancel: CancellationToken,
    outcome: Outcome,
) -> TaskRef {
    let engine = Arc::new(Mutex::new(engine));
    let first_run = Arc::new(AtomicBool::new(true));

    TaskFn::arc(TASK_NAME, move |ctx: CancellationToken| {
        let engine = Arc::clone(&engine);
        let first_run = Arc::clone(&first_run);
        let outcome = Arc::clone(&outcome);
        let cancel = cancel.clone();

        async move {
            if ctx.is_cancelled() {
                return Err(TaskError::Canceled);
            }
            if cancel.is_cancelled() {
                return Err(TaskError::Fatal {
                    reason: "shutdown requested".into(),
                });
            }
            let first = first_run.swap(false, Ordering::SeqCst);
            let mut engine = engine.lock().await;

            // Supervisor shutdown stops the run the same way `cancel` does.
            let stop = cancel.child_token();
            let res = {
                let run = engine.run(&stop);
                tokio::pin!(run);
                tokio::select! {
                    biased;
                    res = &mut run => res,
                    _ = ctx.cancelled() => {
                        stop.cancel();
                        run.await
                    }
                }
            };

            let e = match res {
                Ok(()) if ctx.is_cancelled() => return Err(TaskError::Canceled),
                Ok(()) => {
                    return Err(TaskError::Fatal {
                        reason: "shutdown requested".into(),
                    });
                }
                Err(e) => e,
            };

            let fatal = !reconnect || (first && matches!(e, RunError::Startup(_)));
            if fatal {
                let reason = e.to_string();
                if let Ok(mut slot) = outcome.lock() {
                    *slot = Some(e);
                }
                return Err(TaskError::Fatal { reason });
            }
            match e {
                RunError::Stream(_) => {
                    warn!(error = %e, "event stream lost; restarting reconciliation");
                    Ok(())
                }
                _ => {
                    warn!(error = %e, "run failed; retrying with backoff");
                    Err(TaskError::Fail {
                        reason: e.to_string(),
                    })
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_by_default() {
        let p = ReconnectPolicy::default();
        assert!(!p.enabled);
        assert!(matches!(p.restart_policy(), RestartPolicy::Never));
        assert!(matches!(
            ReconnectPolicy::enabled().restart_policy(),
            RestartPolicy::Always
        ));
    }

    #[test]
    fn backoff_follows_policy() {
        let p = ReconnectPolicy {
            enabled: true,
            first_ms: 100,
            max_ms: 1_000,
            factor: 3.0,
            jitter: false,
        };
        let b = p.backoff_policy();
        assert_eq!(b.first, Duration::from_millis(100));
        assert_eq!(b.max, Duration::from_millis(1_000));
        assert_eq!(b.success_delay, Some(Duration::from_millis(100)));
        assert_eq!(b.factor, 3.0);
        assert!(matches!(b.jitter, JitterPolicy::None));

        let jittered = ReconnectPolicy {
            jitter: true,
            ..p
        };
        assert!(matches!(jittered.backoff_policy().jitter, JitterPolicy::Equal));
    }

    #[test]
    fn degenerate_values_are_clamped() {
        let p = ReconnectPolicy {
            factor: f64::NAN,
            first_ms: 5_000,
            max_ms: 10,
            ..ReconnectPolicy::enabled()
        };
        let b = p.backoff_policy();
        assert_eq!(b.factor, 1.0);
        assert_eq!(b.max, Duration::from_millis(5_000));
    }
}
