//! Reconciliation engine.
//!
//! Two phases:
//! 1. Startup: fetch the full inventory, diff it against the registry entries carrying the
//!    sentinel tag, and apply the corrections ([`ReconciliationEngine::reconcile`]).
//! 2. Steady state: follow the scheduler's event stream and turn each status change into
//!    at most one registry call ([`ReconciliationEngine::follow`]).
//!
//! Individual registry failures are logged and counted; only inventory failures and loss of
//! the event stream end a run. Cancellation is observed between registry calls, never during
//! one.
mod cache;
pub use cache::AppCache;

mod plan;
pub use plan::{ReconcilePlan, ReconcileReport};

mod supervise;
pub use supervise::ReconnectPolicy;

use std::{collections::HashMap, sync::Arc};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use regsync_model::{AppId, Event, ServiceRecord, StatusUpdate, TaskId};

use crate::{
    error::{RunError, SyncError, SyncResult},
    gateway::{RegistryGateway, SchedulerGateway},
    metrics::{MetricsHandle, OpOutcome, RegistryOp, noop_metrics},
    projector::TaskProjector,
    stream::EventStreamParser,
};

/// What a single event led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    /// Application definition stored or refreshed.
    Tracked(AppId),
    /// Application definition dropped: no HTTP health check.
    Untracked(AppId),
    Registered(TaskId),
    Deregistered(TaskId),
    /// Task could not be projected into a record.
    Skipped(TaskId),
    /// The registry call failed.
    Failed(TaskId),
    /// Nothing to do.
    Nothing,
}

/// How a steady-state session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// Stopped by the cancellation token.
    Cancelled,
    /// The stream failed after delivering `events` events.
    Lost { error: SyncError, events: u64 },
}

/// Projection preview of a single application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInspection {
    pub app_id: AppId,
    /// Whether the application has an HTTP-family health check.
    pub eligible: bool,
    /// Records of running tasks, as they would be registered.
    pub records: Vec<ServiceRecord>,
    /// Running tasks that cannot be projected.
    pub skipped: Vec<TaskId>,
}

pub struct ReconciliationEngine {
    scheduler: Arc<dyn SchedulerGateway>,
    registry: Arc<dyn RegistryGateway>,
    projector: TaskProjector,
    cache: AppCache,
    metrics: MetricsHandle,
}

impl ReconciliationEngine {
    pub fn new(
        scheduler: Arc<dyn SchedulerGateway>,
        registry: Arc<dyn RegistryGateway>,
        projector: TaskProjector,
    ) -> Self {
        Self {
            scheduler,
            registry,
            projector,
            cache: AppCache::new(),
            metrics: noop_metrics(),
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    #[inline]
    pub fn cache(&self) -> &AppCache {
        &self.cache
    }

    #[inline]
    pub fn projector(&self) -> &TaskProjector {
        &self.projector
    }

    /// Compute the startup corrections without touching the registry.
    ///
    /// Rebuilds the application cache from the inventory as a side effect.
    #[instrument(level = "debug", skip(self))]
    pub async fn plan(&mut self) -> SyncResult<ReconcilePlan> {
        let apps = self.scheduler.list_applications().await?;
        let apps_found = apps.len();
        info!(count = apps_found, "applications found in scheduler");

        self.cache.clear();
        let mut desired = HashMap::new();
        for mut app in apps {
            let tasks = std::mem::take(&mut app.tasks);
            let Some(hc) = app.health_check().cloned() else {
                debug!(app = %app.id, "no http health check; not tracked");
                continue;
            };

            for task in tasks.iter().filter(|t| t.state.is_running()) {
                match self.projector.project(task, &app, Some(&hc)) {
                    Ok(record) => {
                        desired.insert(record.id.clone(), record);
                    }
                    Err(e) => warn!(app = %app.id, task = %task.id, error = %e, "task skipped"),
                }
            }
            self.cache.track(app);
        }

        let actual = self.registry.list(self.projector.tagger().sentinel()).await?;
        debug!(
            desired = desired.len(),
            existing = actual.len(),
            tracked = self.cache.len(),
            "inventory collected"
        );

        let plan = ReconcilePlan::diff(apps_found, desired, &actual);
        self.metrics.record_reconcile(
            plan.deregister.len(),
            plan.register.len(),
            plan.unchanged.len(),
        );
        Ok(plan)
    }

    /// Apply `plan`: deregistrations first, then registrations.
    ///
    /// Never fails as a whole; per-record failures are counted in the report.
    pub async fn apply(&self, plan: &ReconcilePlan) -> ReconcileReport {
        self.apply_until(plan, &CancellationToken::new()).await
    }

    /// [`apply`](Self::apply) that stops issuing registry calls once `cancel` fires.
    pub async fn apply_until(
        &self,
        plan: &ReconcilePlan,
        cancel: &CancellationToken,
    ) -> ReconcileReport {
        let mut report = ReconcileReport {
            apps_found: plan.apps_found,
            unchanged: plan.unchanged.len(),
            ..Default::default()
        };

        for id in &plan.deregister {
            if cancel.is_cancelled() {
                return report;
            }
            match self.deregister(id).await {
                Ok(()) => report.deregistered += 1,
                Err(_) => report.deregister_failed += 1,
            }
        }
        if plan.existing() > 0 {
            info!(
                cleaned_up = report.deregistered,
                failed = report.deregister_failed,
                stays = report.unchanged,
                "stale registry entries removed"
            );
        }

        for record in &plan.register {
            if cancel.is_cancelled() {
                return report;
            }
            match self.register(record).await {
                Ok(()) => report.registered += 1,
                Err(_) => report.register_failed += 1,
            }
        }
        info!(
            registered = report.registered,
            failed = report.register_failed,
            "missing services registered"
        );

        report
    }

    /// Startup phase: [`plan`](Self::plan) followed by [`apply`](Self::apply).
    pub async fn reconcile(&mut self) -> SyncResult<ReconcileReport> {
        let plan = self.plan().await?;
        Ok(self.apply(&plan).await)
    }

    /// Apply one event. Registry failures are logged and reported, never propagated.
    pub async fn handle_event(&mut self, event: Event) -> EventAction {
        self.metrics.record_event(event.kind());
        match event {
            Event::ApplicationUpdated { app } => {
                let id = app.id.clone();
                if self.cache.track(app) {
                    debug!(app = %id, "application definition refreshed");
                    EventAction::Tracked(id)
                } else {
                    debug!(app = %id, "application has no http health check; not tracked");
                    EventAction::Untracked(id)
                }
            }
            Event::StatusUpdate(update) => self.on_status(&update).await,
            Event::Ignored => EventAction::Nothing,
        }
    }

    async fn on_status(&self, update: &StatusUpdate) -> EventAction {
        let Some(app) = self.cache.get(&update.app_id) else {
            trace!(app = %update.app_id, task = %update.task_id, "untracked application");
            return EventAction::Nothing;
        };
        let state = update.task_status;

        if state.is_running() {
            let task = update.to_task();
            let record = match self.projector.project(&task, app, app.health_check()) {
                Ok(record) => record,
                Err(e) => {
                    warn!(app = %update.app_id, task = %task.id, error = %e, "task skipped");
                    return EventAction::Skipped(task.id);
                }
            };
            match self.register(&record).await {
                Ok(()) => {
                    info!(service = %record.name, task = %record.id, "task registered");
                    EventAction::Registered(record.id)
                }
                Err(_) => EventAction::Failed(record.id),
            }
        } else if state.is_terminal() {
            let id = update.task_id.clone();
            match self.deregister(&id).await {
                Ok(()) => {
                    info!(app = %update.app_id, task = %id, state = state.as_str(), "task deregistered");
                    EventAction::Deregistered(id)
                }
                Err(_) => EventAction::Failed(id),
            }
        } else {
            trace!(task = %update.task_id, state = state.as_str(), "no action for state");
            EventAction::Nothing
        }
    }

    /// Steady-state phase. Consumes events until the stream fails or `cancel` fires.
    pub async fn follow(&mut self, cancel: &CancellationToken) -> SessionEnd {
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return SessionEnd::Cancelled,
            res = self.scheduler.open_event_stream() => res,
        };
        let stream = match opened {
            Ok(stream) => stream,
            Err(error) => return SessionEnd::Lost { error, events: 0 },
        };
        info!("subscribed to scheduler events");

        let mut parser = EventStreamParser::new(stream).with_metrics(self.metrics.clone());
        let mut events = 0u64;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return SessionEnd::Cancelled,
                next = parser.next_event() => next,
            };
            match next {
                Ok(event) => {
                    events += 1;
                    self.handle_event(event).await;
                }
                Err(error) => return SessionEnd::Lost { error, events },
            }
        }
    }

    /// One full run: startup reconciliation, then the event loop.
    ///
    /// Returns `Ok(())` only when `cancel` fires.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<(), RunError> {
        let plan = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            plan = self.plan() => plan,
        };
        let plan = plan.map_err(|e| {
            error!(error = %e, "startup reconciliation failed");
            RunError::Startup(e)
        })?;
        self.apply_until(&plan, cancel).await;
        if cancel.is_cancelled() {
            return Ok(());
        }

        match self.follow(cancel).await {
            SessionEnd::Cancelled => Ok(()),
            SessionEnd::Lost { error, events: 0 } => {
                error!(error = %error, "event stream unavailable");
                Err(RunError::Subscribe(error))
            }
            SessionEnd::Lost { error, events } => {
                error!(error = %error, events, "event stream lost");
                Err(RunError::Stream(error))
            }
        }
    }

    /// Project the running tasks of one application without registering anything.
    pub async fn inspect(&self, id: &AppId) -> SyncResult<AppInspection> {
        let app = self.scheduler.get_application(id).await?;
        let Some(hc) = app.health_check() else {
            return Ok(AppInspection {
                app_id: app.id.clone(),
                eligible: false,
                records: Vec::new(),
                skipped: Vec::new(),
            });
        };

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for task in app.tasks.iter().filter(|t| t.state.is_running()) {
            match self.projector.project(task, &app, Some(hc)) {
                Ok(record) => records.push(record),
                Err(_) => skipped.push(task.id.clone()),
            }
        }
        Ok(AppInspection {
            app_id: app.id.clone(),
            eligible: true,
            records,
            skipped,
        })
    }

    async fn register(&self, record: &ServiceRecord) -> SyncResult<()> {
        let res = self.registry.register(record).await;
        match &res {
            Ok(()) => {
                self.metrics
                    .record_registry_op(RegistryOp::Register, OpOutcome::Success);
                debug!(task = %record.id, service = %record.name, "registry entry written");
            }
            Err(e) => {
                self.metrics
                    .record_registry_op(RegistryOp::Register, OpOutcome::Failure);
                error!(task = %record.id, service = %record.name, error = %e, "registration failed");
            }
        }
        res
    }

    async fn deregister(&self, id: &TaskId) -> SyncResult<()> {
        let res = self.registry.deregister(id).await;
        match &res {
            Ok(()) => {
                self.metrics
                    .record_registry_op(RegistryOp::Deregister, OpOutcome::Success);
                debug!(task = %id, "registry entry removed");
            }
            Err(e) => {
                self.metrics
                    .record_registry_op(RegistryOp::Deregister, OpOutcome::Failure);
                error!(task = %id, error = %e, "deregistration failed");
            }
        }
        res
    }
}
