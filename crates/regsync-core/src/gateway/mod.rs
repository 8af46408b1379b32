//! Capability interfaces of the two external collaborators.
//!
//! The engine only ever talks to the scheduler and the registry through these traits, so
//! tests substitute in-memory implementations and the daemon plugs in HTTP clients.
use std::{collections::HashSet, pin::Pin};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;

use regsync_model::{AppId, Application, ServiceRecord, TaskId};

use crate::error::SyncResult;

/// Raw server-push byte stream as delivered by the transport.
pub type ByteStream = Pin<Box<dyn Stream<Item = SyncResult<Bytes>> + Send>>;

/// Source of truth for applications, tasks and their state transitions.
#[async_trait]
pub trait SchedulerGateway: Send + Sync {
    /// Every application with its current tasks embedded.
    async fn list_applications(&self) -> SyncResult<Vec<Application>>;

    /// Current definition of one application; [`crate::SyncError::NotFound`] if unknown.
    async fn get_application(&self, id: &AppId) -> SyncResult<Application>;

    /// Open the scheduler's event stream.
    async fn open_event_stream(&self) -> SyncResult<ByteStream>;
}

/// Passive service-discovery store.
#[async_trait]
pub trait RegistryGateway: Send + Sync {
    /// Create or overwrite the entry with `record.id`.
    async fn register(&self, record: &ServiceRecord) -> SyncResult<()>;

    /// Remove the entry with `id`. Removing an absent entry succeeds.
    async fn deregister(&self, id: &TaskId) -> SyncResult<()>;

    /// Identifiers of every entry carrying `scope_tag`.
    async fn list(&self, scope_tag: &str) -> SyncResult<HashSet<TaskId>>;
}
