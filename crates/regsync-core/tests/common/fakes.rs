use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;

use regsync_core::{ByteStream, RegistryGateway, SchedulerGateway, SyncError, SyncResult};
use regsync_model::{AppId, Application, ServiceRecord, TaskId};

/// A registry call as seen by [`FakeRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Register(TaskId),
    Deregister(TaskId),
}

/// In-memory registry. Register overwrites, deregister of an absent entry succeeds.
#[derive(Default)]
pub struct FakeRegistry {
    entries: Mutex<HashMap<TaskId, ServiceRecord>>,
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<TaskId>>,
    list_fails: Mutex<bool>,
    latency: Mutex<Option<Duration>>,
}

impl FakeRegistry {
    pub fn with_entries(ids: &[&str], tag: &str) -> Self {
        let reg = Self::default();
        {
            let mut entries = reg.entries.lock().unwrap();
            for id in ids {
                entries.insert(
                    TaskId::from(*id),
                    ServiceRecord {
                        id: TaskId::from(*id),
                        name: "seed".into(),
                        tags: vec![tag.to_string()],
                        address: "10.9.9.9".into(),
                        port: 1,
                        check: None,
                    },
                );
            }
        }
        reg
    }

    /// Every call touching `id` fails with a transport error.
    pub fn fail_on(&self, id: &str) {
        self.failing.lock().unwrap().insert(TaskId::from(id));
    }

    pub fn fail_list(&self) {
        *self.list_fails.lock().unwrap() = true;
    }

    /// Every register call takes `d` before it lands.
    pub fn slow_register(&self, d: Duration) {
        *self.latency.lock().unwrap() = Some(d);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn get(&self, id: &str) -> Option<ServiceRecord> {
        self.entries.lock().unwrap().get(id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entries
            .lock()
            .unwrap()
            .keys()
            .map(|id| id.to_string())
            .collect();
        ids.sort();
        ids
    }

    fn check(&self, id: &TaskId) -> SyncResult<()> {
        if self.failing.lock().unwrap().contains(id) {
            return Err(SyncError::Transport(format!("refused {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RegistryGateway for FakeRegistry {
    async fn register(&self, record: &ServiceRecord) -> SyncResult<()> {
        self.calls.lock().unwrap().push(Call::Register(record.id.clone()));
        let latency = *self.latency.lock().unwrap();
        if let Some(d) = latency {
            tokio::time::sleep(d).await;
        }
        self.check(&record.id)?;
        self.entries
            .lock()
            .unwrap()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn deregister(&self, id: &TaskId) -> SyncResult<()> {
        self.calls.lock().unwrap().push(Call::Deregister(id.clone()));
        self.check(id)?;
        self.entries.lock().unwrap().remove(id);
        Ok(())
    }

    async fn list(&self, scope_tag: &str) -> SyncResult<HashSet<TaskId>> {
        if *self.list_fails.lock().unwrap() {
            return Err(SyncError::Transport("registry unreachable".into()));
        }
        Ok(self
            .entries
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.has_tag(scope_tag))
            .map(|r| r.id.clone())
            .collect())
    }
}

/// Scheduler with a fixed inventory and scripted event streams.
///
/// Each `open_event_stream` call consumes the next script; when none is left the call fails.
#[derive(Default)]
pub struct FakeScheduler {
    apps: Mutex<Vec<Application>>,
    streams: Mutex<VecDeque<Vec<SyncResult<Bytes>>>>,
    list_failures: Mutex<usize>,
    list_calls: Mutex<usize>,
}

impl FakeScheduler {
    pub fn with_apps(apps: Vec<Application>) -> Self {
        Self {
            apps: Mutex::new(apps),
            ..Default::default()
        }
    }

    /// Queue a stream that yields `frames` and then closes.
    pub fn push_stream<S: AsRef<str>>(&self, frames: &[S]) {
        let items = frames
            .iter()
            .map(|f| Ok(Bytes::from(f.as_ref().as_bytes().to_vec())))
            .collect();
        self.streams.lock().unwrap().push_back(items);
    }

    /// Queue a raw script, errors included.
    pub fn push_script(&self, items: Vec<SyncResult<Bytes>>) {
        self.streams.lock().unwrap().push_back(items);
    }

    /// The next `n` inventory fetches fail.
    pub fn fail_list(&self, n: usize) {
        *self.list_failures.lock().unwrap() = n;
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }
}

#[async_trait]
impl SchedulerGateway for FakeScheduler {
    async fn list_applications(&self) -> SyncResult<Vec<Application>> {
        *self.list_calls.lock().unwrap() += 1;
        let mut failures = self.list_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(SyncError::Transport("scheduler unreachable".into()));
        }
        Ok(self.apps.lock().unwrap().clone())
    }

    async fn get_application(&self, id: &AppId) -> SyncResult<Application> {
        self.apps
            .lock()
            .unwrap()
            .iter()
            .find(|a| &a.id == id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(id.to_string()))
    }

    async fn open_event_stream(&self) -> SyncResult<ByteStream> {
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SyncError::Transport("connection refused".into()))?;
        Ok(Box::pin(stream::iter(script)))
    }
}
