use std::collections::HashMap;

use regsync_model::{AppId, Application};

/// Applications the engine can register tasks for, keyed by identifier.
///
/// Only applications with an HTTP-family health check are ever stored.
#[derive(Debug, Default)]
pub struct AppCache {
    apps: HashMap<AppId, Application>,
}

impl AppCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or refresh `app` if it is eligible. Returns `true` if stored.
    ///
    /// An ineligible definition leaves any existing entry untouched.
    pub fn track(&mut self, mut app: Application) -> bool {
        if app.health_check().is_none() {
            return false;
        }
        app.tasks.clear();
        self.apps.insert(app.id.clone(), app);
        true
    }

    pub fn get(&self, id: &AppId) -> Option<&Application> {
        self.apps.get(id)
    }

    pub fn contains(&self, id: &AppId) -> bool {
        self.apps.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    pub fn clear(&mut self) {
        self.apps.clear();
    }
}
