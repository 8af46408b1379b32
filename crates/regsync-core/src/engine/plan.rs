use std::collections::{HashMap, HashSet};

use regsync_model::{ServiceRecord, TaskId};

/// Corrections that bring the registry in line with the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Applications reported by the scheduler.
    pub apps_found: usize,
    /// Desired records missing from the registry.
    pub register: Vec<ServiceRecord>,
    /// Registry entries with no running task behind them.
    pub deregister: Vec<TaskId>,
    /// Present on both sides; left as they are.
    pub unchanged: Vec<TaskId>,
}

impl ReconcilePlan {
    /// Set difference by identifier. Every list is sorted by identifier.
    pub fn diff(
        apps_found: usize,
        mut desired: HashMap<TaskId, ServiceRecord>,
        actual: &HashSet<TaskId>,
    ) -> Self {
        let mut deregister = Vec::new();
        let mut unchanged = Vec::new();
        for id in actual {
            if desired.remove(id).is_some() {
                unchanged.push(id.clone());
            } else {
                deregister.push(id.clone());
            }
        }

        let mut register: Vec<ServiceRecord> = desired.into_values().collect();
        register.sort_by(|a, b| a.id.cmp(&b.id));
        deregister.sort();
        unchanged.sort();

        Self {
            apps_found,
            register,
            deregister,
            unchanged,
        }
    }

    /// Entries the registry held before the plan was applied.
    pub fn existing(&self) -> usize {
        self.deregister.len() + self.unchanged.len()
    }

    pub fn is_noop(&self) -> bool {
        self.register.is_empty() && self.deregister.is_empty()
    }
}

/// Outcome of applying a [`ReconcilePlan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub apps_found: usize,
    pub deregistered: usize,
    pub deregister_failed: usize,
    pub registered: usize,
    pub register_failed: usize,
    pub unchanged: usize,
}
