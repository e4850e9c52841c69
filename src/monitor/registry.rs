//! Shared registry of source monitors
//!
//! Sources are registered once at startup and live for the whole process.
//! Each monitor sits behind its own lock, held only for synchronous state
//! updates and never across an await point. The registry also keeps the
//! most recent notification (for re-arming its countdown) and the next due
//! time of sources with their own polling interval.

use crate::monitor::source_monitor::SourceMonitor;
use crate::notify::NotificationState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Instant;

/// Handle to one source's monitor
pub type SharedMonitor = Arc<Mutex<SourceMonitor>>;

/// Locks a source monitor, recovering from poisoning
pub fn lock_monitor(monitor: &SharedMonitor) -> MutexGuard<'_, SourceMonitor> {
    monitor.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct Registry {
    order: Vec<String>,
    monitors: HashMap<String, SharedMonitor>,
    latest: Mutex<Option<NotificationState>>,
    next_due: Mutex<HashMap<String, Instant>>,
}

impl Registry {
    /// Builds a registry; sources keep the given order
    pub fn new(monitors: Vec<SourceMonitor>) -> Self {
        let mut registry = Self::default();
        for monitor in monitors {
            let id = monitor.id().to_string();
            registry.order.push(id.clone());
            registry.monitors.insert(id, Arc::new(Mutex::new(monitor)));
        }
        registry
    }

    pub fn get(&self, source_id: &str) -> Option<SharedMonitor> {
        self.monitors.get(source_id).cloned()
    }

    /// Source ids in configuration order
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Records the most recently sent notification
    pub fn set_latest(&self, state: NotificationState) {
        *self.latest_guard() = Some(state);
    }

    pub fn latest(&self) -> Option<NotificationState> {
        self.latest_guard().clone()
    }

    fn latest_guard(&self) -> MutexGuard<'_, Option<NotificationState>> {
        self.latest.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether a source with its own interval is due at `now`
    ///
    /// Sources never checked before are always due.
    pub fn is_due(&self, source_id: &str, now: Instant) -> bool {
        self.next_due_guard()
            .get(source_id)
            .map(|due| now >= *due)
            .unwrap_or(true)
    }

    pub fn set_next_due(&self, source_id: &str, due: Instant) {
        self.next_due_guard().insert(source_id.to_string(), due);
    }

    fn next_due_guard(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.next_due.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
