use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use crate::container::ContainerScope;

/// One call observed by the simulation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimEvent {
    /// `window:<id>`, `container:<id>`, `overlay:<id>`, ..
    pub target: String,
    /// Operation name, optionally followed by a space and its arguments.
    pub op: String,
    /// Container scope active on the calling thread.
    pub scope: i32,
    pub thread: Option<String>,
}

impl SimEvent {
    /// Operation name without arguments.
    pub fn name(&self) -> &str {
        self.op.split(' ').next().unwrap_or_default()
    }
}

/// Shared, ordered log of every simulated call.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<SimEvent>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SimEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record(&self, target: impl Into<String>, op: impl Into<String>) {
        let event = SimEvent {
            target: target.into(),
            op: op.into(),
            scope: ContainerScope::current_id(),
            thread: thread::current().name().map(str::to_string),
        };
        tracing::trace!(target = %event.target, op = %event.op, scope = event.scope, "sim call");
        self.lock().push(event);
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.lock().clone()
    }

    pub fn events_for(&self, target: &str) -> Vec<SimEvent> {
        self.lock()
            .iter()
            .filter(|event| event.target == target)
            .cloned()
            .collect()
    }

    pub fn ops_for(&self, target: &str) -> Vec<String> {
        self.events_for(target)
            .into_iter()
            .map(|event| event.op)
            .collect()
    }

    /// Number of calls named `name` on `target`.
    pub fn count(&self, target: &str, name: &str) -> usize {
        self.lock()
            .iter()
            .filter(|event| event.target == target && event.name() == name)
            .count()
    }

    /// Last call named `name` on `target`.
    pub fn last(&self, target: &str, name: &str) -> Option<SimEvent> {
        self.lock()
            .iter()
            .rev()
            .find(|event| event.target == target && event.name() == name)
            .cloned()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
