//! Task executor abstraction shared by containers.
//!
//! All cross-thread handoffs in the coordinator are explicit posts naming a
//! task type and priority; nothing here blocks the caller except
//! [`TaskExecutor::post_sync_task`].

use std::fmt;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    Ui,
    Js,
    Platform,
    Background,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskType::Ui => "UI",
            TaskType::Js => "JS",
            TaskType::Platform => "PLATFORM",
            TaskType::Background => "BACKGROUND",
        };
        write!(f, "{}", s)
    }
}

/// Queue priority. Higher priorities run first; equal priorities run FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TaskPriority {
    Low,
    #[default]
    High,
    Immediate,
}

pub trait TaskExecutor: Send + Sync {
    /// Queues `task`; returns `false` when the executor is gone.
    fn post_task(
        &self,
        task: Task,
        task_type: TaskType,
        name: &'static str,
        priority: TaskPriority,
    ) -> bool;

    /// Runs `task` on the executor and waits for it to finish.
    fn post_sync_task(&self, task: Task, task_type: TaskType, name: &'static str) -> bool;

    /// Whether the caller is already on the thread serving `task_type`.
    fn runs_on_current_thread(&self, task_type: TaskType) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_order_high_over_low() {
        assert!(TaskPriority::Immediate > TaskPriority::High);
        assert!(TaskPriority::High > TaskPriority::Low);
        assert_eq!(TaskPriority::default(), TaskPriority::High);
        assert_eq!(TaskType::Ui.to_string(), "UI");
    }
}
