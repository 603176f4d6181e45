use std::collections::VecDeque;
use std::sync::Mutex;

use crate::executor::{Task, TaskExecutor, TaskPriority, TaskType};

/// Runs every task on the posting thread, immediately.
#[derive(Debug, Default)]
pub struct InlineExecutor;

impl TaskExecutor for InlineExecutor {
    fn post_task(
        &self,
        task: Task,
        _task_type: TaskType,
        name: &'static str,
        _priority: TaskPriority,
    ) -> bool {
        tracing::trace!(task = name, "inline task");
        task();
        true
    }

    fn post_sync_task(&self, task: Task, _task_type: TaskType, _name: &'static str) -> bool {
        task();
        true
    }

    fn runs_on_current_thread(&self, _task_type: TaskType) -> bool {
        true
    }
}

/// Collects tasks until [`QueuedExecutor::run_pending`] is called.
#[derive(Default)]
pub struct QueuedExecutor {
    queue: Mutex<VecDeque<(&'static str, Task)>>,
    off_thread: bool,
}

impl QueuedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// An executor that reports every caller as off its UI thread.
    pub fn off_thread() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            off_thread: true,
        }
    }

    pub fn pending(&self) -> Vec<&'static str> {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(name, _)| *name)
            .collect()
    }

    /// Runs queued tasks, including ones they post, until the queue is
    /// empty. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
            let Some((_, task)) = next else {
                return ran;
            };
            task();
            ran += 1;
        }
    }
}

impl TaskExecutor for QueuedExecutor {
    fn post_task(
        &self,
        task: Task,
        _task_type: TaskType,
        name: &'static str,
        priority: TaskPriority,
    ) -> bool {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if priority == TaskPriority::Immediate {
            queue.push_front((name, task));
        } else {
            queue.push_back((name, task));
        }
        true
    }

    fn post_sync_task(&self, task: Task, _task_type: TaskType, _name: &'static str) -> bool {
        task();
        true
    }

    fn runs_on_current_thread(&self, _task_type: TaskType) -> bool {
        !self.off_thread
    }
}
