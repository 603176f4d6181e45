use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle, ThreadId};

use crate::executor::{Task, TaskExecutor, TaskPriority, TaskType};

struct Job {
    name: &'static str,
    task: Task,
}

#[derive(Default)]
struct Queue {
    immediate: VecDeque<Job>,
    high: VecDeque<Job>,
    low: VecDeque<Job>,
    stopping: bool,
}

impl Queue {
    fn push(&mut self, job: Job, priority: TaskPriority) {
        match priority {
            TaskPriority::Immediate => self.immediate.push_back(job),
            TaskPriority::High => self.high.push_back(job),
            TaskPriority::Low => self.low.push_back(job),
        }
    }

    fn pop(&mut self) -> Option<Job> {
        self.immediate
            .pop_front()
            .or_else(|| self.high.pop_front())
            .or_else(|| self.low.pop_front())
    }

    fn len(&self) -> usize {
        self.immediate.len() + self.high.len() + self.low.len()
    }
}

struct Shared {
    queue: Mutex<Queue>,
    ready: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A dedicated single-worker event loop.
///
/// This is the "one loop per owner" pattern: exactly one named thread drains
/// the queue, so every task posted through an [`EventHandler`] runs strictly
/// after the tasks posted before it at the same priority. Work never runs on
/// the posting thread.
///
/// Dropping the runner lets the worker finish whatever is queued and then
/// joins it.
pub struct EventRunner {
    name: String,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    worker_id: ThreadId,
}

impl EventRunner {
    pub fn create(name: &str) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue::default()),
            ready: Condvar::new(),
        });
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_loop(worker_shared))?;
        let worker_id = worker.thread().id();
        tracing::debug!(runner = name, "event runner started");
        Ok(Self {
            name: name.to_string(),
            shared,
            worker: Some(worker),
            worker_id,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> EventHandler {
        EventHandler {
            shared: Arc::clone(&self.shared),
            worker_id: self.worker_id,
        }
    }
}

impl Drop for EventRunner {
    fn drop(&mut self) {
        {
            let mut queue = self.shared.lock();
            queue.stopping = true;
        }
        self.shared.ready.notify_all();
        if let Some(worker) = self.worker.take() {
            // A task dropping the last runner reference must not join itself.
            if thread::current().id() != self.worker_id {
                let _ = worker.join();
            }
        }
        tracing::debug!(runner = %self.name, "event runner stopped");
    }
}

fn run_loop(shared: Arc<Shared>) {
    loop {
        let job = {
            let mut queue = shared.lock();
            loop {
                if let Some(job) = queue.pop() {
                    break Some(job);
                }
                if queue.stopping {
                    break None;
                }
                queue = shared.ready.wait(queue).unwrap_or_else(|e| e.into_inner());
            }
        };
        let Some(job) = job else {
            return;
        };
        tracing::trace!(task = job.name, "running event task");
        (job.task)();
    }
}

/// Posts work onto an [`EventRunner`].
#[derive(Clone)]
pub struct EventHandler {
    shared: Arc<Shared>,
    worker_id: ThreadId,
}

impl EventHandler {
    pub fn post_task(&self, task: Task, name: &'static str, priority: TaskPriority) -> bool {
        {
            let mut queue = self.shared.lock();
            if queue.stopping {
                tracing::warn!(task = name, "event runner is stopping, task dropped");
                return false;
            }
            queue.push(Job { name, task }, priority);
        }
        self.shared.ready.notify_one();
        true
    }

    /// Runs `task` on the loop and blocks until it finished. The task is
    /// queued at high priority, behind every high-priority task posted
    /// before it.
    ///
    /// Called from the loop itself the task runs inline to avoid waiting on
    /// ourselves.
    pub fn post_sync_task(&self, task: Task, name: &'static str) -> bool {
        if self.is_worker_thread() {
            task();
            return true;
        }
        let (tx, rx) = mpsc::channel();
        let posted = self.post_task(
            Box::new(move || {
                task();
                let _ = tx.send(());
            }),
            name,
            TaskPriority::High,
        );
        posted && rx.recv().is_ok()
    }

    pub fn is_worker_thread(&self) -> bool {
        thread::current().id() == self.worker_id
    }

    pub fn pending(&self) -> usize {
        self.shared.lock().len()
    }
}

impl TaskExecutor for EventHandler {
    fn post_task(
        &self,
        task: Task,
        _task_type: TaskType,
        name: &'static str,
        priority: TaskPriority,
    ) -> bool {
        EventHandler::post_task(self, task, name, priority)
    }

    fn post_sync_task(&self, task: Task, _task_type: TaskType, name: &'static str) -> bool {
        EventHandler::post_sync_task(self, task, name)
    }

    fn runs_on_current_thread(&self, _task_type: TaskType) -> bool {
        self.is_worker_thread()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn tasks_run_in_fifo_order_off_the_caller_thread() {
        let runner = EventRunner::create("test-fifo").expect("spawn runner");
        let handler = runner.handler();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let caller = thread::current().id();
        for i in 0..5 {
            let seen = Arc::clone(&seen);
            assert!(handler.post_task(
                Box::new(move || {
                    assert_ne!(thread::current().id(), caller);
                    seen.lock().unwrap().push(i);
                }),
                "push",
                TaskPriority::High,
            ));
        }
        assert!(handler.post_sync_task(Box::new(|| {}), "barrier"));
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn higher_priority_jumps_the_queue() {
        let runner = EventRunner::create("test-priority").expect("spawn runner");
        let handler = runner.handler();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let seen = Arc::new(Mutex::new(Vec::new()));
        // Park the worker so the following posts queue up behind it.
        handler.post_task(
            Box::new(move || {
                let _ = gate_rx.recv();
            }),
            "gate",
            TaskPriority::High,
        );
        for (label, priority) in [
            ("low", TaskPriority::Low),
            ("high", TaskPriority::High),
            ("immediate", TaskPriority::Immediate),
        ] {
            let seen = Arc::clone(&seen);
            handler.post_task(
                Box::new(move || seen.lock().unwrap().push(label)),
                "label",
                priority,
            );
        }
        gate_tx.send(()).unwrap();
        let barrier_seen = Arc::clone(&seen);
        handler.post_task(
            Box::new(move || barrier_seen.lock().unwrap().push("end")),
            "end",
            TaskPriority::Low,
        );
        drop(runner);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["immediate", "high", "low", "end"]
        );
    }

    #[test]
    fn drop_drains_pending_work() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let runner = EventRunner::create("test-drain").expect("spawn runner");
            let handler = runner.handler();
            for _ in 0..10 {
                let counter = Arc::clone(&counter);
                handler.post_task(
                    Box::new(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }),
                    "count",
                    TaskPriority::Low,
                );
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn post_after_stop_is_rejected() {
        let runner = EventRunner::create("test-stop").expect("spawn runner");
        let handler = runner.handler();
        drop(runner);
        assert!(!handler.post_task(Box::new(|| {}), "late", TaskPriority::High));
        assert_eq!(handler.pending(), 0);
    }
}
