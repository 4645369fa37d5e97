//! Hover preview admission queue.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::priority::{Priority, PriorityQueue};
use super::task::{PreviewTask, QueueEntry, Subject};
use crate::error::TaskError;
use crate::telemetry;

/// Configuration for the preview queue.
#[derive(Debug, Clone)]
pub struct PreviewQueueConfig {
    /// Maximum number of tasks executing at once. Values below 1 act as 1.
    pub max_concurrent: usize,
}

impl Default for PreviewQueueConfig {
    fn default() -> Self {
        Self { max_concurrent: 1 }
    }
}

struct QueueState {
    pending: PriorityQueue<QueueEntry>,
    active_count: usize,
    current_subject: Option<Subject>,
}

impl QueueState {
    fn is_idle(&self) -> bool {
        self.active_count == 0 && self.pending.is_empty()
    }
}

struct QueueInner {
    state: Mutex<QueueState>,
    max_concurrent: usize,
    next_id: AtomicU64,
    /// Woken whenever the queue becomes idle.
    idle: Notify,
}

/// Priority queue that admits at most `max_concurrent` preview tasks at a
/// time and drops stale work when the hovered subject changes.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct PreviewQueue {
    inner: Arc<QueueInner>,
}

impl PreviewQueue {
    pub fn new(config: PreviewQueueConfig) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState {
                    pending: PriorityQueue::new(),
                    active_count: 0,
                    current_subject: None,
                }),
                max_concurrent: config.max_concurrent.max(1),
                next_id: AtomicU64::new(1),
                idle: Notify::new(),
            }),
        }
    }

    /// Queue a task. Fire-and-forget: the caller never observes the outcome.
    ///
    /// A `Some` subject that differs from the tracked one discards all pending
    /// work first. Already running tasks are never interrupted. Must be called
    /// from within a Tokio runtime.
    pub fn enqueue(&self, task: PreviewTask, priority: impl Into<Priority>, subject: Option<Subject>) {
        let priority = priority.into();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        {
            let mut state = self.inner.state.lock();
            if let Some(subject) = &subject {
                let changed = state
                    .current_subject
                    .as_ref()
                    .is_some_and(|current| current != subject);
                if changed {
                    let dropped = state.pending.clear();
                    tracing::debug!(
                        subject = %subject,
                        dropped,
                        "subject changed, discarding pending previews"
                    );
                    telemetry::record_tasks_discarded(dropped);
                }
                state.current_subject = Some(subject.clone());
            }

            state.pending.push(QueueEntry { id, task, priority, subject }, priority);
            telemetry::record_queue_depth(state.pending.len());
        }

        self.inner.dispatch();
    }

    /// Enqueue a closure directly. Shorthand for `enqueue(PreviewTask::new(f), ..)`.
    pub fn enqueue_fn<F, Fut>(&self, f: F, priority: impl Into<Priority>, subject: Option<Subject>)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.enqueue(PreviewTask::new(f), priority, subject);
    }

    /// Discard all pending tasks and forget the tracked subject.
    ///
    /// Returns the number of discarded tasks.
    pub fn clear(&self) -> usize {
        let (dropped, idle) = {
            let mut state = self.inner.state.lock();
            let dropped = state.pending.clear();
            state.current_subject = None;
            telemetry::record_queue_depth(0);
            (dropped, state.is_idle())
        };
        telemetry::record_tasks_discarded(dropped);
        if idle {
            self.inner.idle.notify_waiters();
        }
        dropped
    }

    /// Number of tasks currently executing.
    pub fn active_count(&self) -> usize {
        self.inner.state.lock().active_count
    }

    /// Number of tasks waiting for a slot.
    pub fn pending_len(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    pub fn current_subject(&self) -> Option<Subject> {
        self.inner.state.lock().current_subject.clone()
    }

    pub fn max_concurrent(&self) -> usize {
        self.inner.max_concurrent
    }

    /// True when nothing is pending or running.
    pub fn is_idle(&self) -> bool {
        self.inner.state.lock().is_idle()
    }

    /// Wait until nothing is pending or running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for PreviewQueue {
    fn default() -> Self {
        Self::new(PreviewQueueConfig::default())
    }
}

impl QueueInner {
    /// Move pending entries into free slots, highest priority first.
    fn dispatch(self: &Arc<Self>) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("preview queue dispatched outside a Tokio runtime; tasks stay pending");
            return;
        };

        let ready = {
            let mut state = self.state.lock();
            let mut ready = Vec::new();
            while state.active_count < self.max_concurrent {
                let Some(entry) = state.pending.pop() else {
                    break;
                };
                state.active_count += 1;
                ready.push(entry);
            }
            if !ready.is_empty() {
                telemetry::record_queue_depth(state.pending.len());
            }
            ready
        };

        for entry in ready {
            let slot = ActiveSlot { inner: Arc::clone(self) };
            handle.spawn(run_entry(entry, slot));
        }
    }

    /// Release one slot and keep draining.
    fn release(self: &Arc<Self>) {
        let (idle, has_pending) = {
            let mut state = self.state.lock();
            state.active_count = state.active_count.saturating_sub(1);
            (state.is_idle(), !state.pending.is_empty())
        };
        if has_pending {
            self.dispatch();
        } else if idle {
            self.idle.notify_waiters();
        }
    }
}

async fn run_entry(entry: QueueEntry, slot: ActiveSlot) {
    let _slot = slot;
    let QueueEntry { id, task, priority, subject } = entry;
    telemetry::record_task_dispatched();

    let outcome = AssertUnwindSafe(async move { task.start().await })
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(TaskError::Panicked(panic_message(panic.as_ref()))));

    match outcome {
        Ok(()) => telemetry::record_task_outcome("ok"),
        Err(e) => {
            tracing::warn!(
                task_id = id,
                priority = priority.value(),
                subject = subject.as_ref().map(Subject::as_str),
                error = %e,
                "hover preview task failed"
            );
            telemetry::record_task_outcome("failed");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// RAII guard for an occupied execution slot. Frees the slot and resumes
/// draining when dropped, whether the task finished, failed or was aborted.
struct ActiveSlot {
    inner: Arc<QueueInner>,
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        self.inner.release();
    }
}
