//! Tests for the preview admission queue and the runtime wiring.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use youvi_core::error::TaskError;
use youvi_core::scheduler::{
    Priority, PreviewQueue, PreviewQueueConfig, PreviewTask, PriorityQueue, Subject,
};
use youvi_core::{Runtime, RuntimeConfig};

fn logging_task(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> PreviewTask {
    let log = Arc::clone(log);
    PreviewTask::new(move || async move {
        log.lock().push(name);
        Ok(())
    })
}

/// Occupies the only slot until the returned sender fires.
fn hold_slot(queue: &PreviewQueue) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel::<()>();
    queue.enqueue_fn(
        move || async move {
            let _ = rx.await;
            Ok(())
        },
        Priority::HIGH,
        None,
    );
    tx
}

#[test]
fn priority_queue_orders_by_priority() {
    let mut queue: PriorityQueue<&str> = PriorityQueue::new();

    queue.push("low", Priority::LOW);
    queue.push("high", Priority::HIGH);
    queue.push("normal", Priority::NORMAL);

    assert_eq!(queue.pop(), Some("high"));
    assert_eq!(queue.pop(), Some("normal"));
    assert_eq!(queue.pop(), Some("low"));
}

#[tokio::test]
async fn waiting_tasks_run_highest_priority_first() {
    let queue = PreviewQueue::new(PreviewQueueConfig::default());
    let log = Arc::new(Mutex::new(Vec::new()));

    let release = hold_slot(&queue);
    queue.enqueue(logging_task(&log, "p1"), 1, None);
    queue.enqueue(logging_task(&log, "p5"), 5, None);
    queue.enqueue(logging_task(&log, "p3"), 3, None);
    assert_eq!(queue.pending_len(), 3);

    release.send(()).unwrap();
    queue.wait_idle().await;

    assert_eq!(*log.lock(), vec!["p5", "p3", "p1"]);
}

#[tokio::test]
async fn hovering_a_new_card_discards_stale_previews() {
    let queue = PreviewQueue::new(PreviewQueueConfig::default());
    let log = Arc::new(Mutex::new(Vec::new()));
    let card_x = Subject::new("card-x");
    let card_y = Subject::new("card-y");

    let release = hold_slot(&queue);
    queue.enqueue(logging_task(&log, "x-load"), Priority::HIGH, Some(card_x.clone()));
    queue.enqueue(logging_task(&log, "x-play"), Priority::NORMAL, Some(card_x));
    assert_eq!(queue.pending_len(), 2);

    queue.enqueue(logging_task(&log, "y-load"), Priority::HIGH, Some(card_y.clone()));
    assert_eq!(queue.pending_len(), 1);
    assert_eq!(queue.current_subject(), Some(card_y));

    release.send(()).unwrap();
    queue.wait_idle().await;

    assert_eq!(*log.lock(), vec!["y-load"]);
}

#[tokio::test]
async fn failing_tasks_do_not_stall_the_queue() {
    let queue = PreviewQueue::new(PreviewQueueConfig::default());
    let ran = Arc::new(AtomicUsize::new(0));

    let release = hold_slot(&queue);
    queue.enqueue_fn(
        || async { Err::<(), _>(TaskError::failed("video element detached")) },
        Priority::HIGH,
        None,
    );
    let counter = Arc::clone(&ran);
    queue.enqueue_fn(
        move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        Priority::NORMAL,
        None,
    );

    release.send(()).unwrap();
    queue.wait_idle().await;

    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert!(queue.is_idle());
}

#[tokio::test(start_paused = true)]
async fn widened_queue_runs_tasks_side_by_side() {
    let queue = PreviewQueue::new(PreviewQueueConfig { max_concurrent: 2 });
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    for _ in 0..6 {
        let running = Arc::clone(&running);
        let peak = Arc::clone(&peak);
        queue.enqueue_fn(
            move || async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            },
            Priority::NORMAL,
            None,
        );
    }
    assert_eq!(queue.active_count(), 2);

    queue.wait_idle().await;
    assert_eq!(peak.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn runtime_shutdown_drops_queued_previews() {
    let runtime = Runtime::new(RuntimeConfig::default(), None);
    let log = Arc::new(Mutex::new(Vec::new()));

    let release = hold_slot(&runtime.preview_queue);
    runtime
        .preview_queue
        .enqueue(logging_task(&log, "never"), Priority::NORMAL, None);

    tokio::spawn(async move {
        tokio::task::yield_now().await;
        let _ = release.send(());
    });
    runtime.shutdown().await;

    assert!(log.lock().is_empty());
    assert!(runtime.preview_queue.is_idle());
}

#[tokio::test(start_paused = true)]
async fn runtime_loader_without_fetcher_yields_none() {
    let runtime = Runtime::default();
    assert_eq!(runtime.avatar_loader.load("some-channel").await, None);
    assert_eq!(runtime.avatar_loader.cache_size(), 1);
}
