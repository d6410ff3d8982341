//! Bounded in-process event queue.
//!
//! Producers enqueue without blocking; a single worker task drains the
//! queue in FIFO order and hands each event to an [`EventProcessor`].
//! When the queue is full the enqueue is rejected, never delayed. Failed
//! events are re-enqueued with an attempt counter and dropped after the
//! retry budget is spent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default queue capacity.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Re-enqueues per failed event before it is dropped.
pub const MAX_RETRIES: u32 = 3;

/// One queued workflow event.
#[derive(Debug, Clone)]
pub struct Event {
    /// Event name, one of [`deciframe_core::workflow::events`].
    pub name: String,
    /// Tenant the event belongs to.
    pub organization_id: i32,
    /// Event context document (entity projections, acting user).
    pub context: Value,
    /// Zero-based processing attempt.
    pub attempt: u32,
}

impl Event {
    /// Creates a first-attempt event.
    #[must_use]
    pub fn new(name: impl Into<String>, organization_id: i32, context: Value) -> Self {
        Self {
            name: name.into(),
            organization_id,
            context,
            attempt: 0,
        }
    }
}

/// Processes one event pulled off the queue.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    /// Handles the event. An error triggers a bounded retry.
    async fn process(&self, event: &Event) -> Result<(), ProcessError>;
}

/// Failure surfaced by an [`EventProcessor`].
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ProcessError(pub String);

impl ProcessError {
    /// Wraps any displayable error.
    pub fn new(source: impl std::fmt::Display) -> Self {
        Self(source.to_string())
    }
}

/// Rejection returned when the queue is at capacity.
#[derive(Debug, thiserror::Error)]
#[error("event queue is full")]
pub struct QueueFull;

/// Lifetime counters for the queue.
#[derive(Debug, Default)]
pub struct QueueStats {
    accepted: AtomicU64,
    rejected: AtomicU64,
    processed: AtomicU64,
    retried: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time view of [`QueueStats`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QueueSnapshot {
    /// Events accepted by `enqueue`.
    pub accepted: u64,
    /// Events rejected because the queue was full.
    pub rejected: u64,
    /// Events processed to completion.
    pub processed: u64,
    /// Re-enqueues after a processing failure.
    pub retried: u64,
    /// Events dropped after the retry budget or a full queue on retry.
    pub dropped: u64,
    /// Events currently waiting in the queue.
    pub depth: u64,
}

/// Cloneable producer handle.
#[derive(Debug, Clone)]
pub struct EventQueue {
    tx: mpsc::Sender<Event>,
    capacity: usize,
    stats: Arc<QueueStats>,
}

impl EventQueue {
    /// Creates a queue and its worker half.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, EventWorker) {
        let (tx, rx) = mpsc::channel(capacity);
        let queue = Self {
            tx,
            capacity,
            stats: Arc::new(QueueStats::default()),
        };
        let worker = EventWorker {
            rx,
            queue: queue.clone(),
        };
        (queue, worker)
    }

    /// Enqueues an event without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`QueueFull`] when the queue is at capacity. The event is
    /// lost; callers on the request path log and move on.
    pub fn enqueue(&self, event: Event) -> Result<(), QueueFull> {
        match self.tx.try_send(event) {
            Ok(()) => {
                self.stats.accepted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(event = %event.name, "event queue full; rejecting enqueue");
                Err(QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                error!(event = %event.name, "event queue closed; rejecting enqueue");
                Err(QueueFull)
            }
        }
    }

    /// Current counters and queue depth.
    #[must_use]
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            accepted: self.stats.accepted.load(Ordering::Relaxed),
            rejected: self.stats.rejected.load(Ordering::Relaxed),
            processed: self.stats.processed.load(Ordering::Relaxed),
            retried: self.stats.retried.load(Ordering::Relaxed),
            dropped: self.stats.dropped.load(Ordering::Relaxed),
            depth: (self.capacity - self.tx.capacity()) as u64,
        }
    }
}

/// Consumer half of the queue; owns the single worker loop.
pub struct EventWorker {
    rx: mpsc::Receiver<Event>,
    queue: EventQueue,
}

impl EventWorker {
    /// Drains the queue until cancelled.
    ///
    /// Stops between events on cancellation; the in-flight event finishes
    /// first.
    pub async fn run(mut self, processor: Arc<dyn EventProcessor>, cancel: CancellationToken) {
        info!("event worker started");
        loop {
            let event = tokio::select! {
                () = cancel.cancelled() => break,
                received = self.rx.recv() => match received {
                    Some(event) => event,
                    None => break,
                },
            };
            self.handle(processor.as_ref(), event).await;
        }
        info!("event worker stopped");
    }

    async fn handle(&self, processor: &dyn EventProcessor, event: Event) {
        let stats = &self.queue.stats;
        match processor.process(&event).await {
            Ok(()) => {
                stats.processed.fetch_add(1, Ordering::Relaxed);
                debug!(event = %event.name, attempt = event.attempt, "event processed");
            }
            Err(e) if event.attempt < MAX_RETRIES => {
                warn!(
                    event = %event.name,
                    attempt = event.attempt,
                    error = %e,
                    "event processing failed; re-enqueueing"
                );
                let retry = Event {
                    attempt: event.attempt + 1,
                    ..event
                };
                if self.queue.tx.try_send(retry).is_ok() {
                    stats.retried.fetch_add(1, Ordering::Relaxed);
                } else {
                    stats.dropped.fetch_add(1, Ordering::Relaxed);
                    warn!("event queue full on retry; dropping event");
                }
            }
            Err(e) => {
                stats.dropped.fetch_add(1, Ordering::Relaxed);
                error!(
                    event = %event.name,
                    attempts = event.attempt + 1,
                    error = %e,
                    "event dropped after exhausting retries"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    struct CountingProcessor {
        seen: Mutex<Vec<(String, u32)>>,
        fail: bool,
    }

    impl CountingProcessor {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl EventProcessor for CountingProcessor {
        async fn process(&self, event: &Event) -> Result<(), ProcessError> {
            self.seen
                .lock()
                .unwrap()
                .push((event.name.clone(), event.attempt));
            if self.fail {
                Err(ProcessError::new("handler blew up"))
            } else {
                Ok(())
            }
        }
    }

    fn event(name: &str) -> Event {
        Event::new(name, 1, json!({"problem": {"id": 1}}))
    }

    #[test]
    fn test_enqueue_rejects_when_full() {
        let (queue, _worker) = EventQueue::bounded(4);
        for i in 0..4 {
            assert!(queue.enqueue(event(&format!("problem_created_{i}"))).is_ok());
        }
        assert!(queue.enqueue(event("problem_created_overflow")).is_err());

        let snap = queue.snapshot();
        assert_eq!(snap.accepted, 4);
        assert_eq!(snap.rejected, 1);
        assert_eq!(snap.depth, 4);
    }

    #[tokio::test]
    async fn test_worker_processes_in_order() {
        let (queue, worker) = EventQueue::bounded(16);
        let processor = CountingProcessor::new(false);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(worker.run(processor.clone(), cancel.clone()));

        queue.enqueue(event("problem_created")).unwrap();
        queue.enqueue(event("case_approved")).unwrap();
        queue.enqueue(event("project_created")).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        handle.await.unwrap();

        let seen = processor.seen.lock().unwrap();
        let names: Vec<&str> = seen.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["problem_created", "case_approved", "project_created"]);
        assert_eq!(queue.snapshot().processed, 3);
    }

    #[tokio::test]
    async fn test_failed_event_retried_then_dropped() {
        let (queue, worker) = EventQueue::bounded(16);
        let processor = CountingProcessor::new(true);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(worker.run(processor.clone(), cancel.clone()));

        queue.enqueue(event("case_submitted")).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        handle.await.unwrap();

        // Three retries on top of the first attempt, then the drop.
        let attempts: Vec<u32> = processor.seen.lock().unwrap().iter().map(|(_, a)| *a).collect();
        assert_eq!(attempts, [0, 1, 2, 3]);

        let snap = queue.snapshot();
        assert_eq!(snap.retried, 3);
        assert_eq!(snap.dropped, 1);
        assert_eq!(snap.processed, 0);
    }

    #[tokio::test]
    async fn test_shutdown_is_cooperative() {
        let (queue, worker) = EventQueue::bounded(4);
        let processor = CountingProcessor::new(false);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(worker.run(processor, cancel.clone()));

        cancel.cancel();
        handle.await.unwrap();
        drop(queue);
    }
}
