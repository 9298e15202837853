// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Job Queue
//!
//! Tokio-based queue backend for single-process deployments and tests:
//! priority-then-FIFO ordering, a dispatcher task per consumer with a
//! semaphore-enforced concurrency ceiling, timer-based delayed delivery
//! (initial delays and nack-with-retry-after), and attempt accounting on
//! reschedule.
//!
//! ## Delivery Loop
//!
//! `pull` installs a single dispatcher task. Per delivery the dispatcher
//! first acquires a concurrency permit, then waits for a ready job, then
//! hands both to a per-job task. After the first delivery of a sweep it
//! opportunistically drains up to `batch_size` ready jobs while permits
//! are immediately available, so a deep backlog does not pay one wakeup
//! per job.
//!
//! ## Close Semantics
//!
//! `close` ceases delivery immediately: the dispatcher exits, in-flight
//! jobs run to completion on their own tasks, and pending retries are
//! dropped with a warning when their timers fire. Jobs still enqueued are
//! abandoned; a process that wants them must drain before closing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, warn};

use recipe_import_domain::services::{JobHandler, JobQueue};
use recipe_import_domain::{
    ImportError, Job, JobDisposition, JobId, PullOptions, PushOptions, QueueName,
};

struct Entry<P> {
    job: Job<P>,
    seq: u64,
}

impl<P> Entry<P> {
    fn priority(&self) -> i32 {
        self.job.priority()
    }
}

impl<P> PartialEq for Entry<P> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl<P> Eq for Entry<P> {}

impl<P> PartialOrd for Entry<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P> Ord for Entry<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: higher priority first, then FIFO by sequence.
        self.priority()
            .cmp(&other.priority())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct State<P> {
    ready: BinaryHeap<Entry<P>>,
    next_seq: u64,
}

struct Inner<P> {
    name: QueueName,
    state: Mutex<State<P>>,
    available: Notify,
    closed: AtomicBool,
    consumer_installed: AtomicBool,
    in_flight: Arc<AtomicUsize>,
    batch_size: usize,
}

impl<P> Inner<P> {
    fn enqueue(&self, job: Job<P>) {
        let mut state = self.state.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.ready.push(Entry { job, seq });
        drop(state);
        self.available.notify_one();
    }

    fn try_pop(&self) -> Option<Job<P>> {
        self.state.lock().ready.pop().map(|entry| entry.job)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(AtomicOrdering::SeqCst)
    }
}

/// Single-process queue backend over a prioritized in-memory heap.
pub struct InMemoryJobQueue<P> {
    inner: Arc<Inner<P>>,
}

impl<P> InMemoryJobQueue<P>
where
    P: Clone + Send + Sync + 'static,
{
    pub fn new(name: QueueName) -> Self {
        Self::with_batch_size(name, 10)
    }

    /// A queue whose dispatcher drains up to `batch_size` ready jobs per
    /// wakeup.
    pub fn with_batch_size(name: QueueName, batch_size: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                state: Mutex::new(State {
                    ready: BinaryHeap::new(),
                    next_seq: 0,
                }),
                available: Notify::new(),
                closed: AtomicBool::new(false),
                consumer_installed: AtomicBool::new(false),
                in_flight: Arc::new(AtomicUsize::new(0)),
                batch_size: batch_size.max(1),
            }),
        }
    }

    /// Jobs currently being processed by the consumer.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(AtomicOrdering::SeqCst)
    }

    fn schedule_after(inner: Arc<Inner<P>>, job: Job<P>, delay: std::time::Duration) {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if inner.is_closed() {
                warn!(
                    queue = %inner.name,
                    job_id = %job.id(),
                    "queue closed while job was waiting; dropping"
                );
                return;
            }
            inner.enqueue(job);
        });
    }

    fn deliver(
        inner: &Arc<Inner<P>>,
        handler: &Arc<dyn JobHandler<P>>,
        job: Job<P>,
        permit: OwnedSemaphorePermit,
    ) {
        let inner = Arc::clone(inner);
        let handler = Arc::clone(handler);
        inner.in_flight.fetch_add(1, AtomicOrdering::SeqCst);
        tokio::spawn(async move {
            let retry_seed = job.clone();
            let job_id = job.id();
            let disposition = handler.handle(job).await;
            match disposition {
                JobDisposition::Ack => {
                    debug!(queue = %inner.name, job_id = %job_id, "job acknowledged");
                }
                JobDisposition::RetryAfter(delay) => {
                    debug!(
                        queue = %inner.name,
                        job_id = %job_id,
                        delay_ms = delay.as_millis() as u64,
                        "job rescheduled"
                    );
                    Self::schedule_after(Arc::clone(&inner), retry_seed.into_retry(), delay);
                }
                JobDisposition::Discard(e) => {
                    error!(
                        queue = %inner.name,
                        job_id = %job_id,
                        error = %e,
                        "job failed terminally"
                    );
                }
            }
            inner.in_flight.fetch_sub(1, AtomicOrdering::SeqCst);
            drop(permit);
        });
    }

    async fn wait_pop(inner: &Arc<Inner<P>>) -> Option<Job<P>> {
        loop {
            if inner.is_closed() {
                return None;
            }
            // Arm the waiter before checking the heap so a concurrent
            // enqueue cannot slip between the check and the wait.
            let notified = inner.available.notified();
            if let Some(job) = inner.try_pop() {
                return Some(job);
            }
            notified.await;
        }
    }
}

#[async_trait]
impl<P> JobQueue<P> for InMemoryJobQueue<P>
where
    P: Clone + Send + Sync + 'static,
{
    fn name(&self) -> QueueName {
        self.inner.name
    }

    async fn push(&self, payload: P, opts: PushOptions) -> Result<JobId, ImportError> {
        if self.inner.is_closed() {
            return Err(ImportError::queue(format!("queue {} is closed", self.inner.name)));
        }
        let job = Job::with_priority(payload, opts.priority);
        let job_id = job.id();
        match opts.delay {
            Some(delay) => Self::schedule_after(Arc::clone(&self.inner), job, delay),
            None => self.inner.enqueue(job),
        }
        debug!(queue = %self.inner.name, job_id = %job_id, "job enqueued");
        Ok(job_id)
    }

    async fn pull(
        &self,
        handler: Arc<dyn JobHandler<P>>,
        opts: PullOptions,
    ) -> Result<(), ImportError> {
        if self.inner.is_closed() {
            return Err(ImportError::queue(format!("queue {} is closed", self.inner.name)));
        }
        if self
            .inner
            .consumer_installed
            .compare_exchange(false, true, AtomicOrdering::SeqCst, AtomicOrdering::SeqCst)
            .is_err()
        {
            return Err(ImportError::queue(format!(
                "queue {} already has a consumer",
                self.inner.name
            )));
        }

        let inner = Arc::clone(&self.inner);
        let concurrency = opts.concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));

        info!(queue = %inner.name, concurrency, "consumer installed");
        tokio::spawn(async move {
            loop {
                let permit = match Arc::clone(&semaphore).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break,
                };
                let Some(job) = Self::wait_pop(&inner).await else {
                    break;
                };
                Self::deliver(&inner, &handler, job, permit);

                // Opportunistic drain while permits are free.
                for _ in 1..inner.batch_size {
                    let Ok(permit) = Arc::clone(&semaphore).try_acquire_owned() else {
                        break;
                    };
                    let Some(job) = inner.try_pop() else {
                        drop(permit);
                        break;
                    };
                    Self::deliver(&inner, &handler, job, permit);
                }
            }
            debug!(queue = %inner.name, "dispatcher stopped");
        });

        Ok(())
    }

    async fn ping(&self) -> Result<(), ImportError> {
        if self.inner.is_closed() {
            Err(ImportError::queue(format!("queue {} is closed", self.inner.name)))
        } else {
            Ok(())
        }
    }

    fn depth(&self) -> usize {
        self.inner.state.lock().ready.len()
    }

    async fn close(&self) -> Result<(), ImportError> {
        if self.inner.closed.swap(true, AtomicOrdering::SeqCst) {
            return Ok(());
        }
        info!(queue = %self.inner.name, "queue closing");
        // notify_one stores a permit for a dispatcher that has not yet
        // parked; notify_waiters wakes one that has.
        self.inner.available.notify_waiters();
        self.inner.available.notify_one();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;
    use std::time::Duration;

    struct Recorder {
        handled: PlMutex<Vec<(JobId, u32, String)>>,
        disposition: Box<dyn Fn(u32) -> JobDisposition + Send + Sync>,
    }

    impl Recorder {
        fn acking() -> Arc<Self> {
            Arc::new(Self {
                handled: PlMutex::new(Vec::new()),
                disposition: Box::new(|_| JobDisposition::Ack),
            })
        }

        fn with(disposition: impl Fn(u32) -> JobDisposition + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                handled: PlMutex::new(Vec::new()),
                disposition: Box::new(disposition),
            })
        }

        fn handled(&self) -> Vec<(JobId, u32, String)> {
            self.handled.lock().clone()
        }
    }

    #[async_trait]
    impl JobHandler<String> for Recorder {
        async fn handle(&self, job: Job<String>) -> JobDisposition {
            let attempt = job.attempt();
            self.handled.lock().push((job.id(), attempt, job.payload().clone()));
            (self.disposition)(attempt)
        }
    }

    async fn wait_until(mut check: impl FnMut() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_push_pull_roundtrip() {
        let queue = InMemoryJobQueue::<String>::new(QueueName::Image);
        let handler = Recorder::acking();
        queue.pull(handler.clone(), PullOptions::default()).await.unwrap();

        let job_id = queue.push("a".to_string(), PushOptions::default()).await.unwrap();
        wait_until(|| handler.handled().len() == 1).await;

        let handled = handler.handled();
        assert_eq!(handled[0].0, job_id);
        assert_eq!(handled[0].1, 0);
        assert_eq!(handled[0].2, "a");
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn test_priority_orders_ready_jobs() {
        let queue = InMemoryJobQueue::<String>::new(QueueName::Notes);
        queue.push("low".to_string(), PushOptions::default()).await.unwrap();
        queue
            .push("high".to_string(), PushOptions::with_priority(10))
            .await
            .unwrap();
        queue.push("mid".to_string(), PushOptions::with_priority(5)).await.unwrap();

        let handler = Recorder::acking();
        queue.pull(handler.clone(), PullOptions { concurrency: 1 }).await.unwrap();
        wait_until(|| handler.handled().len() == 3).await;

        let order: Vec<String> = handler.handled().into_iter().map(|(_, _, p)| p).collect();
        assert_eq!(order, vec!["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn test_retry_bumps_attempt_and_redelivers() {
        let queue = InMemoryJobQueue::<String>::new(QueueName::Image);
        let handler = Recorder::with(|attempt| {
            if attempt == 0 {
                JobDisposition::RetryAfter(Duration::from_millis(10))
            } else {
                JobDisposition::Ack
            }
        });
        queue.pull(handler.clone(), PullOptions::default()).await.unwrap();
        let job_id = queue.push("again".to_string(), PushOptions::default()).await.unwrap();

        wait_until(|| handler.handled().len() == 2).await;
        let handled = handler.handled();
        assert_eq!(handled[0], (job_id, 0, "again".to_string()));
        assert_eq!(handled[1], (job_id, 1, "again".to_string()));
    }

    #[tokio::test]
    async fn test_delayed_push_is_not_immediately_visible() {
        let queue = InMemoryJobQueue::<String>::new(QueueName::Image);
        queue
            .push(
                "later".to_string(),
                PushOptions::with_delay(Duration::from_millis(50)),
            )
            .await
            .unwrap();
        assert_eq!(queue.depth(), 0);

        let handler = Recorder::acking();
        queue.pull(handler.clone(), PullOptions::default()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(handler.handled().is_empty());
        wait_until(|| handler.handled().len() == 1).await;
    }

    #[tokio::test]
    async fn test_discard_drops_job() {
        let queue = InMemoryJobQueue::<String>::new(QueueName::Image);
        let handler =
            Recorder::with(|_| JobDisposition::Discard(ImportError::validation("terminal")));
        queue.pull(handler.clone(), PullOptions::default()).await.unwrap();
        queue.push("doomed".to_string(), PushOptions::default()).await.unwrap();

        wait_until(|| handler.handled().len() == 1).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(handler.handled().len(), 1);
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn test_close_stops_delivery_and_push() {
        let queue = InMemoryJobQueue::<String>::new(QueueName::Image);
        let handler = Recorder::acking();
        queue.pull(handler.clone(), PullOptions::default()).await.unwrap();
        queue.close().await.unwrap();
        assert!(queue.push("rejected".to_string(), PushOptions::default()).await.is_err());
        assert!(queue.ping().await.is_err());
        // Close is idempotent.
        queue.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_second_consumer_is_rejected() {
        let queue = InMemoryJobQueue::<String>::new(QueueName::Image);
        queue.pull(Recorder::acking(), PullOptions::default()).await.unwrap();
        let err = queue
            .pull(Recorder::acking(), PullOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already has a consumer"));
    }

    #[tokio::test]
    async fn test_concurrency_ceiling_is_enforced() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Slow {
            current: Arc<AtomicUsize>,
            peak: Arc<AtomicUsize>,
        }

        #[async_trait]
        impl JobHandler<String> for Slow {
            async fn handle(&self, _job: Job<String>) -> JobDisposition {
                let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                self.current.fetch_sub(1, Ordering::SeqCst);
                JobDisposition::Ack
            }
        }

        let queue = InMemoryJobQueue::<String>::new(QueueName::Image);
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Slow {
            current: Arc::clone(&current),
            peak: Arc::clone(&peak),
        });

        for i in 0..12 {
            queue.push(format!("j{i}"), PushOptions::default()).await.unwrap();
        }
        queue.pull(handler, PullOptions { concurrency: 3 }).await.unwrap();

        wait_until(|| queue.depth() == 0 && current.load(Ordering::SeqCst) == 0).await;
        assert!(peak.load(Ordering::SeqCst) <= 3, "peak was {}", peak.load(Ordering::SeqCst));
    }
}
