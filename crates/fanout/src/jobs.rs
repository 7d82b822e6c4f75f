//! Background list loading on a bounded pool of workers.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tracing::{debug, warn};

use rustplex_core::{ContentKind, ContentList, TransportError};
use rustplex_remote::RemoteApi;

pub type JobId = u64;

/// Delivered exactly once per scheduled job, on a worker.
pub type Completion = Box<dyn FnOnce(JobId, Result<ContentList, TransportError>) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Normal,
    High,
}

/// Fetch of one content list for one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadJob {
    pub section: String,
    pub url: String,
    pub kind: ContentKind,
}

/// Runs load jobs off the calling thread.
pub trait JobScheduler: Send + Sync {
    /// Queue `job` and return its id without waiting for it.
    ///
    /// `done` may run on another thread before this returns, but never on the
    /// calling thread; callers that record the id hold a lock `done` also takes.
    fn schedule(&self, job: LoadJob, priority: Priority, done: Completion) -> JobId;
}

struct Queued {
    priority: Priority,
    seq: u64,
    id: JobId,
    job: LoadJob,
    done: Completion,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    // Max-heap: higher priority first, then lower sequence number (FIFO).
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct PoolInner {
    remote: Arc<dyn RemoteApi>,
    queue: Mutex<BinaryHeap<Queued>>,
    notify: Notify,
    next_id: AtomicU64,
    closed: AtomicBool,
}

/// Fixed-size pool of tokio workers draining a priority queue.
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

impl WorkerPool {
    /// Spawn `workers` tasks on the current tokio runtime.
    pub fn new(remote: Arc<dyn RemoteApi>, workers: usize) -> Self {
        let inner = Arc::new(PoolInner {
            remote,
            queue: Mutex::new(BinaryHeap::new()),
            notify: Notify::new(),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        });
        for worker in 0..workers.max(1) {
            let inner = inner.clone();
            tokio::spawn(async move { run_worker(worker, inner).await });
        }
        Self { inner }
    }

    /// Jobs waiting for a free worker.
    pub fn pending(&self) -> usize {
        self.inner
            .queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl JobScheduler for WorkerPool {
    fn schedule(&self, job: LoadJob, priority: Priority, done: Completion) -> JobId {
        let id = self.inner.next_id.fetch_add(1, AtomicOrdering::Relaxed);
        debug!(job_id = id, url = %job.url, kind = %job.kind, ?priority, "job queued");
        self.inner
            .queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Queued {
                priority,
                seq: id,
                id,
                job,
                done,
            });
        self.inner.notify.notify_one();
        id
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.inner.closed.store(true, AtomicOrdering::Release);
        self.inner.notify.notify_waiters();
        self.inner.notify.notify_one();
    }
}

async fn run_worker(worker: usize, inner: Arc<PoolInner>) {
    loop {
        let next = inner
            .queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop();

        let Some(queued) = next else {
            if inner.closed.load(AtomicOrdering::Acquire) {
                debug!(worker, "worker stopping");
                // Pass the wakeup on to the next idle worker.
                inner.notify.notify_one();
                return;
            }
            inner.notify.notified().await;
            continue;
        };

        let result = inner.remote.fetch_directory(&queued.job.url, None).await;
        match &result {
            Ok(list) => debug!(
                worker,
                job_id = queued.id,
                section = %queued.job.section,
                items = list.len(),
                "job completed"
            ),
            Err(e) => warn!(
                worker,
                job_id = queued.id,
                section = %queued.job.section,
                error = %e,
                "job failed"
            ),
        }
        (queued.done)(queued.id, result);
    }
}
