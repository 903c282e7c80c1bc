//! IO worker pool
//!
//! A fixed set of named threads executing blocking jobs. Jobs carry their own
//! completion handoff; the pool only runs them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::defaults::{SHUTDOWN_POLL_INTERVAL_MS, WORKER_POLL_INTERVAL_MS};
use crate::error::{BridgeError, BridgeResult};

/// Unit of blocking work
pub(crate) type Job = Box<dyn FnOnce() + Send>;

pub(crate) struct WorkerPool {
    /// Channel: logical thread → workers (dropped on shutdown to unblock them)
    job_tx: Mutex<Option<Sender<Job>>>,
    /// Shutdown signal
    shutdown: Arc<AtomicBool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    join_timeout: Duration,
}

impl WorkerPool {
    /// Spawn `count` workers named `{prefix}-{index}`.
    pub(crate) fn start(count: usize, prefix: &str, join_timeout: Duration) -> BridgeResult<Self> {
        let (job_tx, job_rx) = channel::unbounded::<Job>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let pool = Self {
            job_tx: Mutex::new(Some(job_tx)),
            shutdown: shutdown.clone(),
            handles: Mutex::new(Vec::with_capacity(count)),
            join_timeout,
        };

        for i in 0..count.max(1) {
            let rx = job_rx.clone();
            let shutdown = shutdown.clone();
            let handle = thread::Builder::new()
                .name(format!("{}-{}", prefix, i))
                .spawn(move || Self::worker_loop(rx, shutdown))
                .map_err(BridgeError::Spawn)?;
            pool.handles.lock().push(handle);
        }

        debug!(workers = count.max(1), "io worker pool started");
        Ok(pool)
    }

    /// Queue a job for the next free worker.
    pub(crate) fn submit(&self, job: Job) -> BridgeResult<()> {
        let tx = self.job_tx.lock();
        match tx.as_ref() {
            Some(tx) => tx.send(job).map_err(|_| BridgeError::RuntimeShutdown),
            None => Err(BridgeError::RuntimeShutdown),
        }
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.handles.lock().len()
    }

    /// Signal shutdown and join the workers that exit before the join
    /// timeout; the rest are detached. Queued jobs that have not started are
    /// dropped.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.job_tx.lock().take();

        let mut running: Vec<_> = self.handles.lock().drain(..).collect();
        if running.is_empty() {
            return;
        }
        let deadline = Instant::now() + self.join_timeout;
        let poll = Duration::from_millis(SHUTDOWN_POLL_INTERVAL_MS);
        loop {
            let (exited, blocked): (Vec<_>, Vec<_>) =
                running.into_iter().partition(JoinHandle::is_finished);
            for handle in exited {
                let _ = handle.join();
            }
            running = blocked;
            if running.is_empty() || Instant::now() >= deadline {
                break;
            }
            thread::sleep(poll);
        }
        if !running.is_empty() {
            // Dropping a JoinHandle detaches its thread
            warn!(
                detached = running.len(),
                "io workers still blocked at shutdown were detached"
            );
        }
        debug!("io worker pool stopped");
    }

    fn worker_loop(job_rx: Receiver<Job>, shutdown: Arc<AtomicBool>) {
        let poll = Duration::from_millis(WORKER_POLL_INTERVAL_MS);
        while !shutdown.load(Ordering::Acquire) {
            let job = match job_rx.recv_timeout(poll) {
                Ok(job) => job,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };
            job();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
