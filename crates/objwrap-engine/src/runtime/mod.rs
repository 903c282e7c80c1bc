//! The logical thread
//!
//! `Runtime` owns every dynamic value and runs all user-visible work on the
//! thread that created it. Blocking native calls are handed to the IO worker
//! pool with [`Runtime::spawn_blocking`]; their results come back through a
//! per-task single-slot channel and are delivered to the task's continuation
//! when the embedder drives the runtime with [`Runtime::run_until_idle`] or
//! [`Runtime::run_pending`].
//!
//! `Runtime` is `!Send`: continuations may capture dynamic values, which must
//! never reach another thread.

mod pool;
pub mod value;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::error::{BridgeError, BridgeResult};
use crate::options::RuntimeOptions;
use pool::WorkerPool;

pub use value::{BufferRef, FunctionRef, NativeRef, ObjectRef, Value};

/// Identifier of a blocking task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Continuation waiting for its task's result
type Continuation = Box<dyn FnOnce(&Runtime)>;

/// Single-threaded dynamic runtime with an IO worker pool
pub struct Runtime {
    options: RuntimeOptions,
    pool: WorkerPool,
    /// Workers announce finished tasks here
    done_tx: Sender<TaskId>,
    done_rx: Receiver<TaskId>,
    pending: RefCell<FxHashMap<TaskId, Continuation>>,
    next_task: Cell<u64>,
    _not_send: PhantomData<Rc<()>>,
}

impl Runtime {
    /// Create a runtime with default options
    pub fn new() -> BridgeResult<Self> {
        Self::with_options(RuntimeOptions::default())
    }

    /// Create a runtime with specific options
    pub fn with_options(options: RuntimeOptions) -> BridgeResult<Self> {
        let pool = WorkerPool::start(
            options.io_worker_count,
            &options.thread_name_prefix,
            options.shutdown_timeout,
        )?;
        let (done_tx, done_rx) = channel::unbounded();
        debug!(
            io_workers = pool.worker_count(),
            policy = ?options.argument_policy,
            "runtime created"
        );
        Ok(Self {
            options,
            pool,
            done_tx,
            done_rx,
            pending: RefCell::new(FxHashMap::default()),
            next_task: Cell::new(1),
            _not_send: PhantomData,
        })
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    pub fn io_worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Number of tasks whose continuation has not run yet
    pub fn pending_tasks(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Run `work` on an IO worker, then `complete` on this thread.
    ///
    /// `complete` runs exactly once, during a later `run_*` call, with the
    /// work's return value or `BridgeError::WorkerPanicked`. It never runs
    /// if the work blocks forever.
    pub fn spawn_blocking<T, W, C>(&self, work: W, complete: C) -> BridgeResult<TaskId>
    where
        T: Send + 'static,
        W: FnOnce() -> T + Send + 'static,
        C: FnOnce(&Runtime, BridgeResult<T>) + 'static,
    {
        let id = TaskId(self.next_task.get());
        self.next_task.set(id.0 + 1);

        // Single-slot handoff: one producer (the worker), one consumer (us)
        let (result_tx, result_rx) = channel::bounded::<BridgeResult<T>>(1);
        let done_tx = self.done_tx.clone();
        let job = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(work))
                .map_err(|payload| BridgeError::WorkerPanicked(panic_message(payload.as_ref())));
            let _ = result_tx.send(result);
            let _ = done_tx.send(id);
        });

        let continuation: Continuation = Box::new(move |rt: &Runtime| {
            let result = result_rx
                .try_recv()
                .unwrap_or(Err(BridgeError::RuntimeShutdown));
            complete(rt, result);
        });
        self.pending.borrow_mut().insert(id, continuation);

        if let Err(err) = self.pool.submit(job) {
            self.pending.borrow_mut().remove(&id);
            return Err(err);
        }
        trace!(task = %id, "blocking task scheduled");
        Ok(id)
    }

    /// Call a dynamic function; non-functions yield `Undefined`
    pub fn call(&self, function: &Value, args: &[Value]) -> Value {
        match function {
            Value::Function(f) => f(self, args),
            other => {
                warn!(got = other.type_name(), "attempted to call a non-function");
                Value::Undefined
            }
        }
    }

    /// Run every continuation whose task has already finished, without
    /// blocking. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(id) = self.done_rx.try_recv() {
            if self.complete(id) {
                ran += 1;
            }
        }
        ran
    }

    /// Block until no task is pending, running continuations as their tasks
    /// finish. Continuations may schedule further tasks; those are waited for
    /// too. Returns how many continuations ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.pending_tasks() > 0 {
            // `done_tx` lives in `self`, so the channel never disconnects
            let Ok(id) = self.done_rx.recv() else { break };
            if self.complete(id) {
                ran += 1;
            }
        }
        ran
    }

    /// Like [`run_until_idle`](Self::run_until_idle), giving up after `timeout`.
    pub fn run_until_idle_timeout(&self, timeout: Duration) -> BridgeResult<usize> {
        let start = Instant::now();
        let mut ran = 0;
        while self.pending_tasks() > 0 {
            let remaining = timeout.saturating_sub(start.elapsed());
            match self.done_rx.recv_timeout(remaining) {
                Ok(id) => {
                    if self.complete(id) {
                        ran += 1;
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return Err(BridgeError::Timeout {
                        elapsed: start.elapsed(),
                        pending: self.pending_tasks(),
                    });
                }
            }
        }
        Ok(ran)
    }

    fn complete(&self, id: TaskId) -> bool {
        // Release the borrow before running: the continuation may spawn
        let continuation = self.pending.borrow_mut().remove(&id);
        match continuation {
            Some(continuation) => {
                trace!(task = %id, "running continuation");
                continuation(self);
                true
            }
            None => false,
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        let abandoned = self.pending.get_mut().len();
        if abandoned > 0 {
            debug!(abandoned, "runtime dropped with pending tasks");
        }
        self.pool.shutdown();
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
