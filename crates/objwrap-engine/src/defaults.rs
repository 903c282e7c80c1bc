//! Default constants for runtime configuration.

/// Default number of IO worker threads executing blocking native calls.
pub const DEFAULT_IO_WORKER_COUNT: usize = 4;

/// Default time to wait for the worker threads to exit on shutdown, in milliseconds.
/// The budget is shared by all workers.
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 2000;

/// How often an idle worker re-checks the shutdown flag, in milliseconds.
pub const WORKER_POLL_INTERVAL_MS: u64 = 100;

/// How often shutdown re-checks which workers have exited, in milliseconds.
pub const SHUTDOWN_POLL_INTERVAL_MS: u64 = 5;

/// Default worker thread name prefix; the worker index is appended.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "objwrap-io-worker";

/// Largest integer a `Number` represents exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Environment variable overriding the IO worker count.
pub const ENV_IO_WORKERS: &str = "OBJWRAP_IO_WORKERS";

/// Environment variable selecting the strict argument policy (`1`, `true`, `yes`).
pub const ENV_STRICT_ARGS: &str = "OBJWRAP_STRICT_ARGS";
