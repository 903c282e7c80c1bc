//! Runtime configuration

use std::time::Duration;

use crate::defaults::{
    DEFAULT_IO_WORKER_COUNT, DEFAULT_SHUTDOWN_TIMEOUT_MS, DEFAULT_THREAD_NAME_PREFIX,
    ENV_IO_WORKERS, ENV_STRICT_ARGS,
};

/// How proxy methods treat arguments of the wrong shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgumentPolicy {
    /// Ignore the call and log a warning
    #[default]
    Lenient,
    /// Fail the call with `BridgeError::InvalidArgument`
    Strict,
}

/// Runtime options
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Number of IO worker threads (at least one is always started)
    pub io_worker_count: usize,

    /// Argument handling for `pull`, `push` and `setCapsFromString`
    pub argument_policy: ArgumentPolicy,

    /// Join timeout on shutdown, shared by all workers; stuck workers are detached
    pub shutdown_timeout: Duration,

    /// Worker thread name prefix
    pub thread_name_prefix: String,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            io_worker_count: DEFAULT_IO_WORKER_COUNT,
            argument_policy: ArgumentPolicy::default(),
            shutdown_timeout: Duration::from_millis(DEFAULT_SHUTDOWN_TIMEOUT_MS),
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }
}

impl RuntimeOptions {
    /// Defaults overridden by `OBJWRAP_IO_WORKERS` and `OBJWRAP_STRICT_ARGS`.
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();
        if let Some(count) = lookup(ENV_IO_WORKERS).and_then(|v| v.trim().parse::<usize>().ok()) {
            options.io_worker_count = count.max(1);
        }
        if let Some(strict) = lookup(ENV_STRICT_ARGS) {
            if matches!(
                strict.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ) {
                options.argument_policy = ArgumentPolicy::Strict;
            }
        }
        options
    }

    pub fn with_io_workers(mut self, count: usize) -> Self {
        self.io_worker_count = count.max(1);
        self
    }

    pub fn with_argument_policy(mut self, policy: ArgumentPolicy) -> Self {
        self.argument_policy = policy;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: FxHashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let options = RuntimeOptions::default();
        assert_eq!(options.io_worker_count, 4);
        assert_eq!(options.argument_policy, ArgumentPolicy::Lenient);
        assert_eq!(options.shutdown_timeout, Duration::from_secs(2));
        assert_eq!(options.thread_name_prefix, "objwrap-io-worker");
    }

    #[test]
    fn test_env_overrides() {
        let options = RuntimeOptions::from_lookup(lookup(&[
            ("OBJWRAP_IO_WORKERS", "7"),
            ("OBJWRAP_STRICT_ARGS", "true"),
        ]));
        assert_eq!(options.io_worker_count, 7);
        assert_eq!(options.argument_policy, ArgumentPolicy::Strict);
    }

    #[test]
    fn test_env_garbage_ignored() {
        let options = RuntimeOptions::from_lookup(lookup(&[
            ("OBJWRAP_IO_WORKERS", "many"),
            ("OBJWRAP_STRICT_ARGS", "nope"),
        ]));
        assert_eq!(options.io_worker_count, 4);
        assert_eq!(options.argument_policy, ArgumentPolicy::Lenient);
    }

    #[test]
    fn test_zero_workers_clamped() {
        assert_eq!(RuntimeOptions::default().with_io_workers(0).io_worker_count, 1);
        let options = RuntimeOptions::from_lookup(lookup(&[("OBJWRAP_IO_WORKERS", "0")]));
        assert_eq!(options.io_worker_count, 1);
    }
}
