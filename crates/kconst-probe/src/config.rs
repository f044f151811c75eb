//! Engine tunables.

use std::time::Duration;

use kconst_types::env_utils::{env_bool, env_var, env_var_or};

/// Default number of symbols evaluated per toolchain invocation.
pub const DEFAULT_BATCH_SIZE: usize = 512;

/// Default per-invocation toolchain timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for [`resolve`](crate::resolve::resolve).
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Symbols per probe unit.
    pub batch_size: usize,
    /// Maximum concurrent toolchain invocations.
    pub jobs: usize,
    /// Kill a toolchain invocation after this long.
    pub timeout: Duration,
    /// Fail when any requested symbol is unavailable instead of omitting it.
    pub strict: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            jobs: default_jobs(),
            timeout: DEFAULT_TIMEOUT,
            strict: false,
        }
    }
}

impl ProbeConfig {
    /// Defaults overridden by the environment:
    ///
    /// - `KCONST_BATCH_SIZE` - symbols per probe unit
    /// - `KCONST_JOBS` - concurrent toolchain invocations
    /// - `KCONST_TIMEOUT_SECS` - per-invocation timeout
    /// - `KCONST_STRICT` - treat unavailable symbols as errors
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            batch_size: env_var_or("KCONST_BATCH_SIZE", defaults.batch_size),
            jobs: env_var_or("KCONST_JOBS", defaults.jobs),
            timeout: env_var::<u64>("KCONST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            strict: env_bool("KCONST_STRICT"),
        }
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
