//! Environment variable parsing utilities.
//!
//! ```
//! use kconst_types::env_utils::{env_var, env_var_or};
//!
//! let batch: usize = env_var_or("KCONST_BATCH_SIZE", 512);
//! let jobs: Option<usize> = env_var("KCONST_JOBS");
//! # let _ = (batch, jobs);
//! ```

use std::str::FromStr;

/// Parse an environment variable into a type that implements `FromStr`.
///
/// Returns `None` if the variable is not set or cannot be parsed.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Parse an environment variable with a default value.
pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

/// Check if an environment variable is set to a truthy value
/// ("1", "true", "yes" or "on", case-insensitive).
pub fn env_bool(key: &str) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_parsing() {
        std::env::set_var("KCONST_TEST_ENV_NUM", "42");
        std::env::set_var("KCONST_TEST_ENV_BAD", "forty-two");
        std::env::set_var("KCONST_TEST_ENV_BOOL", "Yes");

        assert_eq!(env_var::<u64>("KCONST_TEST_ENV_NUM"), Some(42));
        assert_eq!(env_var::<u64>("KCONST_TEST_ENV_BAD"), None);
        assert_eq!(env_var_or::<u64>("KCONST_TEST_ENV_BAD", 7), 7);
        assert_eq!(env_var_or::<u64>("KCONST_TEST_ENV_UNSET", 9), 9);
        assert!(env_bool("KCONST_TEST_ENV_BOOL"));
        assert!(!env_bool("KCONST_TEST_ENV_UNSET"));
    }
}
