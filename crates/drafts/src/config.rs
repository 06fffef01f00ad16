use std::time::Duration;

/// Default number of attempts for an append that keeps losing races.
pub const DEFAULT_MAX_APPEND_ATTEMPTS: u32 = 5;

/// Default delay before the first retry of a conflicting append.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 10;

/// Tuning for the version-creation path, loaded from environment variables.
///
/// All fields have defaults suitable for production use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersioningConfig {
    /// Attempts at appending a revision before reporting a concurrency
    /// conflict (at least `1`).
    pub max_append_attempts: u32,
    /// Base delay between attempts; doubles each retry.
    pub retry_base_delay: Duration,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            max_append_attempts: DEFAULT_MAX_APPEND_ATTEMPTS,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
        }
    }
}

impl VersioningConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `QUIRE_MAX_APPEND_ATTEMPTS` | `5`     |
    /// | `QUIRE_RETRY_BASE_DELAY_MS` | `10`    |
    ///
    /// Unparseable values fall back to the default with a warning.
    pub fn from_env() -> Self {
        let max_append_attempts = env_or("QUIRE_MAX_APPEND_ATTEMPTS", DEFAULT_MAX_APPEND_ATTEMPTS)
            .max(1);
        let retry_base_delay_ms = env_or("QUIRE_RETRY_BASE_DELAY_MS", DEFAULT_RETRY_BASE_DELAY_MS);

        Self {
            max_append_attempts,
            retry_base_delay: Duration::from_millis(retry_base_delay_ms),
        }
    }
}

fn env_or<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, "Ignoring unparseable setting");
            default
        }),
        Err(_) => default,
    }
}
