//! Server configuration.

use std::time::Duration;

use tracing::warn;

/// Environment variable overriding [`ServerConfig::read_timeout`], in seconds.
pub const READ_TIMEOUT_ENV: &str = "TSUJI_READ_TIMEOUT_SECS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// How long a connection may take to send a complete request head.
    pub read_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { read_timeout: Duration::from_secs(10) }
    }
}

impl ServerConfig {
    /// Defaults, overridden by `TSUJI_READ_TIMEOUT_SECS` when it is set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(READ_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.read_timeout = Duration::from_secs(secs),
                _ => warn!(
                    value = %raw,
                    default_secs = config.read_timeout.as_secs(),
                    "ignoring invalid {READ_TIMEOUT_ENV}"
                ),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_read_timeout_is_ten_seconds() {
        assert_eq!(ServerConfig::default().read_timeout, Duration::from_secs(10));
        assert_eq!(ServerConfig::from_lookup(|_| None), ServerConfig::default());
    }

    #[test]
    fn env_override() {
        let cfg = ServerConfig::from_lookup(|k| (k == READ_TIMEOUT_ENV).then(|| "3".to_owned()));
        assert_eq!(cfg.read_timeout, Duration::from_secs(3));
    }

    #[test]
    fn invalid_values_fall_back() {
        for raw in ["zero", "0", "-1", ""] {
            let cfg = ServerConfig::from_lookup(|_| Some(raw.to_owned()));
            assert_eq!(cfg, ServerConfig::default(), "{raw:?}");
        }
    }
}
