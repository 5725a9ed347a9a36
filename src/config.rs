//! Environment-derived configuration (spec §6, expanded in §10.3).
//!
//! Everything here is read once at process startup; a malformed override is
//! a startup error, never a silent fallback.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{MrError, Result};

const DEFAULT_TASK_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 200;
const DEFAULT_RPC_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_DIAL_BACKOFF_MIN_MS: u64 = 100;
const DEFAULT_DIAL_BACKOFF_MAX_MS: u64 = 2_000;
const DEFAULT_COORD_ADDR: &str = "127.0.0.1:0";
const DEFAULT_COORD_INFO_FILE: &str = "coordinator_info.txt";

/// Job-execution and transport knobs shared by the coordinator and worker.
#[derive(Debug, Clone)]
pub struct Config {
    pub task_timeout: Duration,
    pub poll_interval: Duration,
    pub rpc_timeout: Duration,
    pub dial_backoff_min: Duration,
    pub dial_backoff_max: Duration,
    pub coordinator_addr: SocketAddr,
    pub coordinator_info_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            task_timeout: Duration::from_millis(DEFAULT_TASK_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            rpc_timeout: Duration::from_millis(DEFAULT_RPC_TIMEOUT_MS),
            dial_backoff_min: Duration::from_millis(DEFAULT_DIAL_BACKOFF_MIN_MS),
            dial_backoff_max: Duration::from_millis(DEFAULT_DIAL_BACKOFF_MAX_MS),
            coordinator_addr: DEFAULT_COORD_ADDR.parse().unwrap(),
            coordinator_info_file: PathBuf::from(DEFAULT_COORD_INFO_FILE),
        }
    }
}

impl Config {
    /// Load defaults, then apply any `MR_*` environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(ms) = env_u64("MR_TASK_TIMEOUT_MS")? {
            config.task_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("MR_POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("MR_RPC_TIMEOUT_MS")? {
            config.rpc_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("MR_DIAL_BACKOFF_MIN_MS")? {
            config.dial_backoff_min = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("MR_DIAL_BACKOFF_MAX_MS")? {
            config.dial_backoff_max = Duration::from_millis(ms);
        }
        if let Ok(raw) = std::env::var("MR_COORD_ADDR") {
            config.coordinator_addr = raw.parse().map_err(|e| MrError::Config {
                key: "MR_COORD_ADDR",
                value: raw.clone(),
                reason: format!("{e}"),
            })?;
        }
        if let Ok(raw) = std::env::var("MR_COORD_INFO_FILE") {
            config.coordinator_info_file = PathBuf::from(raw);
        }

        Ok(config)
    }
}

fn env_u64(key: &'static str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|e| MrError::Config {
                key,
                value: raw,
                reason: format!("{e}"),
            }),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(MrError::Config {
            key,
            value: "<non-utf8>".to_string(),
            reason: "environment value is not valid UTF-8".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_match_spec() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("MR_TASK_TIMEOUT_MS");
        std::env::remove_var("MR_POLL_INTERVAL_MS");
        let config = Config::from_env().unwrap();
        assert_eq!(config.task_timeout, Duration::from_millis(10_000));
        assert_eq!(config.poll_interval, Duration::from_millis(200));
    }

    #[test]
    fn overrides_are_applied() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("MR_TASK_TIMEOUT_MS", "5000");
        let config = Config::from_env().unwrap();
        assert_eq!(config.task_timeout, Duration::from_millis(5000));
        std::env::remove_var("MR_TASK_TIMEOUT_MS");
    }

    #[test]
    fn malformed_override_is_a_config_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("MR_TASK_TIMEOUT_MS", "not-a-number");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, MrError::Config { key: "MR_TASK_TIMEOUT_MS", .. }));
        std::env::remove_var("MR_TASK_TIMEOUT_MS");
    }
}
