//! Compiled-in stripper configuration

use serde::{Deserialize, Serialize};

use crate::error_log::ERROR_LOG_CAPACITY;
use crate::guard::GuardPolicy;
use crate::store::StorageKeys;

/// Default redirect ceiling per window.
pub const DEFAULT_MAX_REDIRECT_ATTEMPTS: u32 = 3;

/// Default rolling window for the redirect guard.
pub const DEFAULT_REDIRECT_WINDOW_MS: u64 = 5_000;

/// Name used in log lines.
pub const MODULE_NAME: &str = "TrackingTokenStripper";

/// Stripper settings. `Default` holds the shipped values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StripperConfig {
    /// Emit debug and info logs
    pub debug_mode: bool,
    /// Emit timing logs (only together with `debug_mode`)
    pub performance_monitoring: bool,
    /// Redirects allowed per window before the guard refuses
    pub max_redirect_attempts: u32,
    /// Window length; the counter resets once this much time has passed
    pub redirect_window_ms: u64,
    /// Entries kept in the persisted error log
    pub error_log_capacity: usize,
    pub storage_keys: StorageKeys,
}

impl Default for StripperConfig {
    fn default() -> Self {
        Self {
            debug_mode: true,
            performance_monitoring: true,
            max_redirect_attempts: DEFAULT_MAX_REDIRECT_ATTEMPTS,
            redirect_window_ms: DEFAULT_REDIRECT_WINDOW_MS,
            error_log_capacity: ERROR_LOG_CAPACITY,
            storage_keys: StorageKeys::default(),
        }
    }
}

impl StripperConfig {
    pub fn guard_policy(&self) -> GuardPolicy {
        GuardPolicy {
            max_attempts: self.max_redirect_attempts,
            window_ms: self.redirect_window_ms,
        }
    }

    /// Level for host log backends.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug_mode {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        }
    }

    /// Whether timing logs should be emitted.
    pub fn perf_enabled(&self) -> bool {
        self.performance_monitoring && self.debug_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StripperConfig::default();
        assert_eq!(config.max_redirect_attempts, 3);
        assert_eq!(config.redirect_window_ms, 5_000);
        assert_eq!(config.error_log_capacity, 50);
        assert!(config.perf_enabled());
        assert_eq!(config.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_quiet_mode_disables_perf() {
        let config = StripperConfig {
            debug_mode: false,
            ..StripperConfig::default()
        };
        assert!(!config.perf_enabled());
        assert_eq!(config.log_level(), log::LevelFilter::Warn);
    }

    #[test]
    fn test_json_uses_camel_case() {
        let json = serde_json::to_value(StripperConfig::default()).unwrap();
        assert_eq!(json["maxRedirectAttempts"], 3);
        assert_eq!(json["storageKeys"]["redirectCount"], "tts_redirect_count");
    }
}
