//! Configuration, loaded from TOML.
//!
//! ```toml
//! [auth]
//! timeout_secs = 300          # 0 disables the per-request timeout
//! reaper_interval_ms = 1000
//! decline_policy = "surface"  # or "swallow"
//!
//! [log]
//! filter = "safe_app_binding=info"
//! ```
//!
//! Every key is optional; unknown keys are rejected.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BindingError, BindingResult};
use crate::queue::DeclinePolicy;

const DEFAULT_TIMEOUT_SECS: u64 = 5 * 60;
const DEFAULT_REAPER_INTERVAL_MS: u64 = 1_000;
const DEFAULT_LOG_FILTER: &str = "safe_app_binding=info";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindingConfig {
    pub auth: AuthSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthSettings {
    pub timeout_secs: u64,
    pub reaper_interval_ms: u64,
    pub decline_policy: DeclinePolicy,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            reaper_interval_ms: DEFAULT_REAPER_INTERVAL_MS,
            decline_policy: DeclinePolicy::default(),
        }
    }
}

impl AuthSettings {
    /// `None` when timeouts are disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_millis(self.reaper_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directive string.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl BindingConfig {
    pub fn from_toml_str(raw: &str) -> BindingResult<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| BindingError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> BindingResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            BindingError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> BindingResult<()> {
        if self.auth.timeout_secs > 0 && self.auth.reaper_interval_ms == 0 {
            return Err(BindingError::Config(
                "auth.reaper_interval_ms must be non-zero when a timeout is set".to_string(),
            ));
        }
        Ok(())
    }
}
