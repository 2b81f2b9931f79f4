use std::time::Duration;

use crate::config::helpers::{parse_bool_env, parse_optional_env};
use crate::error::ConfigError;

/// Default client-side request timeout, matching the Docker CLI.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings for the container engine.
///
/// `DOCKER_HOST` is honoured by the client itself and is not duplicated here.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Per-request timeout applied to every engine call.
    pub timeout: Duration,
    /// Probe well-known socket locations when the default connection fails.
    pub socket_fallback: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            socket_fallback: true,
        }
    }
}

impl EngineConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let timeout_secs =
            parse_optional_env("WHALER_ENGINE_TIMEOUT_SECS", defaults.timeout.as_secs())?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "WHALER_ENGINE_TIMEOUT_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            timeout: Duration::from_secs(timeout_secs),
            socket_fallback: parse_bool_env("WHALER_SOCKET_FALLBACK", defaults.socket_fallback)?,
        })
    }
}
