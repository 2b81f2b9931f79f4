//! Configuration resolved from environment variables.
//!
//! `.env` files are loaded by the binary (via `dotenvy`) before
//! [`Config::from_env`] runs, so values there behave like real env vars.

mod engine;
pub(crate) mod helpers;

pub use engine::EngineConfig;

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub engine: EngineConfig,
}

impl Config {
    /// Resolve every section from the current environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            engine: EngineConfig::resolve()?,
        })
    }
}
