//! Configuration of the event router.
//!
//! Provides layered configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
//! - Per-sink validation
mod dispatch;
mod logging;
mod sink;
pub use dispatch::*;
pub use logging::*;
pub use sink::*;

use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::Result;

/// Environment variable prefix of overrides (`EVENTROUTER__ENABLE_PROMETHEUS`)
pub const ENV_PREFIX: &str = "EVENTROUTER";

/// Environment variables naming the configuration file, first match wins
pub const CONFIG_PATH_VARS: [&str; 2] = ["CONFIG_PATH", "EVENTROUTER_CONFIG"];

/// Top level configuration of the event router
///
/// Sources are merged in order:
/// 1. Default values from code
/// 2. Configuration file named by `CONFIG_PATH` or `EVENTROUTER_CONFIG`
/// 3. Environment variables with the `EVENTROUTER__` prefix (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouterConfig {
    /// Count routed events in the process metrics registry
    #[serde(default = "default_enable_prometheus")]
    pub enable_prometheus: bool,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Downstream sinks; resolved to a single `glog` sink when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sinks: Vec<SinkConfig>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            enable_prometheus: default_enable_prometheus(),
            logging: LoggingConfig::default(),
            sinks: Vec::new(),
        }
    }
}

impl RouterConfig {
    /// Loads configuration from layered sources without validation.
    ///
    /// Callers MUST call `validate()` once all overrides are applied.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("CONFIG_PATH", "config/eventrouter.toml");
    /// std::env::set_var("EVENTROUTER__ENABLE_PROMETHEUS", "false");
    /// let cfg = RouterConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(config_path) = config_path_from_env() {
            debug!(%config_path, "loading configuration file");
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        let config: Self = builder.add_source(env_source()).build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional overrides from a file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables
    ///
    /// A file that lists `sinks` replaces the current list; otherwise the
    /// current sinks are kept.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let base = Self {
            sinks: Vec::new(),
            ..self.clone()
        };

        let mut config: Self = Config::builder()
            .add_source(Config::try_from(&base)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;

        if config.sinks.is_empty() {
            config.sinks = self.sinks.clone();
        }
        Ok(config)
    }

    /// Validates configuration and returns the validated instance.
    ///
    /// # Errors
    /// Returns the first sink validation failure:
    /// - missing endpoint or destination of a sink kind
    /// - missing credentials of the influxdb sink
    /// - invalid dispatch parameters
    pub fn validate(mut self) -> Result<Self> {
        if self.sinks.is_empty() {
            self.sinks.push(SinkConfig::Glog);
        }

        for sink in &self.sinks {
            sink.validate()?;
        }
        Ok(self)
    }
}

fn config_path_from_env() -> Option<String> {
    CONFIG_PATH_VARS
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find(|path| !path.is_empty())
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator("__").ignore_empty(true).try_parsing(true)
}

fn default_enable_prometheus() -> bool {
    true
}
