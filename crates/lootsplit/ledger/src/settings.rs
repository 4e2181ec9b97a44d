//! Layered configuration: defaults, then an optional file, then
//! `LOOTSPLIT_`-prefixed environment variables.

use lootsplit_storage::StorageConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable prefix, e.g. `LOOTSPLIT_POLICY__ALLOW_ZERO_SALE=false`.
pub const ENV_PREFIX: &str = "LOOTSPLIT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid log filter `{0}`")]
    LogFilter(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LootConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub allocation: AllocationConfig,

    #[serde(default)]
    pub policy: SalePolicy,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remainder draw settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationConfig {
    /// Fixed seed for the remainder draw. `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Which sale amounts the lifecycle manager accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePolicy {
    /// Negative amounts are always rejected.
    #[serde(default = "default_true")]
    pub allow_zero_sale: bool,
}

impl Default for SalePolicy {
    fn default() -> Self {
        Self {
            allow_zero_sale: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG` when set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LootConfig {
    /// Load configuration from defaults, an optional file and the environment.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&LootConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}
