//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section; every field has a default so an empty source is valid.

pub mod logging;
pub mod vendor;

use std::path::Path;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::vendor::{HubConfig, VendorConfig};

use crate::error::AppError;

/// Prefix for environment variable overrides (`VENDORHUB__HUB__ENABLED=false`).
const ENV_PREFIX: &str = "VENDORHUB";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Demo vendor settings.
    #[serde(default)]
    pub vendor: VendorConfig,
    /// Reference hub settings.
    #[serde(default)]
    pub hub: HubConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with an environment-specific overlay
    /// and environment variables prefixed with `VENDORHUB`. Missing files
    /// are skipped.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Load configuration from a single file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()).required(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
