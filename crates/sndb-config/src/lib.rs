//! # sndb-config
//!
//! Layered configuration loading for SNDB using figment.
//!
//! Later layers override earlier ones:
//! 1. built-in defaults
//! 2. `~/.config/sndb/config.toml`
//! 3. `sndb.toml` in the working directory
//! 4. `SNDB_*` environment variables, `__` between section and key
//!
//! # Environment
//!
//! Figment maps `SNDB_CATALOGS__TNS_URL` -> `catalogs.tns_url`,
//! `SNDB_INGEST__INTERACTIVE_BUDGET` -> `ingest.interactive_budget`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use sndb_config::SndbConfig;
//!
//! let config = SndbConfig::load_with_dotenv().expect("config");
//! println!("TNS: {}", config.catalogs.tns_url);
//! ```

mod catalogs;
mod error;
mod ingest;
mod registry;
mod retry;

pub use catalogs::CatalogsConfig;
pub use error::ConfigError;
pub use ingest::IngestConfig;
pub use registry::RegistryConfig;
pub use retry::RetrySettings;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project-local config file name.
pub const LOCAL_CONFIG_FILE: &str = "sndb.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SndbConfig {
    #[serde(default)]
    pub catalogs: CatalogsConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl SndbConfig {
    /// Extract and validate the layered configuration. `.env` is not read;
    /// see [`Self::load_with_dotenv`].
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// [`Self::load`] after reading `./.env`, if present.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        // A missing or unreadable .env is not an error.
        dotenvy::dotenv().ok();
        Self::load()
    }

    /// The provider chain, for callers that layer more providers on top.
    pub fn figment() -> Figment {
        let files = [Self::user_config_path(), Some(PathBuf::from(LOCAL_CONFIG_FILE))];
        files
            .into_iter()
            .flatten()
            .filter(|path| path.exists())
            .fold(Figment::from(Serialized::defaults(Self::default())), |figment, path| {
                figment.merge(Toml::file(path))
            })
            .merge(Env::prefixed("SNDB_").split("__"))
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.ingest.match_cutoff) {
            return Err(ConfigError::InvalidValue {
                field: "ingest.match_cutoff".to_string(),
                reason: format!("{} is outside [0, 1]", self.ingest.match_cutoff),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_attempts".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }
        if self.registry.search_radius_sq < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "registry.search_radius_sq".to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        Ok(())
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sndb").join("config.toml"))
    }
}
