//! Application configuration.
//!
//! Aggregates configuration from all components into a single Config struct
//! that can be loaded from YAML files or environment variables. Components
//! receive their own section at construction and never read the environment
//! themselves.

mod auth;
mod aws;
mod catalog;
mod consumer;
mod import;

pub use auth::AuthConfig;
pub use aws::AwsConfig;
pub use catalog::{CatalogConfig, IdentityStrategy, WriteMode, DEFAULT_LOW_STOCK_THRESHOLD};
pub use consumer::ConsumerConfig;
pub use import::{ImportConfig, DEFAULT_PARSED_PREFIX, DEFAULT_UPLOAD_PREFIX};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "catalog-import.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "CATALOG_IMPORT_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "CATALOG_IMPORT";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "CATALOG_IMPORT_LOG";
/// Environment variable selecting the log output format (`text` or `json`).
pub const LOG_FORMAT_ENV_VAR: &str = "CATALOG_IMPORT_LOG_FORMAT";

use serde::Deserialize;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid setting {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AWS connection settings shared by every backend.
    pub aws: AwsConfig,
    /// Import file parser settings.
    pub import: ImportConfig,
    /// Catalog batch processor settings.
    pub catalog: CatalogConfig,
    /// Queue consumer loop settings.
    pub consumer: ConsumerConfig,
    /// Basic authorizer credentials.
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `catalog-import.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix,
    ///    e.g. `CATALOG_IMPORT__CATALOG__PRODUCTS_TABLE`
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        Ok(config)
    }

    /// Check the settings the import file parser needs.
    pub fn validate_import(&self) -> Result<(), ConfigError> {
        self.import.validate()?;
        self.consumer.validate()
    }

    /// Check the settings the catalog batch processor needs.
    pub fn validate_catalog(&self) -> Result<(), ConfigError> {
        self.catalog.validate()?;
        self.consumer.validate()
    }

    /// Create config for testing.
    pub fn for_test() -> Self {
        Self {
            aws: AwsConfig::default(),
            import: ImportConfig::for_test(),
            catalog: CatalogConfig::for_test(),
            consumer: ConsumerConfig::default(),
            auth: AuthConfig::new("test-user", "test-password"),
        }
    }
}

fn require(value: &str, field: &'static str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing(field));
    }
    Ok(())
}
