//! Import file parser settings.

use serde::Deserialize;

use super::{require, ConfigError};

/// Key prefix that uploads land under.
pub const DEFAULT_UPLOAD_PREFIX: &str = "uploaded/";
/// Key prefix that processed uploads are archived to.
pub const DEFAULT_PARSED_PREFIX: &str = "parsed/";
/// Only objects with this extension are imported.
pub const DEFAULT_EXTENSION: &str = ".csv";

/// Settings for the import file parser.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Bucket uploads are read from and archived within.
    pub bucket: String,
    pub upload_prefix: String,
    pub parsed_prefix: String,
    /// Required object key suffix (case-sensitive).
    pub extension: String,
    /// Queue that receives one message per parsed row.
    pub queue_url: String,
    /// Queue the object store delivers creation notifications to.
    pub notifications_queue_url: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            upload_prefix: DEFAULT_UPLOAD_PREFIX.to_string(),
            parsed_prefix: DEFAULT_PARSED_PREFIX.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            queue_url: String::new(),
            notifications_queue_url: String::new(),
        }
    }
}

impl ImportConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(&self.bucket, "import.bucket")?;
        require(&self.queue_url, "import.queue_url")?;
        require(&self.upload_prefix, "import.upload_prefix")?;
        require(&self.parsed_prefix, "import.parsed_prefix")?;
        if self.upload_prefix == self.parsed_prefix {
            return Err(ConfigError::Invalid {
                field: "import.parsed_prefix",
                message: "must differ from import.upload_prefix".to_string(),
            });
        }
        Ok(())
    }

    pub fn for_test() -> Self {
        Self {
            bucket: "import-bucket".to_string(),
            queue_url: "memory://catalog-items".to_string(),
            notifications_queue_url: "memory://uploads".to_string(),
            ..Default::default()
        }
    }
}
