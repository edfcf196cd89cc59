//! Catalog batch processor settings.

use serde::Deserialize;

use super::{require, ConfigError};

/// Products with fewer units than this are reported as low stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u64 = 100;

/// How product identifiers are assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStrategy {
    /// Fresh random UUID per delivery. A redelivered batch produces new rows.
    #[default]
    Random,
    /// UUID derived from the queue message id. A redelivered batch rewrites
    /// the same rows.
    MessageDerived,
}

/// How the catalog and stock rows are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Two batch writes issued concurrently; both must succeed.
    #[default]
    Concurrent,
    /// One all-or-nothing transaction spanning both tables.
    Transactional,
}

/// Settings for the catalog batch processor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub products_table: String,
    pub stock_table: String,
    /// Topic that receives one summary per persisted batch.
    pub topic_arn: String,
    pub low_stock_threshold: u64,
    pub identity: IdentityStrategy,
    pub write_mode: WriteMode,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            products_table: String::new(),
            stock_table: String::new(),
            topic_arn: String::new(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            identity: IdentityStrategy::default(),
            write_mode: WriteMode::default(),
        }
    }
}

impl CatalogConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(&self.products_table, "catalog.products_table")?;
        require(&self.stock_table, "catalog.stock_table")?;
        require(&self.topic_arn, "catalog.topic_arn")?;
        if self.products_table == self.stock_table {
            return Err(ConfigError::Invalid {
                field: "catalog.stock_table",
                message: "must differ from catalog.products_table".to_string(),
            });
        }
        Ok(())
    }

    pub fn for_test() -> Self {
        Self {
            products_table: "products".to_string(),
            stock_table: "stock".to_string(),
            topic_arn: "memory://createProductTopic".to_string(),
            ..Default::default()
        }
    }
}
