//! catalog-batch-process: Catalog batch processor worker
//!
//! Long-polls the catalog items queue, validates each product, writes the
//! products and stock tables, and publishes a summary per batch.
//!
//! ## Architecture
//! ```text
//! [catalog items SQS] --> [catalog-batch-process] --> [DynamoDB products]
//!         |                          |            --> [DynamoDB stock]
//!         v (after max receives)     v
//!       [DLQ]                      [SNS createProductTopic]
//! ```
//!
//! A batch is deleted from the queue only after it was fully handled. On
//! failure it becomes visible again once the visibility timeout expires, and
//! the queue's redrive policy moves it to the DLQ after
//! `consumer.max_receive_count` attempts.
//!
//! ## Configuration
//! - CATALOG_IMPORT_CONFIG: Path to a YAML config file (optional)
//! - CATALOG_IMPORT__CATALOG__PRODUCTS_TABLE, CATALOG_IMPORT__CATALOG__STOCK_TABLE,
//!   CATALOG_IMPORT__CATALOG__TOPIC_ARN, CATALOG_IMPORT__IMPORT__QUEUE_URL: required
//! - CATALOG_IMPORT_LOG: Log filter (default: info)

use std::sync::Arc;

use tracing::info;

use catalog_import::catalog::CatalogBatchProcessor;
use catalog_import::config::{Config, ConfigError};
use catalog_import::queue::{Consumer, SqsQueue};
use catalog_import::table::DynamoTableStore;
use catalog_import::topic::SnsTopic;
use catalog_import::utils::aws::load_sdk_config;
use catalog_import::utils::bootstrap::{init_tracing, shutdown_signal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::load(None)?;
    config.validate_catalog()?;
    if config.import.queue_url.trim().is_empty() {
        return Err(ConfigError::Missing("import.queue_url").into());
    }

    let sdk_config = load_sdk_config(&config.aws).await;

    let tables = Arc::new(DynamoTableStore::new(&sdk_config));
    let topic = Arc::new(SnsTopic::new(&sdk_config));
    let items_queue = Arc::new(SqsQueue::new(
        &sdk_config,
        &config.import.queue_url,
        &config.consumer,
    ));

    let processor = Arc::new(CatalogBatchProcessor::new(
        config.catalog.clone(),
        tables,
        topic,
    ));
    let consumer = Consumer::new(items_queue, processor, config.consumer.clone());

    info!(
        products_table = %config.catalog.products_table,
        stock_table = %config.catalog.stock_table,
        identity = ?config.catalog.identity,
        write_mode = ?config.catalog.write_mode,
        "catalog-batch-process started"
    );

    consumer.run(shutdown_signal()).await?;

    Ok(())
}
