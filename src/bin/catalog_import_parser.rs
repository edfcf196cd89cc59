//! catalog-import-parser: Import file parser worker
//!
//! Long-polls the queue S3 delivers `ObjectCreated` notifications to, and
//! imports every uploaded CSV those notifications name.
//!
//! ## Architecture
//! ```text
//! [S3 uploaded/] --notification--> [SQS] --> [catalog-import-parser]
//!                                                 |            |
//!                                                 v            v
//!                                        [catalog items SQS]  [S3 parsed/]
//! ```
//!
//! ## Configuration
//! - CATALOG_IMPORT_CONFIG: Path to a YAML config file (optional)
//! - CATALOG_IMPORT__IMPORT__BUCKET, CATALOG_IMPORT__IMPORT__QUEUE_URL,
//!   CATALOG_IMPORT__IMPORT__NOTIFICATIONS_QUEUE_URL: required
//! - CATALOG_IMPORT_LOG: Log filter (default: info)

use std::sync::Arc;

use tracing::info;

use catalog_import::config::{Config, ConfigError};
use catalog_import::import::{ImportFileParser, ImportNotificationHandler};
use catalog_import::object_store::S3ObjectStore;
use catalog_import::queue::{Consumer, SqsQueue};
use catalog_import::utils::aws::load_sdk_config;
use catalog_import::utils::bootstrap::{init_tracing, shutdown_signal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::load(None)?;
    config.validate_import()?;
    if config.import.notifications_queue_url.trim().is_empty() {
        return Err(ConfigError::Missing("import.notifications_queue_url").into());
    }

    let sdk_config = load_sdk_config(&config.aws).await;

    let store = Arc::new(S3ObjectStore::new(
        &sdk_config,
        config.aws.force_path_style(),
    ));
    let items_queue = Arc::new(SqsQueue::new(
        &sdk_config,
        &config.import.queue_url,
        &config.consumer,
    ));
    let notifications = Arc::new(SqsQueue::new(
        &sdk_config,
        &config.import.notifications_queue_url,
        &config.consumer,
    ));

    let parser = Arc::new(ImportFileParser::new(
        config.import.clone(),
        store,
        items_queue,
    ));
    let handler = Arc::new(ImportNotificationHandler::new(parser));
    let consumer = Consumer::new(notifications, handler, config.consumer.clone());

    info!(
        bucket = %config.import.bucket,
        upload_prefix = %config.import.upload_prefix,
        queue_url = %config.import.queue_url,
        "catalog-import-parser started"
    );

    consumer.run(shutdown_signal()).await?;

    Ok(())
}
