//! Catalog batch processor.
//!
//! Consumes queued product rows a batch at a time:
//!
//! 1. decode each body and coerce `price`/`count` to numbers
//! 2. validate, dropping (and logging) invalid candidates
//! 3. give each survivor an id
//! 4. write catalog and stock rows
//! 5. publish one summary notification
//!
//! A batch where nothing survives validation ends after step 2 with no
//! writes and no notification. Failures in steps 3-5 fail the batch so the
//! queue redelivers it.

mod notification;
mod product;

pub use notification::{
    build_notification, low_stock_names, LOW_STOCK_ATTR, NEW_PRODUCTS_ATTR, SUMMARY_MESSAGE,
};
pub use product::{catalog_attrs, coerce_number, decode_candidate, stock_attrs, PersistableProduct};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::{CatalogConfig, IdentityStrategy, WriteMode};
use crate::queue::{BatchHandler, DeliveredMessage, HandlerError};
use crate::table::{TableError, TableStore, TableWrite};
use crate::topic::{TopicError, TopicPublisher};
use crate::validation::validate_product;

/// Namespace for ids derived from queue message ids.
const PRODUCT_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6b1f_3c2a_8d4e_4f57_9a0b_c1d2_e3f4_a5b6);

/// Errors that fail a whole batch.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Message {message_id} is not valid JSON: {source}")]
    Decode {
        message_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode notification: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Topic(#[from] TopicError),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// What one batch produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Products written to both tables.
    pub persisted: usize,
    /// Candidates dropped by validation.
    pub rejected: usize,
    /// Id of the summary notification, if one was published.
    pub notification_id: Option<String>,
}

/// Validates queued products and persists the good ones.
pub struct CatalogBatchProcessor {
    config: CatalogConfig,
    tables: Arc<dyn TableStore>,
    topic: Arc<dyn TopicPublisher>,
}

impl CatalogBatchProcessor {
    pub fn new(
        config: CatalogConfig,
        tables: Arc<dyn TableStore>,
        topic: Arc<dyn TopicPublisher>,
    ) -> Self {
        Self {
            config,
            tables,
            topic,
        }
    }

    #[instrument(skip_all, fields(messages = messages.len()))]
    pub async fn process(&self, messages: &[DeliveredMessage]) -> Result<BatchOutcome> {
        let mut candidates = Vec::with_capacity(messages.len());
        for message in messages {
            let candidate =
                decode_candidate(&message.body).map_err(|source| CatalogError::Decode {
                    message_id: message.message_id.clone(),
                    source,
                })?;
            candidates.push((message, candidate));
        }

        let mut products = Vec::with_capacity(candidates.len());
        let mut rejected = 0;
        for (message, candidate) in &candidates {
            match validate_product(candidate) {
                Ok(valid) => products.push(PersistableProduct::new(self.assign_id(message), valid)),
                Err(e) => {
                    warn!(message_id = %message.message_id, error = %e, "Dropping invalid product");
                    rejected += 1;
                }
            }
        }

        if products.is_empty() {
            info!(rejected, "No valid products in batch");
            return Ok(BatchOutcome {
                persisted: 0,
                rejected,
                notification_id: None,
            });
        }

        self.write(&products).await?;

        let notification = build_notification(&products, self.config.low_stock_threshold)
            .map_err(CatalogError::Encode)?;
        let notification_id = self
            .topic
            .publish(&self.config.topic_arn, &notification)
            .await?;

        info!(
            persisted = products.len(),
            rejected,
            notification_id = %notification_id,
            "Persisted batch"
        );

        Ok(BatchOutcome {
            persisted: products.len(),
            rejected,
            notification_id: Some(notification_id),
        })
    }

    fn assign_id(&self, message: &DeliveredMessage) -> Uuid {
        match self.config.identity {
            IdentityStrategy::Random => Uuid::new_v4(),
            IdentityStrategy::MessageDerived => {
                Uuid::new_v5(&PRODUCT_ID_NAMESPACE, message.message_id.as_bytes())
            }
        }
    }

    async fn write(&self, products: &[PersistableProduct]) -> Result<()> {
        let catalog: Vec<_> = products.iter().map(PersistableProduct::catalog_item).collect();
        let stock: Vec<_> = products.iter().map(PersistableProduct::stock_item).collect();

        match self.config.write_mode {
            WriteMode::Concurrent => {
                tokio::try_join!(
                    self.tables.batch_put(&self.config.products_table, catalog),
                    self.tables.batch_put(&self.config.stock_table, stock),
                )?;
            }
            WriteMode::Transactional => {
                let writes = catalog
                    .into_iter()
                    .map(|item| TableWrite::new(&self.config.products_table, item))
                    .chain(
                        stock
                            .into_iter()
                            .map(|item| TableWrite::new(&self.config.stock_table, item)),
                    )
                    .collect();
                self.tables.transact_put(writes).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BatchHandler for CatalogBatchProcessor {
    async fn handle(&self, messages: &[DeliveredMessage]) -> std::result::Result<(), HandlerError> {
        self.process(messages).await?;
        Ok(())
    }
}
