//! Amazon DynamoDB table store.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::types::{AttributeValue, Put, PutRequest, TransactWriteItem, WriteRequest};
use aws_sdk_dynamodb::Client;
use backon::BackoffBuilder;
use tracing::{debug, warn};

use super::{
    check_transaction, Result, TableError, TableItem, TableStore, TableValue, TableWrite,
    MAX_BATCH_WRITE_ITEMS,
};
use crate::utils::retry::unprocessed_items_backoff;

/// DynamoDB-backed table store.
pub struct DynamoTableStore {
    client: Client,
}

impl DynamoTableStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }

    /// Create with explicit client (for testing).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Write one chunk, re-issuing whatever DynamoDB reports as unprocessed.
    async fn write_chunk(&self, table: &str, mut requests: Vec<WriteRequest>) -> Result<()> {
        let mut backoff = unprocessed_items_backoff().build();

        loop {
            let output = self
                .client
                .batch_write_item()
                .request_items(table, requests)
                .send()
                .await
                .map_err(|e| {
                    TableError::WriteFailed(format!("DynamoDB batch_write_item failed: {}", e))
                })?;

            requests = output
                .unprocessed_items()
                .and_then(|unprocessed| unprocessed.get(table))
                .cloned()
                .unwrap_or_default();

            if requests.is_empty() {
                return Ok(());
            }

            match backoff.next() {
                Some(delay) => {
                    warn!(
                        table = %table,
                        unprocessed = requests.len(),
                        ?delay,
                        "Retrying unprocessed items"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    return Err(TableError::Unprocessed {
                        table: table.to_string(),
                        count: requests.len(),
                    })
                }
            }
        }
    }
}

fn to_attribute(value: TableValue) -> AttributeValue {
    match value {
        TableValue::S(s) => AttributeValue::S(s),
        TableValue::N(n) => AttributeValue::N(n),
    }
}

fn to_attributes(item: TableItem) -> HashMap<String, AttributeValue> {
    item.into_iter()
        .map(|(name, value)| (name, to_attribute(value)))
        .collect()
}

fn put_request(item: TableItem) -> Result<WriteRequest> {
    let put = PutRequest::builder()
        .set_item(Some(to_attributes(item)))
        .build()
        .map_err(|e| TableError::InvalidItem(format!("Failed to build put request: {}", e)))?;
    Ok(WriteRequest::builder().put_request(put).build())
}

#[async_trait]
impl TableStore for DynamoTableStore {
    async fn batch_put(&self, table: &str, items: Vec<TableItem>) -> Result<()> {
        let total = items.len();
        let requests = items
            .into_iter()
            .map(put_request)
            .collect::<Result<Vec<_>>>()?;

        for chunk in requests.chunks(MAX_BATCH_WRITE_ITEMS) {
            self.write_chunk(table, chunk.to_vec()).await?;
        }

        debug!(table = %table, count = total, "Wrote items to DynamoDB");
        Ok(())
    }

    async fn transact_put(&self, writes: Vec<TableWrite>) -> Result<()> {
        check_transaction(&writes)?;
        let total = writes.len();

        let items = writes
            .into_iter()
            .map(|write| {
                let put = Put::builder()
                    .table_name(write.table)
                    .set_item(Some(to_attributes(write.item)))
                    .build()
                    .map_err(|e| TableError::InvalidItem(format!("Failed to build put: {}", e)))?;
                Ok(TransactWriteItem::builder().put(put).build())
            })
            .collect::<Result<Vec<_>>>()?;

        self.client
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await
            .map_err(|e| {
                TableError::WriteFailed(format!("DynamoDB transact_write_items failed: {}", e))
            })?;

        debug!(count = total, "Wrote transaction to DynamoDB");
        Ok(())
    }
}
