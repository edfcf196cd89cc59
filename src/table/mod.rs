//! Key-value tables for catalog and stock rows.
//!
//! ## Backends
//!
//! - `MemoryTableStore` - In-memory tables for tests and local runs
//! - `DynamoTableStore` (feature: dynamo) - Amazon DynamoDB
//!
//! Items are flat maps of string and number attributes. A put with an
//! existing partition key replaces the stored item.

mod memory;
#[cfg(feature = "dynamo")]
mod dynamo;

pub use memory::MemoryTableStore;
#[cfg(feature = "dynamo")]
pub use dynamo::DynamoTableStore;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Most puts one DynamoDB `BatchWriteItem` call accepts.
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// Most items one DynamoDB transaction accepts.
pub const MAX_TRANSACT_ITEMS: usize = 100;

/// Errors that can occur during table operations.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("{count} items left unprocessed in {table}")]
    Unprocessed { table: String, count: usize },

    #[error("Transaction of {count} items exceeds the limit of {MAX_TRANSACT_ITEMS}")]
    TransactionTooLarge { count: usize },
}

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableValue {
    S(String),
    /// Decimal text, as DynamoDB carries numbers.
    N(String),
}

impl TableValue {
    pub fn string(value: impl Into<String>) -> Self {
        TableValue::S(value.into())
    }

    pub fn number(value: impl fmt::Display) -> Self {
        TableValue::N(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            TableValue::S(s) | TableValue::N(s) => s,
        }
    }
}

/// One row, attribute name to value.
pub type TableItem = BTreeMap<String, TableValue>;

/// A put aimed at a named table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableWrite {
    pub table: String,
    pub item: TableItem,
}

impl TableWrite {
    pub fn new(table: impl Into<String>, item: TableItem) -> Self {
        Self {
            table: table.into(),
            item,
        }
    }
}

/// Storage for table rows.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Put every item into one table. Succeeds only if all items landed.
    async fn batch_put(&self, table: &str, items: Vec<TableItem>) -> Result<()>;

    /// Put items across tables as one all-or-nothing transaction.
    async fn transact_put(&self, writes: Vec<TableWrite>) -> Result<()>;
}

fn check_transaction(writes: &[TableWrite]) -> Result<()> {
    if writes.len() > MAX_TRANSACT_ITEMS {
        return Err(TableError::TransactionTooLarge {
            count: writes.len(),
        });
    }
    Ok(())
}
