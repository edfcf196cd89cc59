//! In-memory table store for testing and local runs.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{check_transaction, Result, TableError, TableItem, TableStore, TableWrite};

struct Table {
    key_attribute: String,
    rows: BTreeMap<String, TableItem>,
}

/// Table store holding rows in memory, keyed by each table's partition key.
#[derive(Default)]
pub struct MemoryTableStore {
    tables: RwLock<HashMap<String, Table>>,
    failing_tables: RwLock<HashSet<String>>,
    batch_calls: RwLock<usize>,
    transact_calls: RwLock<usize>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table whose rows are keyed by `key_attribute`.
    pub async fn create_table(&self, name: &str, key_attribute: &str) {
        self.tables.write().await.insert(
            name.to_string(),
            Table {
                key_attribute: key_attribute.to_string(),
                rows: BTreeMap::new(),
            },
        );
    }

    /// Make every write touching `table` fail.
    pub async fn set_fail_on_table(&self, table: &str, fail: bool) {
        let mut failing = self.failing_tables.write().await;
        if fail {
            failing.insert(table.to_string());
        } else {
            failing.remove(table);
        }
    }

    /// All rows of a table, ordered by key.
    pub async fn items(&self, table: &str) -> Vec<TableItem> {
        self.tables
            .read()
            .await
            .get(table)
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn get(&self, table: &str, key: &str) -> Option<TableItem> {
        self.tables
            .read()
            .await
            .get(table)
            .and_then(|t| t.rows.get(key).cloned())
    }

    pub async fn batch_calls(&self) -> usize {
        *self.batch_calls.read().await
    }

    pub async fn transact_calls(&self) -> usize {
        *self.transact_calls.read().await
    }

    async fn check_writable(&self, table: &str) -> Result<()> {
        if self.failing_tables.read().await.contains(table) {
            return Err(TableError::WriteFailed(format!(
                "Mock write failure on {}",
                table
            )));
        }
        Ok(())
    }
}

fn key_of(table_name: &str, table: &Table, item: &TableItem) -> Result<String> {
    item.get(&table.key_attribute)
        .map(|v| v.as_str().to_string())
        .ok_or_else(|| {
            TableError::InvalidItem(format!(
                "item for {} is missing key attribute {}",
                table_name, table.key_attribute
            ))
        })
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn batch_put(&self, table: &str, items: Vec<TableItem>) -> Result<()> {
        *self.batch_calls.write().await += 1;
        self.check_writable(table).await?;

        let mut tables = self.tables.write().await;
        let target = tables
            .get_mut(table)
            .ok_or_else(|| TableError::TableNotFound(table.to_string()))?;

        let keyed = items
            .into_iter()
            .map(|item| Ok((key_of(table, target, &item)?, item)))
            .collect::<Result<Vec<_>>>()?;
        target.rows.extend(keyed);
        Ok(())
    }

    async fn transact_put(&self, writes: Vec<TableWrite>) -> Result<()> {
        *self.transact_calls.write().await += 1;
        check_transaction(&writes)?;
        for write in &writes {
            self.check_writable(&write.table).await?;
        }

        let mut tables = self.tables.write().await;
        let mut staged = Vec::with_capacity(writes.len());
        for write in writes {
            let target = tables
                .get(&write.table)
                .ok_or_else(|| TableError::TableNotFound(write.table.clone()))?;
            let key = key_of(&write.table, target, &write.item)?;
            staged.push((write.table, key, write.item));
        }

        for (table, key, item) in staged {
            if let Some(target) = tables.get_mut(&table) {
                target.rows.insert(key, item);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableValue;

    fn row(id: &str, name: &str) -> TableItem {
        TableItem::from([
            ("id".to_string(), TableValue::string(id)),
            ("name".to_string(), TableValue::string(name)),
        ])
    }

    async fn store() -> MemoryTableStore {
        let store = MemoryTableStore::new();
        store.create_table("products", "id").await;
        store.create_table("stock", "product_id").await;
        store
    }

    #[tokio::test]
    async fn test_batch_put_stores_rows() {
        let store = store().await;

        store
            .batch_put("products", vec![row("1", "A"), row("2", "B")])
            .await
            .unwrap();

        assert_eq!(store.items("products").await.len(), 2);
        assert_eq!(store.get("products", "2").await.unwrap()["name"].as_str(), "B");
    }

    #[tokio::test]
    async fn test_put_replaces_same_key() {
        let store = store().await;

        store.batch_put("products", vec![row("1", "A")]).await.unwrap();
        store.batch_put("products", vec![row("1", "A2")]).await.unwrap();

        assert_eq!(store.items("products").await, vec![row("1", "A2")]);
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let store = store().await;
        let result = store.batch_put("missing", vec![row("1", "A")]).await;
        assert!(matches!(result, Err(TableError::TableNotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_key_attribute() {
        let store = store().await;
        let result = store.batch_put("stock", vec![row("1", "A")]).await;
        assert!(matches!(result, Err(TableError::InvalidItem(_))));
        assert!(store.items("stock").await.is_empty());
    }

    #[tokio::test]
    async fn test_transact_put_is_all_or_nothing() {
        let store = store().await;
        let stock = TableItem::from([
            ("product_id".to_string(), TableValue::string("1")),
            ("count".to_string(), TableValue::number(3)),
        ]);
        store.set_fail_on_table("stock", true).await;

        let result = store
            .transact_put(vec![
                TableWrite::new("products", row("1", "A")),
                TableWrite::new("stock", stock.clone()),
            ])
            .await;

        assert!(result.is_err());
        assert!(store.items("products").await.is_empty());

        store.set_fail_on_table("stock", false).await;
        store
            .transact_put(vec![
                TableWrite::new("products", row("1", "A")),
                TableWrite::new("stock", stock),
            ])
            .await
            .unwrap();
        assert_eq!(store.items("products").await.len(), 1);
        assert_eq!(store.items("stock").await.len(), 1);
        assert_eq!(store.transact_calls().await, 2);
    }
}
