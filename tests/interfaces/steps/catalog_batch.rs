//! Catalog batch processor step definitions.

use std::fmt;
use std::sync::Arc;

use catalog_import::catalog::{
    catalog_attrs, stock_attrs, BatchOutcome, CatalogBatchProcessor, CatalogError,
};
use catalog_import::config::CatalogConfig;
use catalog_import::queue::DeliveredMessage;
use catalog_import::table::MemoryTableStore;
use catalog_import::topic::MemoryTopic;
use cucumber::{given, then, when, World};

/// Test context for catalog batch scenarios.
#[derive(World)]
#[world(init = Self::new)]
pub struct CatalogWorld {
    tables: Arc<MemoryTableStore>,
    topic: Arc<MemoryTopic>,
    batch: Vec<DeliveredMessage>,
    result: Option<Result<BatchOutcome, CatalogError>>,
}

impl fmt::Debug for CatalogWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogWorld")
            .field("batch", &self.batch)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

impl CatalogWorld {
    fn new() -> Self {
        Self {
            tables: Arc::new(MemoryTableStore::new()),
            topic: Arc::new(MemoryTopic::new()),
            batch: Vec::new(),
            result: None,
        }
    }

    fn config() -> CatalogConfig {
        CatalogConfig::for_test()
    }
}

// --- Given steps ---

#[given("empty products and stock tables")]
async fn given_tables(world: &mut CatalogWorld) {
    let config = CatalogWorld::config();
    world
        .tables
        .create_table(&config.products_table, catalog_attrs::ID)
        .await;
    world
        .tables
        .create_table(&config.stock_table, stock_attrs::PRODUCT_ID)
        .await;
}

#[given(regex = r"^a queued product (\{.*\})$")]
async fn given_queued_product(world: &mut CatalogWorld, body: String) {
    let n = world.batch.len() + 1;
    world.batch.push(DeliveredMessage {
        message_id: format!("msg-{}", n),
        receipt_handle: format!("receipt-{}", n),
        body,
        receive_count: 1,
    });
}

#[given("the stock table rejects writes")]
async fn given_stock_fails(world: &mut CatalogWorld) {
    world
        .tables
        .set_fail_on_table(&CatalogWorld::config().stock_table, true)
        .await;
}

// --- When steps ---

#[when("the batch is processed")]
async fn when_processed(world: &mut CatalogWorld) {
    let processor = CatalogBatchProcessor::new(
        CatalogWorld::config(),
        world.tables.clone(),
        world.topic.clone(),
    );
    world.result = Some(processor.process(&world.batch).await);
}

// --- Then steps ---

#[then("the batch succeeds")]
async fn then_succeeds(world: &mut CatalogWorld) {
    assert!(matches!(world.result, Some(Ok(_))), "{:?}", world.result);
}

#[then("the batch fails")]
async fn then_fails(world: &mut CatalogWorld) {
    assert!(matches!(world.result, Some(Err(_))), "{:?}", world.result);
}

#[then(regex = r"^(\d+) rows? (?:is|are) written to each table$")]
async fn then_rows_written(world: &mut CatalogWorld, count: usize) {
    let config = CatalogWorld::config();
    assert_eq!(world.tables.items(&config.products_table).await.len(), count);
    assert_eq!(world.tables.items(&config.stock_table).await.len(), count);
}

#[then("every stock row joins a products row with the same id")]
async fn then_join_key(world: &mut CatalogWorld) {
    let config = CatalogWorld::config();
    for stock in world.tables.items(&config.stock_table).await {
        let id = stock[stock_attrs::PRODUCT_ID].as_str();
        assert!(
            world.tables.get(&config.products_table, id).await.is_some(),
            "no product row for {}",
            id
        );
    }
}

#[then(regex = r"^(\d+) notifications? (?:is|are) published$")]
async fn then_notifications(world: &mut CatalogWorld, count: usize) {
    assert_eq!(world.topic.published_count().await, count);
}

#[then(expr = "the {string} attribute is {string}")]
async fn then_attribute(world: &mut CatalogWorld, name: String, value: String) {
    let published = world.topic.published().await;
    let notification = &published.last().expect("nothing published").notification;
    assert_eq!(notification.attributes.get(&name), Some(&value));
}
