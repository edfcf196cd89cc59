//! Import file parser step definitions.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use catalog_import::config::ImportConfig;
use catalog_import::import::{FileOutcome, ImportFileParser, ImportReport, SkipReason};
use catalog_import::object_store::{MemoryObjectStore, ObjectCreatedEvent};
use catalog_import::queue::{MemoryQueue, QueueMessage};
use cucumber::{given, then, when, World};

const BUCKET: &str = "import-bucket";

/// Test context for import parser scenarios.
#[derive(World)]
#[world(init = Self::new)]
pub struct ImportWorld {
    store: Arc<MemoryObjectStore>,
    queue: Arc<MemoryQueue>,
    report: Option<ImportReport>,
}

impl fmt::Debug for ImportWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportWorld")
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

impl ImportWorld {
    fn new() -> Self {
        Self {
            store: Arc::new(MemoryObjectStore::new()),
            queue: Arc::new(MemoryQueue::new("catalog-items")),
            report: None,
        }
    }

    fn report(&self) -> &ImportReport {
        self.report.as_ref().expect("parser has not run")
    }

    async fn batches(&self) -> Vec<Vec<QueueMessage>> {
        self.queue.sent_batches().await
    }

    async fn handle(&mut self, keys: &[&str]) {
        let parser = ImportFileParser::new(
            ImportConfig::for_test(),
            self.store.clone(),
            self.queue.clone(),
        );
        let event = ObjectCreatedEvent::for_objects(BUCKET, keys.iter().copied());
        self.report = Some(parser.handle_event(&event).await);
    }
}

fn product_csv(rows: usize) -> String {
    let mut csv = String::from("name,description,price,count\n");
    for i in 0..rows {
        csv.push_str(&format!("Product {},Row {},{},{}\n", i, i, 10 + i, i));
    }
    csv
}

// --- Given steps ---

#[given("an import bucket with an empty queue")]
async fn given_empty(world: &mut ImportWorld) {
    assert!(world.store.keys(BUCKET).await.is_empty());
    assert_eq!(world.queue.send_calls().await, 0);
}

#[given(expr = "an uploaded file {string} with {int} product rows")]
async fn given_uploaded_file(world: &mut ImportWorld, key: String, rows: usize) {
    world.store.put(BUCKET, &key, product_csv(rows)).await;
}

#[given("the queue rejects the second batch send")]
async fn given_second_send_fails(world: &mut ImportWorld) {
    world.queue.fail_send_call(1).await;
}

// --- When steps ---

#[when(expr = "the parser handles a notification for {string}")]
async fn when_parser_handles(world: &mut ImportWorld, key: String) {
    world.handle(&[key.as_str()]).await;
}

#[when(expr = "the parser handles a notification for {string} and {string}")]
async fn when_parser_handles_two(world: &mut ImportWorld, first: String, second: String) {
    world.handle(&[first.as_str(), second.as_str()]).await;
}

// --- Then steps ---

#[then(expr = "{int} batches are sent")]
async fn then_batches_sent(world: &mut ImportWorld, count: usize) {
    assert_eq!(world.batches().await.len(), count);
}

#[then(expr = "no batch holds more than {int} messages")]
async fn then_batch_ceiling(world: &mut ImportWorld, max: usize) {
    for batch in world.batches().await {
        assert!(batch.len() <= max, "batch of {}", batch.len());
    }
}

#[then(expr = "{int} messages are queued in total")]
async fn then_total_messages(world: &mut ImportWorld, total: usize) {
    assert_eq!(world.queue.visible_bodies().await.len(), total);
}

#[then("entry ids are unique within every batch")]
async fn then_ids_unique(world: &mut ImportWorld) {
    for batch in world.batches().await {
        let ids: HashSet<&str> = batch.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), batch.len());
    }
}

#[then(expr = "the bucket holds only {string}")]
async fn then_bucket_holds_only(world: &mut ImportWorld, key: String) {
    assert_eq!(world.store.keys(BUCKET).await, vec![key]);
}

#[then(expr = "the bucket holds {string} and {string}")]
async fn then_bucket_holds(world: &mut ImportWorld, first: String, second: String) {
    let mut expected = vec![first, second];
    expected.sort();
    assert_eq!(world.store.keys(BUCKET).await, expected);
}

#[then(expr = "the file {string} failed with a retryable error")]
async fn then_failed_retryable(world: &mut ImportWorld, key: String) {
    let (failed_key, error) = world
        .report()
        .failures()
        .next()
        .expect("no failed file");
    assert_eq!(failed_key, key);
    assert!(error.is_retryable(), "{}", error);
}

#[then(expr = "{string} is skipped")]
async fn then_skipped(world: &mut ImportWorld, key: String) {
    let skipped = world.report().outcomes.iter().any(|o| {
        matches!(
            o,
            FileOutcome::Skipped { key: k, reason: SkipReason::UnsupportedExtension } if *k == key
        )
    });
    assert!(skipped, "{} was not skipped", key);
}
