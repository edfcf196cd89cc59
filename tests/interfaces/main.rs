//! Interface tests for the catalog import pipeline using Cucumber.
//!
//! Every scenario runs against the in-memory collaborators, so no container
//! runtime is needed:
//!
//! ```bash
//! cargo test --test interfaces
//! ```

mod steps;

use cucumber::World;
use steps::authorizer::AuthorizerWorld;
use steps::catalog_batch::CatalogWorld;
use steps::import_parser::ImportWorld;

#[tokio::main]
async fn main() {
    println!("\n=== Running Import Parser Interface Tests ===\n");
    ImportWorld::cucumber()
        .fail_on_skipped()
        .run("tests/interfaces/features/import_parser.feature")
        .await;

    println!("\n=== Running Catalog Batch Interface Tests ===\n");
    CatalogWorld::cucumber()
        .fail_on_skipped()
        .run("tests/interfaces/features/catalog_batch.feature")
        .await;

    println!("\n=== Running Authorizer Interface Tests ===\n");
    AuthorizerWorld::cucumber()
        .fail_on_skipped()
        .run("tests/interfaces/features/authorizer.feature")
        .await;
}
