//! Catalog import pipeline.
//!
//! Bulk product files land in an object store, get streamed and parsed into
//! queue messages, and are persisted by a batch processor that validates each
//! product, writes the catalog and stock tables, and announces what was added.
//!
//! ```text
//! [uploaded/x.csv] -> [import] -> [queue] -> [catalog] -> [tables]
//!        |                                       |
//!        v                                       v
//!  [parsed/x.csv]                             [topic]
//! ```
//!
//! Every external collaborator sits behind a trait with an AWS implementation
//! (feature-gated) and an in-memory one.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod dlq;
pub mod import;
pub mod object_store;
pub mod queue;
pub mod table;
pub mod topic;
pub mod utils;
pub mod validation;
