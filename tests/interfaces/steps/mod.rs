//! Step definitions for the interface tests.

pub mod authorizer;
pub mod catalog_batch;
pub mod import_parser;
