//! Pure utility functions.
//!
//! These are stateless helpers used across the codebase.

#[cfg(any(feature = "s3", feature = "sqs", feature = "sns", feature = "dynamo"))]
pub mod aws;
pub mod bootstrap;
pub mod retry;
