//! Durable message queues.
//!
//! Two seams: `MessageQueue` for producers (batched sends) and
//! `MessageSource` for consumers (receive, then ack or release). The
//! `Consumer` loop drives a `BatchHandler` over a source.
//!
//! ## Backends
//!
//! - `MemoryQueue` - In-memory, at-least-once with optional redrive
//! - `SqsQueue` (feature: sqs) - Amazon SQS
//!
//! ## Delivery
//!
//! Delivery is at-least-once. A received message stays hidden until it is
//! acked (deleted) or released. Released messages are redelivered; after
//! `max_receive_count` deliveries the queue moves them to its dead-letter
//! queue.

mod consumer;
mod memory;
#[cfg(feature = "sqs")]
mod sqs;

pub use consumer::{Consumer, PollOutcome};
pub use memory::MemoryQueue;
#[cfg(feature = "sqs")]
pub use sqs::SqsQueue;

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

/// Most entries a single batch send may carry.
pub const MAX_SEND_BATCH_SIZE: usize = 10;

/// Errors that can occur during queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    #[error("{} of {total} batch entries failed: {}", .failed.len(), .failed.join(", "))]
    PartialBatchFailure { failed: Vec<String>, total: usize },

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Acknowledge failed: {0}")]
    AckFailed(String),
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;

/// One entry of an outgoing batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Unique within the batch it is sent in.
    pub id: String,
    pub body: String,
}

impl QueueMessage {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
        }
    }
}

/// A message handed to a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredMessage {
    /// Queue-assigned id, stable across redeliveries.
    pub message_id: String,
    /// Handle for this delivery; used to ack or release.
    pub receipt_handle: String,
    pub body: String,
    /// Deliveries so far, this one included.
    pub receive_count: u32,
}

/// Producer side of a queue.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Send up to `MAX_SEND_BATCH_SIZE` messages in one request.
    ///
    /// Fails if any entry was not accepted.
    async fn send_batch(&self, entries: Vec<QueueMessage>) -> Result<()>;
}

/// Consumer side of a queue.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Queue name or URL, for logs and dead letters.
    fn name(&self) -> &str;

    /// Receive up to `max` messages. May return fewer, or none.
    async fn receive(&self, max: usize) -> Result<Vec<DeliveredMessage>>;

    /// Delete delivered messages.
    async fn ack(&self, messages: &[DeliveredMessage]) -> Result<()>;

    /// Give delivered messages back for redelivery.
    async fn release(&self, messages: &[DeliveredMessage]) -> Result<()>;
}

/// Error type handlers report to the consumer loop.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Processes one delivered batch.
///
/// `Ok` acknowledges every message in the batch. `Err` releases them all
/// for redelivery.
#[async_trait]
pub trait BatchHandler: Send + Sync {
    async fn handle(&self, messages: &[DeliveredMessage]) -> std::result::Result<(), HandlerError>;
}

/// Reject empty, oversized, or ambiguous batches before any I/O.
pub fn check_batch(entries: &[QueueMessage]) -> Result<()> {
    if entries.is_empty() {
        return Err(QueueError::InvalidBatch("batch is empty".to_string()));
    }
    if entries.len() > MAX_SEND_BATCH_SIZE {
        return Err(QueueError::InvalidBatch(format!(
            "{} entries exceeds the limit of {}",
            entries.len(),
            MAX_SEND_BATCH_SIZE
        )));
    }
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.id.as_str()) {
            return Err(QueueError::InvalidBatch(format!(
                "duplicate entry id {}",
                entry.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<QueueMessage> {
        (0..n)
            .map(|i| QueueMessage::new(format!("1700000000000-{}", i), "{}"))
            .collect()
    }

    #[test]
    fn test_check_batch_accepts_up_to_limit() {
        assert!(check_batch(&entries(1)).is_ok());
        assert!(check_batch(&entries(MAX_SEND_BATCH_SIZE)).is_ok());
    }

    #[test]
    fn test_check_batch_rejects_empty() {
        assert!(matches!(check_batch(&[]), Err(QueueError::InvalidBatch(_))));
    }

    #[test]
    fn test_check_batch_rejects_oversized() {
        let result = check_batch(&entries(MAX_SEND_BATCH_SIZE + 1));
        assert!(matches!(result, Err(QueueError::InvalidBatch(_))));
    }

    #[test]
    fn test_check_batch_rejects_duplicate_ids() {
        let batch = vec![QueueMessage::new("a", "{}"), QueueMessage::new("a", "{}")];
        assert!(matches!(check_batch(&batch), Err(QueueError::InvalidBatch(_))));
    }

    #[test]
    fn test_partial_failure_message() {
        let err = QueueError::PartialBatchFailure {
            failed: vec!["x-1".to_string(), "x-4".to_string()],
            total: 10,
        };
        assert_eq!(err.to_string(), "2 of 10 batch entries failed: x-1, x-4");
    }
}
