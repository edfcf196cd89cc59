//! Dead letters.
//!
//! A message that keeps failing is eventually moved off its source queue
//! (SQS redrive policy, or `MemoryQueue` with a receive limit). `DeadLetter`
//! is the record kept for manual review and replay.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::queue::DeliveredMessage;

/// Reason recorded when a queue stops redelivering a message.
pub const REASON_MAX_RECEIVES: &str = "max receive count exceeded";

/// A message that exhausted its deliveries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    pub message_id: String,
    pub body: String,
    pub receive_count: u32,
    pub source_queue: String,
    pub reason: String,
    pub dead_lettered_at: DateTime<Utc>,
}

impl DeadLetter {
    pub fn new(
        message_id: impl Into<String>,
        body: impl Into<String>,
        receive_count: u32,
        source_queue: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            body: body.into(),
            receive_count,
            source_queue: source_queue.into(),
            reason: reason.into(),
            dead_lettered_at: Utc::now(),
        }
    }

    /// Build from a delivery that failed on its last allowed attempt.
    pub fn from_delivered(
        message: &DeliveredMessage,
        source_queue: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            message.message_id.clone(),
            message.body.clone(),
            message.receive_count,
            source_queue,
            reason,
        )
    }
}

/// True when a failed delivery will not be retried again.
pub fn is_final_delivery(message: &DeliveredMessage, max_receive_count: u32) -> bool {
    message.receive_count >= max_receive_count
}
