//! Grouping parsed records into queue batches.

use chrono::Utc;

use super::ImportRecord;
use crate::queue::{QueueMessage, MAX_SEND_BATCH_SIZE};

/// Split records into send batches of at most `MAX_SEND_BATCH_SIZE`.
///
/// Entry ids are `{timestamp_millis}-{row_index}`, unique across the file and
/// so within every batch.
pub fn batch_messages(records: &[ImportRecord]) -> serde_json::Result<Vec<Vec<QueueMessage>>> {
    batch_messages_at(records, Utc::now().timestamp_millis())
}

pub(crate) fn batch_messages_at(
    records: &[ImportRecord],
    timestamp_millis: i64,
) -> serde_json::Result<Vec<Vec<QueueMessage>>> {
    records
        .chunks(MAX_SEND_BATCH_SIZE)
        .enumerate()
        .map(|(chunk_index, chunk)| {
            chunk
                .iter()
                .enumerate()
                .map(|(offset, record)| {
                    let index = chunk_index * MAX_SEND_BATCH_SIZE + offset;
                    Ok(QueueMessage::new(
                        format!("{}-{}", timestamp_millis, index),
                        record.to_json()?,
                    ))
                })
                .collect()
        })
        .collect()
}
