//! Queue handler for object-created notifications.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::ImportFileParser;
use crate::object_store::ObjectCreatedEvent;
use crate::queue::{BatchHandler, DeliveredMessage, HandlerError};

/// Feeds storage notifications from a queue to the parser.
///
/// A batch is released only when some file failed in a retryable way.
/// Unreadable notifications are logged and dropped.
pub struct ImportNotificationHandler {
    parser: Arc<ImportFileParser>,
}

impl ImportNotificationHandler {
    pub fn new(parser: Arc<ImportFileParser>) -> Self {
        Self { parser }
    }
}

#[async_trait]
impl BatchHandler for ImportNotificationHandler {
    async fn handle(&self, messages: &[DeliveredMessage]) -> Result<(), HandlerError> {
        let mut retryable = Vec::new();

        for message in messages {
            let event: ObjectCreatedEvent = match serde_json::from_str(&message.body) {
                Ok(event) => event,
                Err(e) => {
                    warn!(
                        message_id = %message.message_id,
                        error = %e,
                        "Dropping unreadable notification"
                    );
                    continue;
                }
            };

            let report = self.parser.handle_event(&event).await;
            for (key, summary) in report.imported() {
                info!(
                    key = %key,
                    records = summary.records,
                    archived_to = %summary.archived_to,
                    "Imported file"
                );
            }
            retryable.extend(
                report
                    .failures()
                    .filter(|(_, e)| e.is_retryable())
                    .map(|(key, _)| key.to_string()),
            );
        }

        if retryable.is_empty() {
            Ok(())
        } else {
            Err(format!("retryable import failures: {}", retryable.join(", ")).into())
        }
    }
}
