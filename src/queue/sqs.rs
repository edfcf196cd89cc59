//! Amazon SQS queue.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::types::{
    DeleteMessageBatchRequestEntry, MessageSystemAttributeName, SendMessageBatchRequestEntry,
};
use aws_sdk_sqs::Client;
use tracing::{debug, warn};

use super::{
    check_batch, DeliveredMessage, MessageQueue, MessageSource, QueueError, QueueMessage, Result,
    MAX_SEND_BATCH_SIZE,
};
use crate::config::ConsumerConfig;

/// SQS queue addressed by URL. Works as both producer and consumer.
pub struct SqsQueue {
    client: Client,
    queue_url: String,
    wait_time_secs: i32,
    visibility_timeout_secs: i32,
}

impl SqsQueue {
    pub fn new(
        sdk_config: &SdkConfig,
        queue_url: impl Into<String>,
        consumer: &ConsumerConfig,
    ) -> Self {
        Self::with_client(Client::new(sdk_config), queue_url, consumer)
    }

    /// Create with explicit client (for testing).
    pub fn with_client(
        client: Client,
        queue_url: impl Into<String>,
        consumer: &ConsumerConfig,
    ) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
            wait_time_secs: consumer.wait_time_secs,
            visibility_timeout_secs: consumer.visibility_timeout_secs,
        }
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn send_batch(&self, entries: Vec<QueueMessage>) -> Result<()> {
        check_batch(&entries)?;
        let total = entries.len();

        let request_entries = entries
            .iter()
            .map(|m| {
                SendMessageBatchRequestEntry::builder()
                    .id(&m.id)
                    .message_body(&m.body)
                    .build()
                    .map_err(|e| QueueError::SendFailed(format!("Failed to build entry: {}", e)))
            })
            .collect::<Result<Vec<_>>>()?;

        let output = self
            .client
            .send_message_batch()
            .queue_url(&self.queue_url)
            .set_entries(Some(request_entries))
            .send()
            .await
            .map_err(|e| QueueError::SendFailed(format!("SQS send_message_batch failed: {}", e)))?;

        let failed: Vec<String> = output
            .failed()
            .iter()
            .map(|f| {
                warn!(
                    queue_url = %self.queue_url,
                    id = %f.id(),
                    code = %f.code(),
                    message = ?f.message(),
                    "Batch entry rejected"
                );
                f.id().to_string()
            })
            .collect();

        if !failed.is_empty() {
            return Err(QueueError::PartialBatchFailure { failed, total });
        }

        debug!(queue_url = %self.queue_url, count = total, "Sent batch to SQS");
        Ok(())
    }
}

#[async_trait]
impl MessageSource for SqsQueue {
    fn name(&self) -> &str {
        &self.queue_url
    }

    async fn receive(&self, max: usize) -> Result<Vec<DeliveredMessage>> {
        let max = max.clamp(1, MAX_SEND_BATCH_SIZE) as i32;

        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max)
            .wait_time_seconds(self.wait_time_secs)
            .visibility_timeout(self.visibility_timeout_secs)
            .message_system_attribute_names(MessageSystemAttributeName::ApproximateReceiveCount)
            .send()
            .await
            .map_err(|e| QueueError::ReceiveFailed(format!("SQS receive_message failed: {}", e)))?;

        let delivered = output
            .messages()
            .iter()
            .filter_map(|message| {
                let receipt_handle = message.receipt_handle()?.to_string();
                let receive_count = message
                    .attributes()
                    .and_then(|attrs| attrs.get(&MessageSystemAttributeName::ApproximateReceiveCount))
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1);
                Some(DeliveredMessage {
                    message_id: message.message_id().unwrap_or_default().to_string(),
                    receipt_handle,
                    body: message.body().unwrap_or_default().to_string(),
                    receive_count,
                })
            })
            .collect();

        Ok(delivered)
    }

    async fn ack(&self, messages: &[DeliveredMessage]) -> Result<()> {
        for chunk in messages.chunks(MAX_SEND_BATCH_SIZE) {
            let entries = chunk
                .iter()
                .enumerate()
                .map(|(i, m)| {
                    DeleteMessageBatchRequestEntry::builder()
                        .id(i.to_string())
                        .receipt_handle(&m.receipt_handle)
                        .build()
                        .map_err(|e| QueueError::AckFailed(format!("Failed to build entry: {}", e)))
                })
                .collect::<Result<Vec<_>>>()?;

            let output = self
                .client
                .delete_message_batch()
                .queue_url(&self.queue_url)
                .set_entries(Some(entries))
                .send()
                .await
                .map_err(|e| {
                    QueueError::AckFailed(format!("SQS delete_message_batch failed: {}", e))
                })?;

            if !output.failed().is_empty() {
                return Err(QueueError::AckFailed(format!(
                    "{} of {} deletes failed",
                    output.failed().len(),
                    chunk.len()
                )));
            }
        }
        Ok(())
    }

    async fn release(&self, messages: &[DeliveredMessage]) -> Result<()> {
        // Visibility timeout expiry makes them visible again.
        debug!(
            queue_url = %self.queue_url,
            count = messages.len(),
            "Leaving messages for redelivery after visibility timeout"
        );
        Ok(())
    }
}
