//! Amazon SNS topic.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sns::types::MessageAttributeValue;
use aws_sdk_sns::Client;
use tracing::debug;

use super::{Notification, Result, TopicError, TopicPublisher};

/// SNS-backed publisher.
pub struct SnsTopic {
    client: Client,
}

impl SnsTopic {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }

    /// Create with explicit client (for testing).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TopicPublisher for SnsTopic {
    async fn publish(&self, topic_arn: &str, notification: &Notification) -> Result<String> {
        notification.check_attributes()?;

        let mut attrs = HashMap::new();
        for (name, value) in &notification.attributes {
            attrs.insert(
                name.clone(),
                MessageAttributeValue::builder()
                    .data_type("String")
                    .string_value(value)
                    .build()
                    .map_err(|e| {
                        TopicError::PublishFailed(format!("Failed to build attribute: {}", e))
                    })?,
            );
        }

        let output = self
            .client
            .publish()
            .topic_arn(topic_arn)
            .message(&notification.body)
            .set_subject(notification.subject.clone())
            .set_message_attributes(Some(attrs))
            .send()
            .await
            .map_err(|e| TopicError::PublishFailed(format!("Failed to publish to SNS: {}", e)))?;

        let message_id = output.message_id().unwrap_or_default().to_string();
        debug!(topic_arn = %topic_arn, message_id = %message_id, "Published to SNS");
        Ok(message_id)
    }
}
