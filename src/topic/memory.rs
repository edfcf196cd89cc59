//! In-memory topic for testing.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Notification, Result, TopicError, TopicPublisher};

/// Handle returned by `MemoryTopic::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(usize);

/// A publish the topic accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedNotification {
    pub topic_arn: String,
    pub message_id: String,
    pub notification: Notification,
}

struct Subscription {
    /// Deliver only notifications carrying this attribute.
    filter_key: Option<String>,
    received: Vec<Notification>,
}

/// Topic that records publishes and fans out to filtered subscribers.
#[derive(Default)]
pub struct MemoryTopic {
    published: RwLock<Vec<PublishedNotification>>,
    subscriptions: RwLock<Vec<Subscription>>,
    fail_on_publish: RwLock<bool>,
}

impl MemoryTopic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber. With a `filter_key`, only notifications that carry
    /// that attribute are delivered to it.
    pub async fn subscribe(&self, filter_key: Option<&str>) -> SubscriptionId {
        let mut subscriptions = self.subscriptions.write().await;
        subscriptions.push(Subscription {
            filter_key: filter_key.map(str::to_string),
            received: Vec::new(),
        });
        SubscriptionId(subscriptions.len() - 1)
    }

    pub async fn received(&self, subscription: SubscriptionId) -> Vec<Notification> {
        self.subscriptions
            .read()
            .await
            .get(subscription.0)
            .map(|s| s.received.clone())
            .unwrap_or_default()
    }

    pub async fn set_fail_on_publish(&self, fail: bool) {
        *self.fail_on_publish.write().await = fail;
    }

    pub async fn published(&self) -> Vec<PublishedNotification> {
        self.published.read().await.clone()
    }

    pub async fn published_count(&self) -> usize {
        self.published.read().await.len()
    }
}

#[async_trait]
impl TopicPublisher for MemoryTopic {
    async fn publish(&self, topic_arn: &str, notification: &Notification) -> Result<String> {
        if *self.fail_on_publish.read().await {
            return Err(TopicError::PublishFailed("Mock publish failure".to_string()));
        }
        notification.check_attributes()?;

        let message_id = Uuid::new_v4().to_string();
        for subscription in self.subscriptions.write().await.iter_mut() {
            let matches = subscription
                .filter_key
                .as_ref()
                .map_or(true, |key| notification.attributes.contains_key(key));
            if matches {
                subscription.received.push(notification.clone());
            }
        }

        self.published.write().await.push(PublishedNotification {
            topic_arn: topic_arn.to_string(),
            message_id: message_id.clone(),
            notification: notification.clone(),
        });
        Ok(message_id)
    }
}
