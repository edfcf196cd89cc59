//! Pub/sub topic for catalog notifications.
//!
//! ## Backends
//!
//! - `MemoryTopic` - Records publishes, with attribute-filtered subscribers
//! - `SnsTopic` (feature: sns) - Amazon SNS
//!
//! Subscribers filter on message attributes, so attributes with no value are
//! left out rather than sent empty.

mod memory;
#[cfg(feature = "sns")]
mod sns;

pub use memory::{MemoryTopic, PublishedNotification, SubscriptionId};
#[cfg(feature = "sns")]
pub use sns::SnsTopic;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when publishing.
#[derive(Debug, Error)]
pub enum TopicError {
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Invalid attribute {0}: value must not be empty")]
    EmptyAttribute(String),
}

/// Result type for topic operations.
pub type Result<T> = std::result::Result<T, TopicError>;

/// A message to publish, with string attributes subscribers can filter on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    pub subject: Option<String>,
    pub body: String,
    pub attributes: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    fn check_attributes(&self) -> Result<()> {
        match self.attributes.iter().find(|(_, v)| v.is_empty()) {
            Some((name, _)) => Err(TopicError::EmptyAttribute(name.clone())),
            None => Ok(()),
        }
    }
}

/// Publishes notifications to a topic.
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    /// Publish and return the message id assigned by the topic.
    async fn publish(&self, topic_arn: &str, notification: &Notification) -> Result<String>;
}
