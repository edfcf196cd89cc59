//! Queue consumer loop settings.

use serde::Deserialize;

use super::ConfigError;

/// Upper bound SQS accepts for a single receive.
const MAX_RECEIVE_BATCH: i32 = 10;

/// Settings for the long-polling consumer loop shared by both binaries.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Max number of messages to receive in one poll (default: 5).
    pub max_messages: i32,
    /// Wait time seconds for long polling (default: 20).
    pub wait_time_secs: i32,
    /// Visibility timeout in seconds for received messages (default: 60).
    pub visibility_timeout_secs: i32,
    /// Deliveries before the queue redrives a message to its DLQ (default: 5).
    pub max_receive_count: u32,
    /// Pause between empty polls for backends without long polling.
    pub idle_delay_ms: u64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            max_messages: 5,
            wait_time_secs: 20,
            visibility_timeout_secs: 60,
            max_receive_count: 5,
            idle_delay_ms: 250,
        }
    }
}

impl ConsumerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_RECEIVE_BATCH).contains(&self.max_messages) {
            return Err(ConfigError::Invalid {
                field: "consumer.max_messages",
                message: format!("must be between 1 and {}", MAX_RECEIVE_BATCH),
            });
        }
        if !(0..=20).contains(&self.wait_time_secs) {
            return Err(ConfigError::Invalid {
                field: "consumer.wait_time_secs",
                message: "must be between 0 and 20".to_string(),
            });
        }
        if self.max_receive_count == 0 {
            return Err(ConfigError::Invalid {
                field: "consumer.max_receive_count",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
