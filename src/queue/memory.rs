//! In-memory queue for testing and local runs.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    check_batch, DeliveredMessage, MessageQueue, MessageSource, QueueError, QueueMessage, Result,
};
use crate::dlq::{DeadLetter, REASON_MAX_RECEIVES};

#[derive(Debug, Clone)]
struct Stored {
    message_id: String,
    body: String,
    receive_count: u32,
}

#[derive(Default)]
struct State {
    visible: VecDeque<Stored>,
    in_flight: HashMap<String, Stored>,
    sent_batches: Vec<Vec<QueueMessage>>,
    send_calls: usize,
    dead_letters: Vec<DeadLetter>,
}

/// In-memory durable queue.
///
/// Models the SQS contract: messages are hidden while in flight, redelivered
/// when released, and moved to the dead letters once they have been
/// delivered `max_receive_count` times without being acked.
pub struct MemoryQueue {
    name: String,
    max_receive_count: Option<u32>,
    state: Mutex<State>,
    fail_on_send: Mutex<bool>,
    fail_send_call: Mutex<Option<usize>>,
    send_delay: Mutex<Duration>,
}

impl MemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_receive_count: None,
            state: Mutex::new(State::default()),
            fail_on_send: Mutex::new(false),
            fail_send_call: Mutex::new(None),
            send_delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Attach a dead-letter queue that takes messages after `max_receive_count`
    /// deliveries.
    pub fn with_redrive(mut self, max_receive_count: u32) -> Self {
        self.max_receive_count = Some(max_receive_count);
        self
    }

    /// Enqueue one message outside the batch API.
    pub async fn push(&self, body: impl Into<String>) -> String {
        let message_id = Uuid::new_v4().to_string();
        self.state.lock().await.visible.push_back(Stored {
            message_id: message_id.clone(),
            body: body.into(),
            receive_count: 0,
        });
        message_id
    }

    pub async fn set_fail_on_send(&self, fail: bool) {
        *self.fail_on_send.lock().await = fail;
    }

    /// Fail only the `n`th `send_batch` call (zero-based).
    pub async fn fail_send_call(&self, n: usize) {
        *self.fail_send_call.lock().await = Some(n);
    }

    /// Make every `send_batch` call take at least `delay`.
    pub async fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock().await = delay;
    }

    /// Batches accepted so far, in arrival order.
    pub async fn sent_batches(&self) -> Vec<Vec<QueueMessage>> {
        self.state.lock().await.sent_batches.clone()
    }

    /// Every `send_batch` call, accepted or not.
    pub async fn send_calls(&self) -> usize {
        self.state.lock().await.send_calls
    }

    /// Bodies of messages waiting to be received.
    pub async fn visible_bodies(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .visible
            .iter()
            .map(|m| m.body.clone())
            .collect()
    }

    pub async fn in_flight_len(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }

    pub async fn dead_letters(&self) -> Vec<DeadLetter> {
        self.state.lock().await.dead_letters.clone()
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn send_batch(&self, entries: Vec<QueueMessage>) -> Result<()> {
        check_batch(&entries)?;

        let call = {
            let mut state = self.state.lock().await;
            state.send_calls += 1;
            state.send_calls - 1
        };

        let delay = *self.send_delay.lock().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if *self.fail_on_send.lock().await || *self.fail_send_call.lock().await == Some(call) {
            return Err(QueueError::SendFailed("Mock send failure".to_string()));
        }

        let mut state = self.state.lock().await;

        for entry in &entries {
            state.visible.push_back(Stored {
                message_id: Uuid::new_v4().to_string(),
                body: entry.body.clone(),
                receive_count: 0,
            });
        }
        debug!(queue = %self.name, count = entries.len(), "Accepted batch");
        state.sent_batches.push(entries);
        Ok(())
    }
}

#[async_trait]
impl MessageSource for MemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn receive(&self, max: usize) -> Result<Vec<DeliveredMessage>> {
        let mut state = self.state.lock().await;
        let mut delivered = Vec::new();

        while delivered.len() < max {
            let Some(mut message) = state.visible.pop_front() else {
                break;
            };

            if let Some(limit) = self.max_receive_count {
                if message.receive_count >= limit {
                    warn!(
                        queue = %self.name,
                        message_id = %message.message_id,
                        receive_count = message.receive_count,
                        "Moving message to dead-letter queue"
                    );
                    state.dead_letters.push(DeadLetter::new(
                        message.message_id,
                        message.body,
                        message.receive_count,
                        self.name.clone(),
                        REASON_MAX_RECEIVES,
                    ));
                    continue;
                }
            }

            message.receive_count += 1;
            let receipt_handle = format!("{}#{}", message.message_id, message.receive_count);
            delivered.push(DeliveredMessage {
                message_id: message.message_id.clone(),
                receipt_handle: receipt_handle.clone(),
                body: message.body.clone(),
                receive_count: message.receive_count,
            });
            state.in_flight.insert(receipt_handle, message);
        }

        Ok(delivered)
    }

    async fn ack(&self, messages: &[DeliveredMessage]) -> Result<()> {
        let mut state = self.state.lock().await;
        for message in messages {
            if state.in_flight.remove(&message.receipt_handle).is_none() {
                debug!(queue = %self.name, receipt = %message.receipt_handle, "Ack for unknown receipt");
            }
        }
        Ok(())
    }

    async fn release(&self, messages: &[DeliveredMessage]) -> Result<()> {
        let mut state = self.state.lock().await;
        for message in messages {
            if let Some(stored) = state.in_flight.remove(&message.receipt_handle) {
                state.visible.push_back(stored);
            }
        }
        Ok(())
    }
}
