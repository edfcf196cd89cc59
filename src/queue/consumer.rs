//! Poll loop shared by the pipeline workers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use super::{BatchHandler, MessageSource, Result};
use crate::config::ConsumerConfig;
use crate::dlq::{is_final_delivery, DeadLetter};

/// What a single poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing was waiting.
    Idle,
    /// The handler succeeded; this many messages were deleted.
    Acked(usize),
    /// The handler failed; this many messages were released for redelivery.
    Released(usize),
}

/// Receives batches from a source and settles them by handler result.
pub struct Consumer {
    source: Arc<dyn MessageSource>,
    handler: Arc<dyn BatchHandler>,
    config: ConsumerConfig,
}

impl Consumer {
    pub fn new(
        source: Arc<dyn MessageSource>,
        handler: Arc<dyn BatchHandler>,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            source,
            handler,
            config,
        }
    }

    /// Receive one batch, hand it to the handler, then ack or release it.
    pub async fn run_once(&self) -> Result<PollOutcome> {
        let max = usize::try_from(self.config.max_messages).unwrap_or(1).max(1);
        let messages = self.source.receive(max).await?;
        if messages.is_empty() {
            return Ok(PollOutcome::Idle);
        }

        match self.handler.handle(&messages).await {
            Ok(()) => {
                self.source.ack(&messages).await?;
                Ok(PollOutcome::Acked(messages.len()))
            }
            Err(e) => {
                warn!(
                    queue = %self.source.name(),
                    count = messages.len(),
                    error = %e,
                    "Batch failed, releasing for redelivery"
                );
                for message in &messages {
                    if is_final_delivery(message, self.config.max_receive_count) {
                        let letter =
                            DeadLetter::from_delivered(message, self.source.name(), e.to_string());
                        error!(
                            queue = %letter.source_queue,
                            message_id = %letter.message_id,
                            receive_count = letter.receive_count,
                            reason = %letter.reason,
                            "Message exhausted its deliveries and will be dead-lettered"
                        );
                    }
                }
                self.source.release(&messages).await?;
                Ok(PollOutcome::Released(messages.len()))
            }
        }
    }

    /// Poll until `shutdown` turns true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let idle_delay = Duration::from_millis(self.config.idle_delay_ms);
        info!(queue = %self.source.name(), "Consumer started");

        while !*shutdown.borrow() {
            let pause = match self.run_once().await {
                Ok(PollOutcome::Idle) => Some(idle_delay),
                Ok(_) => None,
                Err(e) => {
                    error!(queue = %self.source.name(), error = %e, "Poll failed");
                    Some(idle_delay)
                }
            };

            if let Some(pause) = pause {
                tokio::select! {
                    _ = tokio::time::sleep(pause) => {}
                    _ = shutdown.changed() => {}
                }
            }
        }

        info!(queue = %self.source.name(), "Consumer stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{DeliveredMessage, HandlerError, MemoryQueue};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingHandler {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl BatchHandler for CountingHandler {
        async fn handle(
            &self,
            _messages: &[DeliveredMessage],
        ) -> std::result::Result<(), HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err("handler failure".into());
            }
            Ok(())
        }
    }

    fn consumer(queue: Arc<MemoryQueue>, handler: Arc<CountingHandler>) -> Consumer {
        let config = ConsumerConfig {
            idle_delay_ms: 5,
            ..Default::default()
        };
        Consumer::new(queue, handler, config)
    }

    #[tokio::test]
    async fn test_idle_when_empty() {
        let queue = Arc::new(MemoryQueue::new("items"));
        let handler = Arc::new(CountingHandler::new(false));

        let outcome = consumer(queue, handler.clone()).run_once().await.unwrap();

        assert_eq!(outcome, PollOutcome::Idle);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_acks_batch() {
        let queue = Arc::new(MemoryQueue::new("items"));
        queue.push("{}").await;
        queue.push("{}").await;
        let handler = Arc::new(CountingHandler::new(false));

        let outcome = consumer(queue.clone(), handler).run_once().await.unwrap();

        assert_eq!(outcome, PollOutcome::Acked(2));
        assert_eq!(queue.in_flight_len().await, 0);
        assert!(queue.visible_bodies().await.is_empty());
    }

    #[tokio::test]
    async fn test_failure_releases_batch() {
        let queue = Arc::new(MemoryQueue::new("items"));
        queue.push("{}").await;
        let handler = Arc::new(CountingHandler::new(true));

        let outcome = consumer(queue.clone(), handler).run_once().await.unwrap();

        assert_eq!(outcome, PollOutcome::Released(1));
        assert_eq!(queue.visible_bodies().await, vec!["{}".to_string()]);
    }

    #[tokio::test]
    async fn test_receives_at_most_max_messages() {
        let queue = Arc::new(MemoryQueue::new("items"));
        for _ in 0..7 {
            queue.push("{}").await;
        }
        let handler = Arc::new(CountingHandler::new(false));

        let outcome = consumer(queue.clone(), handler).run_once().await.unwrap();

        assert_eq!(outcome, PollOutcome::Acked(5));
        assert_eq!(queue.visible_bodies().await.len(), 2);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let queue = Arc::new(MemoryQueue::new("items"));
        queue.push("{}").await;
        let handler = Arc::new(CountingHandler::new(false));
        let consumer = consumer(queue.clone(), handler.clone());
        let (tx, rx) = watch::channel(false);

        let task = tokio::spawn(async move { consumer.run(rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(queue.in_flight_len().await, 0);
    }
}
