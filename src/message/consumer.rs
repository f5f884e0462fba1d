use crate::errors::{AppError, AppResult, BrokerResult, HandlingError};
use crate::message::broker::{BrokerChannel, Delivery};
use crate::message::publisher::{EventPublisher, EVENTS_CHANNEL};
use crate::message::translator::translate;
use crate::types::BitcoinEvent;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Unacknowledged deliveries allowed per channel
pub const PREFETCH_COUNT: u16 = 1;

/// Outcome counters for one `run`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub published: u64,
    pub ignored: u64,
    pub rejected: u64,
}

impl WorkerStats {
    pub fn total(&self) -> u64 {
        self.published + self.ignored + self.rejected
    }
}

/// Consumes bitcoind notifications and republishes them as domain events
///
/// Deliveries are handled strictly one at a time: the broker is asked for a
/// prefetch of one, and each delivery is acked or rejected before the next
/// one is requested.
pub struct BitcoindMessageWorker<C: BrokerChannel, P: EventPublisher + ?Sized> {
    channel: C,
    publisher: Arc<P>,
    consumer_tag: String,
    stats: WorkerStats,
}

impl<C: BrokerChannel, P: EventPublisher + ?Sized> BitcoindMessageWorker<C, P> {
    pub fn new(channel: C, publisher: Arc<P>, consumer_tag: impl Into<String>) -> Self {
        Self {
            channel,
            publisher,
            consumer_tag: consumer_tag.into(),
            stats: WorkerStats::default(),
        }
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats
    }

    /// Consume `queue` until the broker cancels the consumer
    pub async fn run(&mut self, queue: &str) -> AppResult<WorkerStats> {
        self.run_until(queue, std::future::pending::<()>()).await
    }

    /// Consume `queue` until the broker cancels the consumer or `shutdown` resolves
    ///
    /// Shutdown is only observed between deliveries; a delivery that has
    /// been received is always acked or rejected first.
    pub async fn run_until<F>(&mut self, queue: &str, shutdown: F) -> AppResult<WorkerStats>
    where
        F: Future<Output = ()> + Send,
    {
        if queue.trim().is_empty() {
            return Err(AppError::Config("queue name must not be blank".to_string()));
        }

        self.channel.set_prefetch(PREFETCH_COUNT).await?;
        self.channel.consume(queue, &self.consumer_tag).await?;
        info!("Consuming bitcoind messages from '{}'", queue);

        tokio::pin!(shutdown);
        loop {
            let next = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping consumer on '{}'", queue);
                    break;
                }
                next = self.channel.next_delivery() => next,
            };

            match next {
                Some(Ok(delivery)) => self.execute(delivery).await?,
                Some(Err(e)) => return Err(e.into()),
                None => {
                    info!("Consumer on '{}' cancelled", queue);
                    break;
                }
            }
        }

        info!(
            "Consumer stopped: {} published, {} ignored, {} rejected",
            self.stats.published, self.stats.ignored, self.stats.rejected
        );
        Ok(self.stats)
    }

    async fn execute(&mut self, delivery: Delivery) -> BrokerResult<()> {
        match self.handle(&delivery).await {
            Ok(Some(event)) => {
                debug!(
                    "Published {} for '{}' ({}, received {})",
                    event.name(),
                    delivery.routing_key,
                    event.hash(),
                    event.received_at()
                );
                self.channel.ack(delivery.delivery_tag).await?;
                self.stats.published += 1;
            }
            Ok(None) => {
                debug!("Ignoring bitcoind message '{}'", delivery.routing_key);
                self.channel.ack(delivery.delivery_tag).await?;
                self.stats.ignored += 1;
            }
            Err(e) => {
                error!(
                    routing_key = %delivery.routing_key,
                    delivery_tag = delivery.delivery_tag,
                    error = ?e,
                    "Error handling bitcoind message '{}': {}",
                    delivery.routing_key,
                    e
                );
                self.channel.reject(delivery.delivery_tag).await?;
                self.stats.rejected += 1;
            }
        }
        Ok(())
    }

    async fn handle(&self, delivery: &Delivery) -> Result<Option<BitcoinEvent>, HandlingError> {
        let event = match translate(&delivery.routing_key, &delivery.body, delivery.timestamp)? {
            Some(event) => event,
            None => return Ok(None),
        };
        self.publisher.publish(event.clone(), EVENTS_CHANNEL).await?;
        Ok(Some(event))
    }
}
