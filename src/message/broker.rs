//! Broker channel seam and its AMQP implementation

use crate::errors::{BrokerError, BrokerResult};
use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, Consumer};
use tracing::{debug, info};

/// One message handed out by the broker, awaiting ack or reject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub delivery_tag: u64,
    pub routing_key: String,
    pub body: Vec<u8>,
    /// `timestamp` message property, unix seconds
    pub timestamp: Option<u64>,
}

/// Manual-acknowledgement consumption on a single channel
#[async_trait]
pub trait BrokerChannel: Send {
    /// Limit unacknowledged deliveries on this channel
    async fn set_prefetch(&mut self, count: u16) -> BrokerResult<()>;

    /// Start consuming `queue` with manual acknowledgement
    async fn consume(&mut self, queue: &str, consumer_tag: &str) -> BrokerResult<()>;

    /// Next delivery; `None` once the consumer is cancelled or the channel closes
    async fn next_delivery(&mut self) -> Option<BrokerResult<Delivery>>;

    async fn ack(&mut self, delivery_tag: u64) -> BrokerResult<()>;

    /// Negative acknowledgement without requeue
    async fn reject(&mut self, delivery_tag: u64) -> BrokerResult<()>;
}

/// RabbitMQ channel backed by `lapin`
pub struct AmqpChannel {
    _connection: Connection,
    channel: Channel,
    consumer: Option<Consumer>,
}

impl AmqpChannel {
    pub async fn connect(uri: &str) -> BrokerResult<Self> {
        let connection = Connection::connect(uri, ConnectionProperties::default())
            .await
            .map_err(|e| BrokerError::ConnectionFailed(e.to_string()))?;
        let channel = connection.create_channel().await?;
        info!("Connected to broker, channel {}", channel.id());

        Ok(Self {
            _connection: connection,
            channel,
            consumer: None,
        })
    }
}

#[async_trait]
impl BrokerChannel for AmqpChannel {
    async fn set_prefetch(&mut self, count: u16) -> BrokerResult<()> {
        self.channel
            .basic_qos(count, BasicQosOptions::default())
            .await?;
        Ok(())
    }

    async fn consume(&mut self, queue: &str, consumer_tag: &str) -> BrokerResult<()> {
        let consumer = self
            .channel
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions {
                    no_ack: false,
                    ..BasicConsumeOptions::default()
                },
                FieldTable::default(),
            )
            .await?;
        self.consumer = Some(consumer);
        Ok(())
    }

    async fn next_delivery(&mut self) -> Option<BrokerResult<Delivery>> {
        let consumer = match self.consumer.as_mut() {
            Some(consumer) => consumer,
            None => return Some(Err(BrokerError::NotConsuming)),
        };

        match consumer.next().await? {
            Ok(delivery) => {
                debug!(
                    "Received delivery {} ({})",
                    delivery.delivery_tag, delivery.routing_key
                );
                Some(Ok(Delivery {
                    delivery_tag: delivery.delivery_tag,
                    routing_key: delivery.routing_key.as_str().to_string(),
                    timestamp: *delivery.properties.timestamp(),
                    body: delivery.data,
                }))
            }
            Err(e) => Some(Err(e.into())),
        }
    }

    async fn ack(&mut self, delivery_tag: u64) -> BrokerResult<()> {
        self.channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await?;
        Ok(())
    }

    async fn reject(&mut self, delivery_tag: u64) -> BrokerResult<()> {
        self.channel
            .basic_nack(
                delivery_tag,
                BasicNackOptions {
                    multiple: false,
                    requeue: false,
                },
            )
            .await?;
        Ok(())
    }
}
