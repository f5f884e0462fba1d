//! # Event Publisher
//!
//! Publishing side of the internal event channel. The worker only depends on
//! the [`EventPublisher`] trait; [`ChannelEventPublisher`] is the in-process
//! implementation used by the binary.

use crate::errors::PublishError;
use crate::types::BitcoinEvent;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// Channel carrying domain events to downstream services
pub const EVENTS_CHANNEL: &str = "events";

/// Events buffered per subscriber before the slowest one starts lagging
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: BitcoinEvent, channel: &str) -> Result<(), PublishError>;
}

/// In-memory publisher on top of `tokio::sync::broadcast`
pub struct ChannelEventPublisher {
    sender: broadcast::Sender<BitcoinEvent>,
    events_published: AtomicU64,
}

impl ChannelEventPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BitcoinEvent> {
        self.sender.subscribe()
    }

    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

impl Default for ChannelEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for ChannelEventPublisher {
    async fn publish(&self, event: BitcoinEvent, channel: &str) -> Result<(), PublishError> {
        if channel != EVENTS_CHANNEL {
            return Err(PublishError::UnknownChannel(channel.to_string()));
        }
        let receivers = self
            .sender
            .send(event)
            .map_err(|_| PublishError::NoSubscribers(channel.to_string()))?;
        self.events_published.fetch_add(1, Ordering::Relaxed);
        debug!("Published event to {} subscriber(s) on '{}'", receivers, channel);
        Ok(())
    }
}
