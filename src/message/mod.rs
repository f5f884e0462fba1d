//! bitcoind notification consumption
//!
//! - **Broker** - `BrokerChannel` seam and the `lapin` backed `AmqpChannel`
//! - **Translator** - routing key + body to `BitcoinEvent`
//! - **Publisher** - `EventPublisher` seam and the in-process broadcast publisher
//! - **Consumer** - the prefetch-one worker tying them together

pub mod broker;
pub mod consumer;
pub mod publisher;
pub mod translator;

// Re-export main types
pub use broker::{AmqpChannel, BrokerChannel, Delivery};
pub use consumer::{BitcoindMessageWorker, WorkerStats, PREFETCH_COUNT};
pub use publisher::{ChannelEventPublisher, EventPublisher, EVENTS_CHANNEL};
pub use translator::{notification_kind, translate, NotificationKind};
