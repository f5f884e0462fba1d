//! Routing key + payload to domain event translation
//!
//! bitcoind notifications arrive with routing keys of the form
//! `<source>.message.<topic>`. Only `hashblock` and `hashtx` are understood;
//! any other topic is ignored so new notification types can be bound to the
//! queue without breaking the adapter.

use crate::errors::MessageError;
use crate::types::{BitcoinEvent, Hash};
use crate::utils::time::timestamp_to_datetime;

pub const TOPIC_BLOCK_HASH: &str = "hashblock";
pub const TOPIC_TRANSACTION_HASH: &str = "hashtx";

/// Notification types the adapter knows how to translate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    BlockHash,
    TransactionHash,
}

/// Match a routing key against `*.message.hashblock` / `*.message.hashtx`
pub fn notification_kind(routing_key: &str) -> Option<NotificationKind> {
    let mut segments = routing_key.split('.');
    let (source, kind, topic) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() || source.is_empty() || kind != "message" {
        return None;
    }
    match topic {
        TOPIC_BLOCK_HASH => Some(NotificationKind::BlockHash),
        TOPIC_TRANSACTION_HASH => Some(NotificationKind::TransactionHash),
        _ => None,
    }
}

/// Translate one delivery into a domain event
///
/// `Ok(None)` means the routing key is not one the adapter handles.
/// The body and timestamp are only inspected for recognised keys.
pub fn translate(
    routing_key: &str,
    body: &[u8],
    timestamp: Option<u64>,
) -> Result<Option<BitcoinEvent>, MessageError> {
    let kind = match notification_kind(routing_key) {
        Some(kind) => kind,
        None => return Ok(None),
    };

    if body.is_empty() {
        return Err(MessageError::EmptyBody);
    }
    let hash = Hash::from_bytes(body).map_err(|e| MessageError::InvalidData(e.to_string()))?;

    let seconds = timestamp.ok_or(MessageError::MissingTimestamp)?;
    let received_at = i64::try_from(seconds)
        .ok()
        .and_then(timestamp_to_datetime)
        .ok_or(MessageError::InvalidTimestamp(seconds))?;

    Ok(Some(match kind {
        NotificationKind::BlockHash => BitcoinEvent::BlockHashReceived { hash, received_at },
        NotificationKind::TransactionHash => {
            BitcoinEvent::TransactionHashReceived { hash, received_at }
        }
    }))
}
