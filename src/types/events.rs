//! Domain events emitted for node notifications

use crate::types::identifiers::Hash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One event per broker notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BitcoinEvent {
    BlockHashReceived {
        hash: Hash,
        received_at: DateTime<Utc>,
    },
    TransactionHashReceived {
        hash: Hash,
        received_at: DateTime<Utc>,
    },
}

impl BitcoinEvent {
    pub fn hash(&self) -> &Hash {
        match self {
            BitcoinEvent::BlockHashReceived { hash, .. }
            | BitcoinEvent::TransactionHashReceived { hash, .. } => hash,
        }
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        match self {
            BitcoinEvent::BlockHashReceived { received_at, .. }
            | BitcoinEvent::TransactionHashReceived { received_at, .. } => *received_at,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BitcoinEvent::BlockHashReceived { .. } => "block_hash_received",
            BitcoinEvent::TransactionHashReceived { .. } => "transaction_hash_received",
        }
    }
}
