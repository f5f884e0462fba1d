use crate::types::identifiers::Hash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Block summary as returned by `getblock` (verbosity 1)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinBlock {
    pub hash: Hash,
    pub merkle_root: Hash,
    pub confirmations: i64,
    pub transactions: Vec<Hash>,
    pub height: u64,
    pub timestamp: DateTime<Utc>,
}
