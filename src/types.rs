//! Domain types for the bitcoind adapter
//!
//! - `identifiers`: validated `Hash` and `Address` newtypes
//! - `transaction`: `BitcoinTransaction` and its `Output`s
//! - `block`: `BitcoinBlock` summaries
//! - `events`: `BitcoinEvent` notifications published downstream

pub mod block;
pub mod events;
pub mod identifiers;
pub mod transaction;

pub use block::BitcoinBlock;
pub use events::BitcoinEvent;
pub use identifiers::{Address, Hash};
pub use transaction::{BitcoinTransaction, Output};
