//! Payment service operations against a bitcoind wallet
//!
//! - **Eligibility** - pure `can_request` / `can_send` checks and resolved settings
//! - **Bitcoind** - request, send, fee estimation and lookups over `NodeRpc`

pub mod bitcoind;
pub mod eligibility;

pub use bitcoind::BitcoindService;
pub use eligibility::{can_request, can_send, ServiceSettings};
