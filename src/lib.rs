//! Bitcoin Core adapter for payment services
//!
//! Bridges a bitcoind node into the rest of a payment system:
//! - `rpc`: JSON-RPC gateway with precision-preserving response parsing
//! - `service`: request/send/query payments through the node's wallet
//! - `message`: turn bitcoind broker notifications into domain events

pub mod cli;
pub mod config;
pub mod errors;
pub mod message;
pub mod rpc;
pub mod service;
pub mod types;
pub mod utils;
