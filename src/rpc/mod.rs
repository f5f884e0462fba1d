//! Bitcoin Core RPC integration module
//!
//! - **Client** - `NodeRpc` seam and its HTTP JSON-RPC implementation
//! - **Response** - numeric normalisation, node error extraction, field readers
//!
//! Each call issues exactly one command. Retries and timeouts beyond the
//! HTTP client's own timeout are left to callers.

pub mod client;
pub mod response;

// Re-export main types
pub use client::{BitcoindRpcClient, NodeRpc};
pub use response::{parse_response, quote_numeric_literals};
