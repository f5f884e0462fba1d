use crate::config::BitcoinRpcConfig;
use crate::errors::{RpcError, RpcResult};
use crate::rpc::response::parse_response;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Single-command access to the node
///
/// Implementations issue exactly one RPC command per call and hand back the
/// `result` member with numbers already normalised to strings.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    async fn call(&self, command: &str, params: Vec<Value>) -> RpcResult<Value>;
}

/// Bitcoin Core JSON-RPC client over HTTP
pub struct BitcoindRpcClient {
    http: reqwest::Client,
    endpoint: String,
    username: String,
    password: String,
    request_id: AtomicU64,
    error_count: AtomicU64,
}

impl BitcoindRpcClient {
    pub fn new(config: &BitcoinRpcConfig) -> RpcResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                RpcError::ConnectionFailed(format!("Failed to create Bitcoin RPC client: {}", e))
            })?;

        let base = config.url.trim_end_matches('/');
        let endpoint = match &config.wallet {
            Some(wallet) if !wallet.is_empty() => format!("{}/wallet/{}", base, wallet),
            _ => base.to_string(),
        };

        Ok(Self {
            http,
            endpoint,
            username: config.username.clone(),
            password: config.password.clone(),
            request_id: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the current error count from RPC operations
    pub fn get_error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Test RPC connection
    pub async fn test_connection(&self) -> RpcResult<()> {
        let info = self.call("getblockchaininfo", Vec::new()).await?;
        let chain = info.get("chain").and_then(Value::as_str).unwrap_or("unknown");
        let blocks = info.get("blocks").and_then(Value::as_str).unwrap_or("unknown");
        info!(
            "Bitcoin Core connection test successful - chain: {}, blocks: {}",
            chain, blocks
        );
        Ok(())
    }

    async fn send(&self, command: &str, params: Vec<Value>) -> RpcResult<Value> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "1.0",
            "id": id,
            "method": command,
            "params": params,
        });
        debug!("RPC request {} '{}'", id, command);

        let response = self
            .http
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                RpcError::ConnectionFailed(format!("'{}' request failed: {}", command, e))
            })?;

        // bitcoind reports RPC errors with HTTP 500 and a JSON body, so the
        // body is read regardless of status.
        let status = response.status();
        let body = response.text().await?;
        if body.trim().is_empty() && !status.is_success() {
            return Err(RpcError::Http {
                command: command.to_string(),
                status: status.as_u16(),
            });
        }

        parse_response(command, &body)
    }
}

#[async_trait]
impl NodeRpc for BitcoindRpcClient {
    async fn call(&self, command: &str, params: Vec<Value>) -> RpcResult<Value> {
        match self.send(command, params).await {
            Ok(result) => Ok(result),
            Err(e) => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
                if e.is_insufficient_funds() {
                    warn!("Bitcoind '{}' reported insufficient funds: {}", command, e);
                } else {
                    error!("Bitcoind '{}' failed: {}", command, e);
                }
                Err(e)
            }
        }
    }
}
