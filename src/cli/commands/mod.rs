//! Subcommand implementations
//!
//! Each command loads its collaborators from `AppConfig`, with the RPC
//! connection overridable on the command line.

pub mod consume;
pub mod query;
pub mod test_rpc;
pub mod wallet;

use crate::config::{AppConfig, BitcoinRpcConfig};
use crate::errors::{AppError, AppResult};
use crate::rpc::BitcoindRpcClient;
use crate::service::{BitcoindService, ServiceSettings};
use crate::utils::currency::CurrencyConverter;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Bitcoin RPC connection overrides
#[derive(Args, Clone, Default)]
pub struct RpcArgs {
    /// Bitcoin RPC URL (overrides config.toml)
    #[arg(long)]
    pub rpc_url: Option<String>,

    /// Bitcoin RPC username (overrides config.toml)
    #[arg(long)]
    pub rpc_username: Option<String>,

    /// Bitcoin RPC password (overrides config.toml)
    #[arg(long)]
    pub rpc_password: Option<String>,

    /// Wallet to address on a multi-wallet node
    #[arg(long)]
    pub rpc_wallet: Option<String>,
}

impl RpcArgs {
    pub fn apply(&self, base: &BitcoinRpcConfig) -> BitcoinRpcConfig {
        let mut rpc_config = base.clone();
        if let Some(url) = &self.rpc_url {
            rpc_config.url = url.clone();
        }
        if let Some(username) = &self.rpc_username {
            rpc_config.username = username.clone();
        }
        if let Some(password) = &self.rpc_password {
            rpc_config.password = password.clone();
        }
        if let Some(wallet) = &self.rpc_wallet {
            rpc_config.wallet = Some(wallet.clone());
        }
        rpc_config
    }
}

/// Build the payment service for a command
pub fn build_service(
    config: &AppConfig,
    rpc: &RpcArgs,
) -> AppResult<BitcoindService<BitcoindRpcClient>> {
    let client = BitcoindRpcClient::new(&rpc.apply(&config.bitcoin_rpc))?;
    let settings = ServiceSettings::from_config(&config.request, &config.send)?;
    Ok(BitcoindService::new(
        Arc::new(client),
        CurrencyConverter::default(),
        settings,
    ))
}

/// Print a command result as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::InvalidData(format!("Failed to render output: {}", e)))?;
    println!("{}", json);
    Ok(())
}
