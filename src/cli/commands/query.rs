use crate::cli::commands::{build_service, print_json, RpcArgs};
use crate::config::AppConfig;
use crate::errors::AppResult;
use crate::types::{Address, Hash};
use clap::Args;
use serde_json::json;
use std::str::FromStr;

/// Fetch a block summary
#[derive(Args)]
pub struct GetBlockCommand {
    /// Block hash (hex)
    pub hash: String,

    #[command(flatten)]
    pub rpc: RpcArgs,
}

impl GetBlockCommand {
    pub async fn run(&self, config: &AppConfig) -> AppResult<()> {
        let service = build_service(config, &self.rpc)?;
        let block = service.get_block(&Hash::from_str(&self.hash)?).await?;
        print_json(&block)
    }
}

/// Fetch a wallet transaction
#[derive(Args)]
pub struct GetTransactionCommand {
    /// Transaction id (hex)
    pub txid: String,

    #[command(flatten)]
    pub rpc: RpcArgs,
}

impl GetTransactionCommand {
    pub async fn run(&self, config: &AppConfig) -> AppResult<()> {
        let service = build_service(config, &self.rpc)?;
        match service.get_transaction(&Hash::from_str(&self.txid)?).await? {
            Some(transaction) => print_json(&transaction),
            None => {
                println!("Transaction {} not found in wallet", self.txid);
                Ok(())
            }
        }
    }
}

/// Confirmed amount received by an address
#[derive(Args)]
pub struct BalanceCommand {
    pub address: String,

    /// Minimum confirmations for a payment to count
    #[arg(long, default_value = "1")]
    pub confirmations: u32,

    #[command(flatten)]
    pub rpc: RpcArgs,
}

impl BalanceCommand {
    pub async fn run(&self, config: &AppConfig) -> AppResult<()> {
        let service = build_service(config, &self.rpc)?;
        let address = Address::from_str(&self.address)?;
        let balance = service
            .get_confirmed_balance(&address, self.confirmations)
            .await?;

        print_json(&json!({
            "address": address,
            "confirmations": self.confirmations,
            "balance": balance.to_string(),
            "balance_msat": balance.msat(),
        }))
    }
}

/// Ask the node whether an address is valid
#[derive(Args)]
pub struct ValidateAddressCommand {
    pub address: String,

    #[command(flatten)]
    pub rpc: RpcArgs,
}

impl ValidateAddressCommand {
    pub async fn run(&self, config: &AppConfig) -> AppResult<()> {
        let service = build_service(config, &self.rpc)?;
        let valid = service
            .validate_address(&Address::from_str(&self.address)?)
            .await?;

        print_json(&json!({ "address": self.address, "isvalid": valid }))
    }
}
