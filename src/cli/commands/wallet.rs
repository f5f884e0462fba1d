use crate::cli::commands::{build_service, print_json, RpcArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::types::{Address, BitcoinTransaction, Output};
use crate::utils::currency::{Currency, CurrencyConverter, Money};
use clap::Args;
use serde_json::json;
use std::str::FromStr;
use tracing::info;

/// Request a payment: get a fresh receive address
#[derive(Args)]
pub struct NewAddressCommand {
    /// Amount to request, e.g. 0.001BTC or 1500SAT
    #[arg(long)]
    pub amount: String,

    /// Wallet label attached to the new address
    #[arg(long, default_value = "")]
    pub label: String,

    #[command(flatten)]
    pub rpc: RpcArgs,
}

impl NewAddressCommand {
    pub async fn run(&self, config: &AppConfig) -> AppResult<()> {
        let service = build_service(config, &self.rpc)?;
        let transaction = BitcoinTransaction::new(self.label.clone(), parse_money(&self.amount)?);

        let requested = service.request(transaction).await?;
        print_json(&requested)
    }
}

/// Payment target shared by `estimate-fee` and `send`
#[derive(Args)]
pub struct PaymentArgs {
    /// Destination address
    #[arg(long)]
    pub address: String,

    /// Amount to pay, e.g. 0.001BTC or 1500SAT
    #[arg(long)]
    pub amount: String,

    /// Fee rate per kvB, e.g. 0.0002BTC (node decides when omitted)
    #[arg(long)]
    pub fee_rate: Option<String>,

    /// Wallet label for the payment
    #[arg(long, default_value = "")]
    pub label: String,
}

impl PaymentArgs {
    fn transaction(&self) -> AppResult<BitcoinTransaction> {
        let address = Address::from_str(&self.address)?;
        let amount = parse_money(&self.amount)?;
        let mut transaction = BitcoinTransaction::new(self.label.clone(), amount)
            .with_output(Output::new(address, amount));
        if let Some(rate) = &self.fee_rate {
            transaction = transaction.with_fee_rate(parse_money(rate)?);
        }
        Ok(transaction)
    }
}

/// Estimate the fee for paying an address
#[derive(Args)]
pub struct EstimateFeeCommand {
    #[command(flatten)]
    pub payment: PaymentArgs,

    #[command(flatten)]
    pub rpc: RpcArgs,
}

impl EstimateFeeCommand {
    pub async fn run(&self, config: &AppConfig) -> AppResult<()> {
        let service = build_service(config, &self.rpc)?;
        let fee = service.estimate_fee(&self.payment.transaction()?).await?;

        let fee_btc = CurrencyConverter::default().convert(fee, Currency::Btc);
        print_json(&json!({
            "address": self.payment.address,
            "amount": self.payment.amount,
            "fee": fee_btc.to_string(),
            "fee_msat": fee.msat(),
        }))
    }
}

/// Fund, sign and broadcast a payment
#[derive(Args)]
pub struct SendCommand {
    #[command(flatten)]
    pub payment: PaymentArgs,

    #[command(flatten)]
    pub rpc: RpcArgs,
}

impl SendCommand {
    pub async fn run(&self, config: &AppConfig) -> AppResult<()> {
        let service = build_service(config, &self.rpc)?;
        let sent = service.send(self.payment.transaction()?).await?;

        if let Some(id) = sent.id() {
            info!("Payment broadcast as {}", id);
        }
        print_json(&sent)
    }
}

fn parse_money(value: &str) -> AppResult<Money> {
    CurrencyConverter::default()
        .parse(value)
        .map_err(|e| AppError::InvalidData(format!("'{}': {}", value, e)))
}
