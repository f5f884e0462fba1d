use crate::config::AppConfig;
use crate::errors::AppResult;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod commands;

/// Bitcoin Core adapter for payment services
#[derive(Parser)]
#[command(name = "bitcoind-adapter")]
#[command(about = "Bridge bitcoind notifications and wallet RPC into domain events and payments")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Consume bitcoind notifications and publish domain events
    Consume(commands::consume::ConsumeCommand),
    /// Test Bitcoin RPC connectivity
    TestRpc(commands::test_rpc::TestRpcCommand),
    /// Request a payment: get a fresh receive address
    NewAddress(commands::wallet::NewAddressCommand),
    /// Estimate the fee for paying an address
    EstimateFee(commands::wallet::EstimateFeeCommand),
    /// Fund, sign and broadcast a payment
    Send(commands::wallet::SendCommand),
    /// Fetch a block summary
    GetBlock(commands::query::GetBlockCommand),
    /// Fetch a wallet transaction
    GetTransaction(commands::query::GetTransactionCommand),
    /// Confirmed amount received by an address
    Balance(commands::query::BalanceCommand),
    /// Ask the node whether an address is valid
    ValidateAddress(commands::query::ValidateAddressCommand),
}

pub async fn run() -> AppResult<()> {
    // Uses RUST_LOG environment variable (defaults to "info" if not set)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Consume(command) => command.run(&config).await,
        Commands::TestRpc(command) => command.run(&config).await,
        Commands::NewAddress(command) => command.run(&config).await,
        Commands::EstimateFee(command) => command.run(&config).await,
        Commands::Send(command) => command.run(&config).await,
        Commands::GetBlock(command) => command.run(&config).await,
        Commands::GetTransaction(command) => command.run(&config).await,
        Commands::Balance(command) => command.run(&config).await,
        Commands::ValidateAddress(command) => command.run(&config).await,
    }
}

fn load_config(path: Option<&Path>) -> AppResult<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
}
