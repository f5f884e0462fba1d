use crate::cli::commands::RpcArgs;
use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::rpc::BitcoindRpcClient;
use clap::Args;
use tracing::{error, info};

/// Test Bitcoin RPC connectivity
#[derive(Args)]
pub struct TestRpcCommand {
    #[command(flatten)]
    pub rpc: RpcArgs,
}

impl TestRpcCommand {
    pub async fn run(&self, config: &AppConfig) -> AppResult<()> {
        info!("=== Testing Bitcoin RPC Connection ===");

        let rpc_config = self.rpc.apply(&config.bitcoin_rpc);
        info!("Testing connection to: {}", rpc_config.url);
        info!("Username: {}", rpc_config.username);

        let client = BitcoindRpcClient::new(&rpc_config)?;
        match client.test_connection().await {
            Ok(()) => {
                println!("Bitcoin RPC connection test PASSED");
                println!("Connection is working correctly!");
                Ok(())
            }
            Err(e) => {
                error!("RPC connection test failed: {}", e);
                println!("Bitcoin RPC connection test FAILED");
                println!("Error: {}", e);
                println!("\nTroubleshooting tips:");
                println!("1. Check that Bitcoin Core is running");
                println!("2. Verify the RPC URL is correct");
                println!("3. Ensure RPC credentials are valid");
                println!("4. Check that RPC server is enabled in bitcoin.conf");

                Err(AppError::Config(format!("RPC test failed: {}", e)))
            }
        }
    }
}
