#[tokio::main]
async fn main() {
    if let Err(e) = bitcoind_adapter::cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
