use crate::config::AppConfig;
use crate::errors::AppResult;
use crate::message::{AmqpChannel, BitcoindMessageWorker, ChannelEventPublisher};
use clap::Args;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

/// Consume bitcoind notifications and publish domain events
#[derive(Args)]
pub struct ConsumeCommand {
    /// Queue to consume (overrides config.toml)
    #[arg(long)]
    pub queue: Option<String>,

    /// AMQP URI of the broker (overrides config.toml)
    #[arg(long)]
    pub broker_uri: Option<String>,
}

impl ConsumeCommand {
    pub async fn run(&self, config: &AppConfig) -> AppResult<()> {
        let queue = self.queue.as_deref().unwrap_or(&config.broker.queue);
        let uri = self.broker_uri.as_deref().unwrap_or(&config.broker.uri);

        let publisher = Arc::new(ChannelEventPublisher::new());
        let mut events = publisher.subscribe();

        // Emit published events as JSON lines on stdout
        let printer = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => error!("Failed to render {}: {}", event.name(), e),
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Event printer lagged, {} event(s) skipped", skipped)
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        let channel = AmqpChannel::connect(uri).await?;
        let mut worker = BitcoindMessageWorker::new(
            channel,
            Arc::clone(&publisher),
            &config.broker.consumer_tag,
        );

        let stats = worker
            .run_until(queue, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for ctrl-c: {}", e);
                    std::future::pending::<()>().await;
                }
            })
            .await?;

        drop(worker);
        drop(publisher);
        let _ = printer.await;

        info!(
            "Handled {} message(s): {} published, {} ignored, {} rejected",
            stats.total(),
            stats.published,
            stats.ignored,
            stats.rejected
        );
        Ok(())
    }
}
