use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use taskpool_core::app::{Server, TaskRegistry};
use taskpool_core::config::{DEFAULT_LISTEN_ADDR, ServerConfig};
use taskpool_core::domain::Partition;

#[derive(Parser, Debug)]
#[command(name = "taskpool")]
#[command(version)]
#[command(about = "Hands out tasks from four CSV-backed pools to TCP clients")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value_t = DEFAULT_LISTEN_ADDR)]
    listen: SocketAddr,

    /// Directory holding Servico_A.csv .. Servico_D.csv
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Override the table for partition A (ids 1-5)
    #[arg(long)]
    partition_a: Option<PathBuf>,

    /// Override the table for partition B (ids 6-10)
    #[arg(long)]
    partition_b: Option<PathBuf>,

    /// Override the table for partition C (ids 11-15)
    #[arg(long)]
    partition_c: Option<PathBuf>,

    /// Override the table for partition D (ids 16-20)
    #[arg(long)]
    partition_d: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let overrides = [
            (Partition::A, self.partition_a),
            (Partition::B, self.partition_b),
            (Partition::C, self.partition_c),
            (Partition::D, self.partition_d),
        ];
        overrides
            .into_iter()
            .fold(ServerConfig::new(self.listen, &self.data_dir), |config, (partition, path)| {
                match path {
                    Some(path) => config.with_partition_path(partition, path),
                    None => config,
                }
            })
    }
}

async fn log_counts(registry: &TaskRegistry) {
    for (partition, c) in registry.counts().await {
        tracing::info!(
            partition = %partition,
            unassigned = c.unassigned,
            in_progress = c.in_progress,
            completed = c.completed,
            unsynced = c.unsynced,
            "partition status"
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config();
    for (partition, path) in &config.partitions {
        tracing::info!(partition = %partition, path = %path.display(), "partition table");
    }

    let registry = Arc::new(TaskRegistry::open(&config).await?);
    log_counts(&registry).await;

    let server = Server::bind(config.listen_addr, Arc::clone(&registry)).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let accept = tokio::spawn(server.run(shutdown_rx));

    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "cannot listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }

    tracing::info!("shutdown requested");
    if let Err(err) = shutdown_tx.send(true) {
        tracing::debug!(error = %err, "accept loop already gone");
    }
    accept.await?;

    log_counts(&registry).await;
    Ok(())
}
