//! Clone-detection consumer binary
//!
//! Run with: cargo run -p codestream-consumer -- --config consumer.toml

use clap::Parser;
use codestream_consumer::{ConsumerConfig, ConsumerServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "codestream-consumer", version, about = "CodeStream clone-detection consumer")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Emit a summary every N processed files (overrides config and STATS_FREQ)
    #[arg(long)]
    report_frequency: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codestream_consumer=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ConsumerConfig::from_file(path)?,
        None => ConsumerConfig::default(),
    };
    let mut config = config.apply_env()?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(freq) = args.report_frequency {
        config.pipeline.report_frequency = freq;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Report frequency: {}", config.pipeline.report_frequency);
    tracing::info!("  - Chunk size: {} lines", config.detector.chunk_size);
    tracing::info!("  - Report URL: {}", config.server.base_url);
    if let Some(secs) = config.pipeline.stage_timeout_secs {
        tracing::info!("  - Stage timeout: {}s", secs);
    }

    let server = ConsumerServer::new(config)?;

    println!("\nServer starting...");
    println!("  Upload: POST http://{}/", server.address());
    println!("  Clones: http://{}/", server.address());
    println!("  Timers: http://{}/timers", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
