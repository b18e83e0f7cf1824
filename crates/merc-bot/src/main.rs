//! Item trading bot - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Item trading bot: order management console and trade supervisor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via MERC_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    merc_bot::init_logging()?;

    info!("Starting merc-bot v{}", env!("CARGO_PKG_VERSION"));

    let config = match args.config {
        Some(path) => merc_bot::BotConfig::from_file(&path)?,
        None => merc_bot::BotConfig::load()?,
    };
    info!(own_id = config.own_id, "Configuration loaded");

    let app = merc_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
