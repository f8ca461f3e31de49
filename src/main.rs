use models::{CliApp, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod campaign;
mod cli;
mod config;
mod csvio;
mod history;
mod ingest;
mod ledger;
mod models;
mod resolver;
mod selection;

use config::{load_config, Config};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = match load_config("config.yml").await {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config.yml: {}. Using defaults.", e);
            Config::default()
        }
    };

    std::env::set_var("RUST_LOG", format!("mailtray={}", config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("mailtray=info".parse().unwrap()),
        )
        .with_max_level(tracing::Level::INFO)
        .init();

    tokio::fs::create_dir_all(&config.output.directory).await?;
    tokio::fs::create_dir_all(&config.ledger.directory).await?;

    info!("Ledger tracker: {:?}", config.ledger.tracker_path());
    let app = CliApp::new(config).await?;

    tokio::select! {
        result = app.run() => {
            result?;
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
