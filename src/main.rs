//! hoaweb main entry point

use anyhow::Context;
use clap::Parser;
use hoaweb_api::{start_server, AppState};
use hoaweb_config::Config;
use hoaweb_core::{Dashboard, FileHandoffStore, HandoffRef};
use hoaweb_loader::{JsonDatasetLoader, LoaderRef};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "hoaweb")]
#[command(version = "0.1.0")]
#[command(about = "Homeowner-association financial dashboard", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = if args.config.exists() {
        Config::load(args.config.clone())
            .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?
    } else {
        Config::default()
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.logging.level)).init();
    if !args.config.exists() {
        log::warn!("Config file {} not found, using defaults", args.config.display());
    }
    log::info!(
        "Config loaded: data path={}, dataset={}",
        config.data.path.display(),
        config.data.dataset_file
    );

    let loader: LoaderRef = Arc::new(JsonDatasetLoader);
    let handoff: HandoffRef = Arc::new(FileHandoffStore::open(config.handoff_path()));

    let dashboard = Dashboard::load(config, loader.clone(), handoff)
        .await
        .context("Failed to load financial data")?;

    start_server(AppState::new(dashboard, loader))
        .await
        .context("Server error")?;

    Ok(())
}
