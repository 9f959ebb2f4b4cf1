//! Warden Daemon - firewall proxy for agent LLM traffic

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use warden::config::Config;
use warden::error::Result;
use warden::notify::{NoopNotifier, Notifier, WebhookNotifier};
use warden::proxy::{ProxyServer, build_client};
use warden::storage::MemoryKvStore;
use warden::vault::EnvVault;

/// Warden - Firewall proxy between your agents and their LLM providers
#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "A firewall proxy that guards agent traffic to LLM providers")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the proxy server (default command)
    #[command(name = "serve")]
    Serve,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => serve(cli.config).await,
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,warden=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn read_config(path: &Path) -> Result<Config> {
    tracing::info!("Loading config from: {}", path.display());
    Config::from_file(path)
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    if let Some(path) = config_path {
        return read_config(&path);
    }

    let default_paths = [
        dirs::home_dir().map(|h| h.join(".warden").join("config.toml")),
        dirs::config_dir().map(|c| c.join("warden").join("config.toml")),
        Some(PathBuf::from("config.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            return read_config(path);
        }
    }

    tracing::info!("No config file found, using defaults");
    Ok(Config::default())
}

async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    tracing::info!("Starting Warden daemon");

    let config = load_config(config_path)?;
    tracing::debug!(
        routes = config.routes.len(),
        retention_days = config.audit.retention_days,
        "Config loaded"
    );

    let notifier: Arc<dyn Notifier> = match &config.alerts.webhook_url {
        Some(url) => {
            tracing::info!("Alerts will be posted to the configured webhook");
            let client = build_client(config.proxy.timeout_secs)?;
            Arc::new(WebhookNotifier::new(client, url.clone()))
        }
        None => {
            tracing::info!("No alert webhook configured, alerts are only logged");
            Arc::new(NoopNotifier)
        }
    };

    // Single-process store; counters and audit records live for the process lifetime
    let store = Arc::new(MemoryKvStore::new());
    let vault = Arc::new(EnvVault::new());

    let proxy = ProxyServer::new(config, store, vault, notifier);
    proxy.serve().await?;

    tracing::info!("Warden daemon stopped");
    Ok(())
}
