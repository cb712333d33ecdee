//! mptag-bot - MP3 Tag Editor Bot
//!
//! Telegram bot that lets a user upload an MP3, edit its ID3 tags through
//! inline-keyboard prompts, and download the edited file back. Also serves
//! a small health endpoint and an optional keep-alive ping loop for
//! sleepy hosting tiers.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mptag_bot::controller::Controller;
use mptag_bot::dispatcher::{self, Dispatcher};
use mptag_bot::health::{health_routes, HealthState};
use mptag_bot::session::SessionStore;
use mptag_bot::tags::Id3TagStore;
use mptag_bot::telegram::BotClient;
use mptag_bot::keep_alive;
use mptag_common::config::{load_toml_config, BotConfig};

/// Command-line arguments for mptag-bot
#[derive(Parser, Debug)]
#[command(name = "mptag-bot")]
#[command(about = "Telegram bot for editing MP3 ID3 tags")]
#[command(version)]
struct Args {
    /// Telegram bot token (from @BotFather)
    #[arg(long, env = "MPTAG_BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// URL pinged every 10 minutes to keep a hosting instance awake
    #[arg(long, env = "MPTAG_KEEP_ALIVE_URL")]
    keep_alive_url: Option<String>,

    /// Port for the health endpoint
    #[arg(short, long, env = "MPTAG_PORT")]
    port: Option<u16>,

    /// Directory for temporary audio/cover files
    #[arg(long, env = "MPTAG_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Optional TOML config file
    #[arg(short, long, env = "MPTAG_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mptag_bot=debug,mptag_common=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref())
        .context("Failed to load config file")?;
    let config = BotConfig::resolve(
        args.token,
        args.keep_alive_url,
        args.port,
        args.work_dir,
        toml_config,
    )
    .context("Configuration error")?;

    info!("Starting mptag-bot");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Work dir: {}", config.work_dir.display());

    tokio::fs::create_dir_all(&config.work_dir)
        .await
        .context("Failed to create work directory")?;

    let client = Arc::new(BotClient::new(&config.bot_token).context("Failed to build bot client")?);
    let controller = Arc::new(Controller::new(
        client.clone(),
        Arc::new(Id3TagStore::new()),
        SessionStore::new(),
        config.work_dir.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(controller));

    // Health endpoint for monitoring and the keep-alive ping target
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind health endpoint")?;
    info!("Health endpoint on http://{}/health", addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_routes(HealthState::new())).await {
            tracing::error!("Health server exited: {}", e);
        }
    });

    if let Some(url) = config.keep_alive_url.clone() {
        keep_alive::spawn(url);
    } else {
        info!("Keep-alive disabled (no URL configured)");
    }

    tokio::select! {
        _ = dispatcher::run_polling(client, dispatcher) => {}
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
