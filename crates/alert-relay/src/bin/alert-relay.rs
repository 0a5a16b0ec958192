//! Alert relay service binary.

use anyhow::{Context, Result};
use clap::Parser;
use notify::{MessageChannel, TelegramChannel};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use alert_relay::diagnostics::ProcessRunner;
use alert_relay::server::{self, AppState};
use alert_relay::{store, Config, DeletionScheduler, Dispatcher};

/// Relay monitoring alerts to Telegram.
#[derive(Parser)]
#[command(name = "alert-relay")]
#[command(about = "Relay monitoring alert webhooks to a Telegram chat")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, env = "RELAY_LOG_JSON")]
    log_json: bool,

    #[command(flatten)]
    config: Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json)?;

    let config = cli.config;
    info!(
        delay_secs = config.delay_secs,
        store = %config.store_path.display(),
        "Starting alert relay"
    );

    let store = store::open_store(&config.store_path, config.require_store)
        .context("Failed to open correlation store")?;

    let channel: Arc<dyn MessageChannel> = Arc::new(
        TelegramChannel::with_api_base(&config.telegram_api_url, &config.bot_token, &config.chat_id)
            .context("Failed to configure Telegram channel")?,
    );
    info!(channel = channel.name(), "Chat channel configured");

    let (scheduler, _scheduler_task) =
        DeletionScheduler::spawn(Arc::clone(&channel), Arc::clone(&store));

    // Timers from a previous run are re-armed while the listener comes up.
    let rearm = scheduler.clone();
    tokio::spawn(async move {
        if let Err(e) = rearm.rearm_pending() {
            error!(error = %e, "Failed to re-arm pending deletions");
        }
    });

    let dispatcher = Dispatcher::new(
        channel,
        store,
        scheduler,
        Arc::new(ProcessRunner::new(config.diagnostic_timeout())),
        config.deletion_delay(),
    );

    let app = server::build_router(AppState {
        dispatcher: Arc::new(dispatcher),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port = config.port, "Alert relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Alert relay stopped");
    Ok(())
}

fn init_tracing(verbose: bool, json: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "alert_relay={default_level},notify={default_level},tower_http=info"
        ))
    })?;

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
