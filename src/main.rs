use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use diveboard::{config::make_app, settings::Settings};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scoring and live results for diving competitions.
#[derive(Parser, Debug)]
#[command(name = "diveboard", version)]
struct Args {
    /// TOML file with the server settings. Environment variables take
    /// precedence over anything in it.
    #[arg(short, long, env = "DIVEBOARD_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diveboard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())
        .context("failed to load settings")?;

    if settings.is_in_memory() {
        info!("using an in-memory database, nothing will be kept on exit");
    }

    let bind_address = settings.bind_address;
    let app = make_app(settings).await?;

    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("failed to bind to {bind_address}"))?;

    info!("listening on http://{bind_address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
