// src/main.rs
use std::time::Duration;

use dotenvy::dotenv;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use classroom_poll::config::Config;
use classroom_poll::routes::{self, AppState};
use classroom_poll::session::PollSession;
use classroom_poll::timer;

#[tokio::main]
async fn main() {
    dotenv().ok(); // Load environment variables from .env file

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classroom_poll=info,tower_http=info".into()),
        )
        .with_target(true)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(config).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> std::io::Result<()> {
    let addr = config.addr();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        %addr,
        tick_ms = config.tick_interval.as_millis() as u64,
        archive_on_replace = config.session.archive_on_replace,
        "Starting classroom poll server"
    );

    let state = AppState::new(PollSession::new(config.session));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticker = timer::spawn_ticker(state.clone(), config.tick_interval, shutdown_rx);

    let routes = routes::create_routes(state, config.cors_allow_origin.as_deref());

    let handle = axum_server::Handle::new();
    tokio::spawn(shutdown_signal(handle.clone(), shutdown_tx));

    axum_server::bind(addr)
        .handle(handle)
        .serve(routes.into_make_service())
        .await?;

    if let Err(e) = ticker.await {
        error!(error = %e, "Ticker task failed");
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(handle: axum_server::Handle, shutdown_tx: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
    handle.graceful_shutdown(Some(Duration::from_secs(5)));
}
