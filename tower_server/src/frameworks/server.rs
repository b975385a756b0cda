// Framework bootstrap for the tower server runtime.

use crate::domain::ports::Clock;
use crate::frameworks::config::{self, ServerConfig};
use crate::interface_adapters::routes::app;
use crate::interface_adapters::state::{AppState, InMemoryPlayerStore, SystemClock};
use crate::interface_adapters::utils::rng::PcgRandom;
use crate::use_cases::{TowerHandle, TowerLifecycle};

use std::io::Result;
use std::net::SocketAddr;
use std::sync::Arc;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Serves the tower API on `listener` with defaults plus any `TOWER_CONFIG_PATH` tuning.
pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let server_config = config::load_server_config().map_err(std::io::Error::other)?;
    serve(listener, server_config).await
}

pub async fn serve(listener: tokio::net::TcpListener, server_config: ServerConfig) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(server_config)?;
    let app = app(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state(server_config: ServerConfig) -> Result<AppState> {
    let ServerConfig {
        generation,
        gameplay,
    } = server_config;
    let settings = config::tower_settings(&gameplay);

    let rng = match config::tower_seed() {
        Some(seed) => {
            tracing::info!(seed, "seeding tower generation");
            PcgRandom::seeded(seed)
        }
        None => PcgRandom::from_entropy(),
    };

    let clock = Arc::new(SystemClock);
    // Invalid tuning is fatal; never start with a tower that could not be generated.
    let lifecycle = TowerLifecycle::new(generation, gameplay, rng, clock.now_epoch_seconds())
        .map_err(|e| {
            tracing::error!(error = %e, "invalid tower configuration");
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
        })?;

    let tower = TowerHandle::spawn(
        lifecycle,
        Arc::new(InMemoryPlayerStore::default()),
        clock,
        &settings,
    );

    Ok(AppState { tower })
}
