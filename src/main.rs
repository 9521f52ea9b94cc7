//! Pomodoro bot - shared pomodoro sessions for chat channels
//!
//! Each joined channel runs its own session actor driven by a pure state
//! machine; registrations are logged to SQLite and exported over HTTP.

mod api;
mod commands;
mod config;
mod console;
mod db;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use commands::CommandRouter;
use config::BotConfig;
use console::ConsoleNotices;
use db::Database;
use runtime::{DatabaseWorkLog, NoticeSink, SessionRegistry, WorkLog};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pomodoro_bot=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = Arc::new(BotConfig::from_env());
    commands::validate_tables()?;

    // Initialize database
    tracing::info!(path = %config.db_path.display(), "Opening work log database");
    let db = Database::open(&config.db_path)?;

    // Session registry with console transport
    let notices: Arc<dyn NoticeSink> = Arc::new(ConsoleNotices::new(tokio::io::stdout()));
    let work_log: Arc<dyn WorkLog> = Arc::new(DatabaseWorkLog::new(db.clone()));
    let registry = Arc::new(SessionRegistry::new(
        notices.clone(),
        work_log,
        config.registration_delay,
    ));

    for channel in &config.channels {
        if commands::control::is_channel(channel) {
            registry.join(channel).await;
        } else {
            tracing::warn!(channel = %channel, "Skipping configured channel with invalid name");
        }
    }

    let shutdown = CancellationToken::new();

    // Work log export server
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = create_router(AppState::new(db)).layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Work log export listening on {}", addr);

    let server_shutdown = shutdown.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
            .await
    });

    // Ctrl-C stops everything
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received interrupt, shutting down");
        }
        signal_shutdown.cancel();
    });

    tracing::info!(
        nick = %config.nick,
        controller = %config.controller,
        channels = ?registry.channels().await,
        "Pomodoro bot ready"
    );

    let router = CommandRouter::new(registry.clone(), notices, config.clone());
    let input = BufReader::new(tokio::io::stdin());
    if let Err(e) = console::run(input, &router, shutdown.clone()).await {
        tracing::error!(error = %e, "Console input failed");
    }

    // Sessions keep running on their timers after input closes
    shutdown.cancelled().await;
    registry.shutdown().await;
    server.await??;

    Ok(())
}
