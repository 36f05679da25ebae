mod config;

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use dreams_api::auth::{AppState, AppStateInner};
use dreams_api::routes::router;
use dreams_types::events::DreamsEvent;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dreams=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Shared state
    let db = Arc::new(dreams_db::Database::open());
    let state = AppStateInner::new(db, &config.jwt_secret, config.token_ttl);
    tokio::spawn(log_events(state.clone()));

    let app = router(state.clone())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Dreams server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let cancelled = state.engine.scheduler().cancel_all()?;
    info!("Shut down with {} pending deferred tasks dropped", cancelled);
    Ok(())
}

/// Engine events have no other consumer in this binary; failed deferred
/// deliveries would otherwise go unseen.
async fn log_events(state: AppState) {
    let mut rx = state.engine.subscribe();
    loop {
        match rx.recv().await {
            Ok(DreamsEvent::DeliveryFailed {
                message_id,
                conversation,
                reason,
            }) => {
                warn!(
                    "Dead letter: message {:?} for {} was not delivered: {}",
                    message_id, conversation, reason
                );
            }
            Ok(event) => debug!("Event: {:?}", event),
            Err(RecvError::Lagged(n)) => warn!("Event logger lagged by {} events", n),
            Err(RecvError::Closed) => break,
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
