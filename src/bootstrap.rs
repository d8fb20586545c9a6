use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use diesel_async::RunQueryDsl;
use tokio::sync::mpsc::UnboundedReceiver;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api::storage::PUBLIC_PREFIX,
    app_state::AppState,
    consumers::notifications::{self, Notifier},
    events::OrderEvent,
};

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rasdesh_storeservice=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Loads a `.env` file if there is one.
pub fn init_env() {
    dotenvy::dotenv().ok();
}

/// Starts the notification consumer and serves `app` until Ctrl+C / SIGTERM.
pub async fn bootstrap(
    service_name: &str,
    app: Router<AppState>,
    state: AppState,
    notifier: Arc<Notifier>,
    events: UnboundedReceiver<OrderEvent>,
) -> Result<()> {
    let consumer = tokio::spawn(notifications::run(events, notifier));

    let addr = state.config.server.socket_addr();
    let app = app
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest_service(PUBLIC_PREFIX, ServeDir::new(state.storage.root()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!("{} listening on {}", service_name, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Dropping the router drops the last publisher; the consumer then sends
    // whatever is queued and waits for sends already in flight.
    if let Err(err) = consumer.await {
        tracing::error!("Notification consumer crashed: {}", err);
    }
    tracing::info!("{} stopped", service_name);
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

/// Returns 503 while the database is unreachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Ok(mut conn) = state.db_pool.get().await else {
        return StatusCode::SERVICE_UNAVAILABLE;
    };
    match diesel::sql_query("SELECT 1").execute(&mut *conn).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
