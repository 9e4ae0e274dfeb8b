use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use runway_api::{app, AppState, ServiceSettings};
use runway_core::{Clock, Notifier, Repositories, SystemClock};
use runway_store::{BroadcastNotifier, Config, DbClient, MemoryStore, StorageBackend};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const NOTIFICATION_BUFFER: usize = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "runway_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Runway API on port {}", config.server.port);

    let repos: Repositories = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = DbClient::new(&config.database.url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            db.repositories()
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Arc::new(MemoryStore::new()).repositories()
        }
    };

    let notifier = BroadcastNotifier::new(NOTIFICATION_BUFFER);
    let mut notifications = notifier.subscribe();
    tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(notification) => tracing::debug!(
                    "Ticket {} issued to user {}",
                    notification.ticket_id,
                    notification.user_id
                ),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Notification log skipped {} entries", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notifier: Arc<dyn Notifier> = Arc::new(notifier);
    let state = AppState::build(repos, notifier, clock, &ServiceSettings::from(&config))
        .context("Failed to build services")?;

    let app = app(state, config.cors.allowed_origin.as_deref());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
