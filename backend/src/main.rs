//! Lumber Inventory Platform - Backend Server

use std::{net::SocketAddr, sync::Arc};

use lumber_inventory::{
    config::{Config, StoreBackend},
    create_app, notifications,
    services::CatalogService,
    store::{MemoryStore, PgStore, Store},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "lumber_server=debug,lumber_inventory=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Lumber Inventory Server");
    tracing::info!("Environment: {}", config.environment);

    let store: Arc<dyn Store> = match config.database.backend {
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            Arc::new(PgStore::connect(&config.database).await?)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; nothing will survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    // Reference locations must exist before anything can be stocked
    CatalogService::new(store.clone()).seed_locations().await?;

    let notifier = notifications::from_config(&config.notifications)?;

    // Create application state
    let state = AppState {
        store,
        notifier,
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
