use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use umrah_api::{app, AppState};
use umrah_catalog::{CatalogPaths, StaticCatalog};
use umrah_core::{BookingRepository, PackageRepository};
use umrah_order::MockPaymentGateway;
use umrah_store::{app_config::Config, DbClient, MemoryStore, PgBookingRepository, PgPackageRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "umrah_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Umrah API on port {}", config.server.port);

    let catalog = StaticCatalog::load(&CatalogPaths {
        flights_path: config.catalog.flights_path.clone(),
        hotels_path: config.catalog.hotels_path.clone(),
        rails_path: config.catalog.rails_path.clone(),
    })
    .context("Failed to load reference data")?;

    let (packages, bookings): (Arc<dyn PackageRepository>, Arc<dyn BookingRepository>) =
        match &config.database.url {
            Some(url) => {
                let db = DbClient::new(url.expose(), config.database.max_connections)
                    .await
                    .context("Failed to connect to Postgres")?;
                db.migrate().await.context("Failed to run migrations")?;
                (
                    Arc::new(PgPackageRepository::new(db.pool.clone())),
                    Arc::new(PgBookingRepository::new(db.pool)),
                )
            }
            None => {
                tracing::warn!("No database.url configured; packages and bookings are kept in memory");
                let store = Arc::new(MemoryStore::new());
                (store.clone(), store)
            }
        };

    let state = AppState::new(
        &config,
        Arc::new(catalog),
        packages,
        bookings,
        Arc::new(MockPaymentGateway),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}
