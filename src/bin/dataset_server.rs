//! dataset_server: REST server for analytics dataset configurations.
//!
//! Configuration is read from the environment (and `.env` when present);
//! see `dataset_service::config` for the variables.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use dataset_service::api::{build_router, AppState, JwtAuthenticator};
use dataset_service::cache::AggregateCache;
use dataset_service::config::AppConfig;
use dataset_service::database::{mask_database_url, DatabaseManager, PgUnitOfWork};
use dataset_service::seed::{DataLoader, JsonSeedLoader};
use dataset_service::services::DataBootstrapper;
use dataset_service::statement::TemplateStatementGenerator;
use dataset_service::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;
    telemetry::init(config.log_format)?;

    info!(
        database = %mask_database_url(&config.database.database_url),
        bind_addr = %config.bind_addr,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        "Starting dataset_server"
    );

    let db = DatabaseManager::new(&config.database)
        .await
        .context("failed to connect to database")?;

    if config.run_migrations {
        db.run_migrations().await.context("migrations failed")?;
    } else {
        warn!("RUN_MIGRATIONS=false, skipping schema migrations");
    }

    let cache = Arc::new(AggregateCache::new(config.cache_ttl));
    let uow = Arc::new(PgUnitOfWork::new(db.pool().clone(), cache));

    if let Some(path) = &config.seed_data_json {
        let loader: Arc<dyn DataLoader> = Arc::new(JsonSeedLoader::new(path));
        let report = DataBootstrapper::new(Arc::clone(&uow), vec![loader])
            .run()
            .await
            .context("seed data import failed")?;
        for (table, rows) in &report.inserted {
            info!(table, rows, "Seeded table");
        }
    }

    let state = Arc::new(AppState::new(
        uow,
        Arc::new(TemplateStatementGenerator::new()),
        Arc::new(JwtAuthenticator::from_secret(config.jwt_secret.as_bytes())),
    ));
    let app = build_router(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    info!("dataset_server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
