use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use engagement_service::config::{DatabaseConfig, StoreBackend};
use engagement_service::handlers;
use engagement_service::metrics;
use engagement_service::repository::{
    EdgeStore, EntityStore, InMemoryEdgeStore, InMemoryEntityStore, PgEdgeStore, PgEntityStore,
    MIGRATOR,
};
use engagement_service::{AppState, Config};

async fn connect_postgres(database: &DatabaseConfig) -> Result<sqlx::PgPool> {
    let connect_options = PgConnectOptions::from_str(&database.url)
        .context("Failed to parse DATABASE_URL")?
        .statement_cache_capacity(0); // PgBouncer transaction mode

    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .min_connections(database.min_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(connect_options)
        .await
        .context("Failed to connect to database")?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("Failed to verify database connection")?;
    info!("Database pool created and verified");

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    Ok(pool)
}

async fn build_state(config: &Config) -> Result<AppState> {
    let (entities, edges): (Arc<dyn EntityStore>, Arc<dyn EdgeStore>) = match config.store {
        StoreBackend::Postgres => {
            let database = config
                .database
                .as_ref()
                .context("postgres backend requires database configuration")?;
            let pool = connect_postgres(database).await?;
            (
                Arc::new(PgEntityStore::new(pool.clone())),
                Arc::new(PgEdgeStore::new(pool)),
            )
        }
        StoreBackend::Memory => {
            let entities = InMemoryEntityStore::new();
            if let Some(path) = &config.seed_file {
                entities.load_seed(path).await?;
            }
            tracing::warn!("Using in-memory stores; data is lost on restart");
            (Arc::new(entities), Arc::new(InMemoryEdgeStore::new()))
        }
    };

    Ok(AppState::new(entities, edges))
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        env = %config.app.env,
        store = ?config.store,
        admin_enabled = config.app.admin_enabled,
        "Starting engagement-service"
    );

    let state = web::Data::new(build_state(&config).await?);
    let admin_enabled = config.app.admin_enabled;
    let http_addr = format!("{}:{}", config.app.host, config.app.http_port);

    info!("HTTP server listening on http://{}", http_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/health", web::get().to(handlers::health::health))
            .route("/ready", web::get().to(handlers::health::ready))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(|cfg| handlers::configure(cfg, admin_enabled))
    })
    .bind(&http_addr)
    .with_context(|| format!("Failed to bind {}", http_addr))?
    .run()
    .await
    .context("HTTP server failed")?;

    info!("engagement-service stopped");
    Ok(())
}
