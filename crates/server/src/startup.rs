use std::sync::Arc;

use axum::Router;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use service::search::SeaOrmSearchRepository;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::auth::{ServerAuthConfig, ServerState};
use crate::errors::StartupError;
use crate::routes;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

pub fn build_state(db: DatabaseConnection, cfg: &AppConfig) -> ServerState {
    ServerState {
        search: Arc::new(SeaOrmSearchRepository { db: db.clone() }),
        db,
        auth: ServerAuthConfig { jwt_secret: cfg.auth.jwt_secret.clone(), leeway_secs: cfg.auth.leeway_secs },
    }
}

/// Router for a connected, migrated database.
pub fn build_app(db: DatabaseConnection, cfg: &AppConfig) -> Router {
    routes::build_router(build_state(db, cfg), build_cors(), cfg.server.max_upload_bytes)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!(event = "shutdown_signal", "received Ctrl+C, draining connections");
}

/// Public entry: load config, migrate, build the app and run the HTTP server
pub async fn run() -> Result<(), StartupError> {
    dotenv().ok();
    let cfg = AppConfig::load_or_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    common::utils::logging::init_logging(cfg.logging.format);

    let db = models::db::connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await.map_err(anyhow::Error::from)?;
    info!(sqlite = cfg.database.is_sqlite(), "database migrated");

    let app = build_app(db, &cfg);
    let addr = cfg.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(anyhow::Error::from)?;
    info!(%addr, "starting spexregister server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)?;
    info!("server stopped");
    Ok(())
}
