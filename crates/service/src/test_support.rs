#![cfg(test)]
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::permission::Role;

pub const ALL_ROLES: &[Role] = &Role::ALL;

/// A freshly migrated database for one test.
/// In-memory SQLite by default; `TEST_DATABASE_URL` points elsewhere.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let url = std::env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let mut opt = ConnectOptions::new(url);
    // one connection keeps an in-memory database alive and shared
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await?;
    migration::Migrator::fresh(&db).await?;
    Ok(db)
}
