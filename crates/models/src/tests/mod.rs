/// Entity CRUD, relations and cascades
pub mod crud_tests;

/// Audit stamping and event log hooks
pub mod audit_tests;

use anyhow::Result;
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Fresh migrated database; in-memory SQLite unless `TEST_DATABASE_URL` is set.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let url = std::env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let mut opt = ConnectOptions::new(url);
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await?;
    migration::Migrator::fresh(&db).await?;
    Ok(db)
}
