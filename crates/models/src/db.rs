use std::time::Duration;

use configs::DatabaseConfig;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::info;

/// Connect with pool settings from configuration.
/// SQLite gets a single connection so in-memory databases stay one database.
pub async fn connect_with_config(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new(cfg.url.clone());
    if cfg.is_sqlite() {
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(cfg.max_connections)
            .min_connections(cfg.min_connections)
            .idle_timeout(Duration::from_secs(cfg.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(cfg.max_lifetime_secs));
    }
    opt.connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .sqlx_logging(cfg.sqlx_logging);
    let db = Database::connect(opt).await?;
    info!(backend = ?db.get_database_backend(), max_connections = cfg.max_connections, "database_connected");
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbBackend;

    #[tokio::test]
    async fn sqlite_memory_connects_as_one_database() -> anyhow::Result<()> {
        let cfg = DatabaseConfig {
            url: "sqlite::memory:".into(),
            max_connections: 4,
            connect_timeout_secs: 5,
            acquire_timeout_secs: 5,
            ..Default::default()
        };
        let db = connect_with_config(&cfg).await?;
        assert_eq!(db.get_database_backend(), DbBackend::Sqlite);
        db.execute_unprepared("CREATE TABLE scratch (id INTEGER)").await?;
        db.execute_unprepared("INSERT INTO scratch VALUES (1)").await?;
        Ok(())
    }
}
