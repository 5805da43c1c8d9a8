use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use tracing::{debug, info};

use crate::error::AppResult;

const PRAGMAS: &[&str] =
    &["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL", "PRAGMA foreign_keys=ON"];

pub async fn connect_and_migrate(
    database_url: &str,
    max_connections: u32,
) -> AppResult<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_string());
    options.sqlx_logging(false).acquire_timeout(Duration::from_secs(10));

    if is_memory(database_url) {
        // Every pooled connection would open its own private in-memory database.
        options.max_connections(1).min_connections(1);
    } else {
        options.max_connections(max_connections.max(1));
    }

    let db = Database::connect(options).await?;

    for pragma in PRAGMAS {
        debug!(pragma = %pragma, "applying pragma");
        db.execute(Statement::from_string(db.get_database_backend(), pragma.to_string())).await?;
    }

    Migrator::up(&db, None).await?;
    info!("database migrated");

    Ok(db)
}

fn is_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

pub fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}

#[cfg(test)]
pub async fn test_db() -> DatabaseConnection {
    connect_and_migrate("sqlite::memory:", 1).await.expect("in-memory database")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_in_memory_urls() {
        assert!(is_memory("sqlite::memory:"));
        assert!(is_memory("sqlite://file?mode=memory&cache=shared"));
        assert!(!is_memory("sqlite://movies.db?mode=rwc"));
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = test_db().await;
        Migrator::up(&db, None).await.expect("second run is a no-op");
    }
}
