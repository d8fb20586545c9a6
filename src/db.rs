use std::time::Duration;

use anyhow::{Context, Result};
use diesel::{Connection, PgConnection};
use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{AsyncDieselConnectionManager, bb8::Pool},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};

pub type DbPool = Pool<AsyncPgConnection>;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the connection pool used by the request handlers.
pub async fn connect(database_url: &str) -> Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    Pool::builder()
        .connection_timeout(CONNECTION_TIMEOUT)
        .build(manager)
        .await
        .context("Failed to build the DB connection pool")
}

/// Builds a pool that opens connections on first use.
pub fn connect_lazy(database_url: &str, connection_timeout: Duration) -> DbPool {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    Pool::builder()
        .connection_timeout(connection_timeout)
        .build_unchecked(manager)
}

/// Runs pending migrations on a blocking thread with a synchronous connection.
/// Returns how many migrations were applied.
pub async fn run_migrations_blocking(
    migrations: EmbeddedMigrations,
    database_url: &str,
) -> Result<usize> {
    let database_url = database_url.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&database_url)
            .context("Failed to connect for migrations")?;
        let applied = conn
            .run_pending_migrations(migrations)
            .map_err(|err| anyhow::anyhow!("Failed to run migrations: {err}"))?;
        Ok(applied.len())
    })
    .await
    .context("Migration task panicked")?
}
