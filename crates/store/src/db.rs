// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::error::Error;

use diesel::{Connection, pg::PgConnection};
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::config::StoreConfig;
use crate::error::StoreError;

pub mod models;
pub mod schema;

pub type Pool = diesel_async::pooled_connection::bb8::Pool<AsyncPgConnection>;
pub type PooledConnection<'a> =
    diesel_async::pooled_connection::bb8::PooledConnection<'a, AsyncPgConnection>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn run_migrations(
    connection: &mut impl MigrationHarness<diesel::pg::Pg>,
) -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    let applied = connection.run_pending_migrations(MIGRATIONS)?;
    for version in applied {
        tracing::info!("Applied migration {version}");
    }

    Ok(())
}

/// Migrations run over a blocking connection, so keep them off the async
/// worker threads.
pub async fn migrate(database_url: &str) -> Result<(), StoreError> {
    let database_url = database_url.to_string();
    tokio::task::spawn_blocking(move || {
        let mut connection = PgConnection::establish(&database_url)
            .map_err(|e| StoreError::Migration(format!("Failed to connect: {e}")))?;
        run_migrations(&mut connection).map_err(|e| StoreError::Migration(e.to_string()))
    })
    .await
    .map_err(|e| StoreError::Migration(format!("Migration task failed: {e}")))?
}

pub async fn build_pool(config: &StoreConfig) -> Result<Pool, StoreError> {
    if config.max_connections == 0 || config.connection_timeout.is_zero() {
        return Err(StoreError::Config(
            "pool size and connection timeout must be non-zero".to_string(),
        ));
    }
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);
    Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(config.connection_timeout)
        .build(manager)
        .await
        .map_err(|e| StoreError::Pool(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_build_pool_rejects_zero_timeout() {
        let mut config = StoreConfig::new("postgres://localhost/unused");
        config.connection_timeout = Duration::ZERO;
        let err = build_pool(&config).await.unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }
}
