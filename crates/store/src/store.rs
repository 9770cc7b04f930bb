// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::config::StoreConfig;
use crate::db::{self, Pool, PooledConnection};
use crate::error::StoreError;

mod announcements;
mod audits;
mod avatars;
mod flags;
pub mod list;
mod tasks;
mod teams;

pub use audits::AuditFilter;
pub use flags::TaskFlagFilter;
pub use list::{ListOptions, SortKey, SortOrder};
pub use tasks::TaskFilter;
pub use teams::TeamFilter;

/// Handle to the persisted competition records.
///
/// Opened once at process start and passed by reference to every operation.
/// Writes run inside a database transaction; uniqueness and references are
/// enforced by named constraints in the schema, so concurrent callers cannot
/// both commit a duplicate.
#[derive(Clone)]
pub struct Store {
    pool: Pool,
}

impl Store {
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        if config.run_migrations {
            db::migrate(&config.database_url).await?;
        }
        let pool = db::build_pool(config).await?;
        tracing::info!(
            "Record store opened with up to {} connections",
            config.max_connections
        );
        Ok(Self { pool })
    }

    /// Wraps an existing pool, e.g. one shared with another service.
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn close(self) {
        let state = self.pool.state();
        tracing::info!(
            "Closing record store ({} connections, {} idle)",
            state.connections,
            state.idle_connections
        );
        drop(self.pool);
    }

    pub(crate) async fn conn(&self) -> Result<PooledConnection<'_>, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))
    }
}
