// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::str::FromStr;
use std::time::Duration;

use crate::error::StoreError;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connection_timeout: Duration,
    pub run_migrations: bool,
}

impl StoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            run_migrations: true,
        }
    }

    /// Reads the configuration from the process environment, after loading a
    /// `.env` file if one is present.
    pub fn from_env() -> Result<Self, StoreError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Failed to load .env file: {e}");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| StoreError::Config("DATABASE_URL must be set".to_string()))?;
        let mut config = Self::new(database_url);

        if let Some(max_connections) = parse::<u32>(&lookup, "STORE_MAX_CONNECTIONS")? {
            if max_connections == 0 {
                return Err(StoreError::Config(
                    "STORE_MAX_CONNECTIONS must be at least 1".to_string(),
                ));
            }
            config.max_connections = max_connections;
        }
        if let Some(secs) = parse::<u64>(&lookup, "STORE_CONNECTION_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(StoreError::Config(
                    "STORE_CONNECTION_TIMEOUT_SECS must be at least 1".to_string(),
                ));
            }
            config.connection_timeout = Duration::from_secs(secs);
        }
        if let Some(run_migrations) = parse::<bool>(&lookup, "STORE_RUN_MIGRATIONS")? {
            config.run_migrations = run_migrations;
        }
        Ok(config)
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, StoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|e| StoreError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}
