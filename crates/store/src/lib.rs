// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

pub mod avatar;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod store;
pub mod validation;
pub mod views;

pub use config::StoreConfig;
pub use db::models;
pub use error::{ConstraintViolation, Entity, StoreError, ValidationError};
pub use store::Store;
