// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt;

use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// The record kinds held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Team,
    Task,
    TaskFlag,
    Audit,
    Announcement,
    TeamAvatar,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Team => "team",
            Entity::Task => "task",
            Entity::TaskFlag => "task flag",
            Entity::Audit => "audit",
            Entity::Announcement => "announcement",
            Entity::TeamAvatar => "team avatar",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {entity} {field}: {reason}")]
pub struct ValidationError {
    pub entity: Entity,
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(entity: Entity, field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            entity,
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstraintViolation {
    #[error("a team with this name already exists")]
    TeamName,
    #[error("a team with this email already exists")]
    TeamEmail,
    #[error("this flag is already assigned to a task")]
    FlagValue,
    #[error("this team has already solved this task")]
    AuditPair,
    #[error("this team already has an avatar")]
    AvatarTeam,
    #[error("{entity} {id} is referenced by {by}")]
    Referenced {
        entity: Entity,
        id: i32,
        by: Entity,
    },
    #[error("unique constraint {0} violated")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("constraint violation: {0}")]
    ConstraintViolation(#[from] ConstraintViolation),
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i32 },
    #[error("Database error: {0}")]
    Database(#[from] DieselError),
    #[error("Connection pool error: {0}")]
    Pool(String),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Credential error: {0}")]
    Credential(String),
}

impl StoreError {
    pub fn not_found(entity: Entity, id: i32) -> Self {
        StoreError::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::ConstraintViolation(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

/// What the failing statement was doing, which decides how a foreign key
/// violation is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Write {
    /// Insert or update: the referenced row is missing.
    Upsert { task_id: Option<i32>, team_id: Option<i32> },
    /// Delete: a referencing row still exists.
    Delete { entity: Entity, id: i32 },
}

impl Write {
    /// A write whose table has no outgoing references.
    pub(crate) fn plain() -> Self {
        Write::Upsert {
            task_id: None,
            team_id: None,
        }
    }
}

fn unique_violation(constraint: Option<&str>) -> ConstraintViolation {
    match constraint {
        Some("team_name_key") => ConstraintViolation::TeamName,
        Some("team_email_key") => ConstraintViolation::TeamEmail,
        Some("task_flags_flag_key") => ConstraintViolation::FlagValue,
        Some("audit_task_id_team_id_key") => ConstraintViolation::AuditPair,
        Some("team_avatar_team_id_key") => ConstraintViolation::AvatarTeam,
        Some(other) => ConstraintViolation::Other(other.to_string()),
        None => ConstraintViolation::Other("<unnamed>".to_string()),
    }
}

fn referencing_entity(constraint: Option<&str>) -> Entity {
    match constraint {
        Some("task_flags_task_id_fkey") => Entity::TaskFlag,
        Some("team_avatar_team_id_fkey") => Entity::TeamAvatar,
        _ => Entity::Audit,
    }
}

fn foreign_key_violation(constraint: Option<&str>, write: Write) -> StoreError {
    match write {
        Write::Delete { entity, id } => ConstraintViolation::Referenced {
            entity,
            id,
            by: referencing_entity(constraint),
        }
        .into(),
        Write::Upsert { task_id, team_id } => {
            let references_team = matches!(
                constraint,
                Some("audit_team_id_fkey") | Some("team_avatar_team_id_fkey")
            );
            if references_team {
                StoreError::not_found(Entity::Team, team_id.unwrap_or_default())
            } else {
                StoreError::not_found(Entity::Task, task_id.unwrap_or_default())
            }
        }
    }
}

/// Maps a storage-engine error raised by a write onto the store's taxonomy.
pub(crate) fn classify(err: DieselError, write: Write) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            unique_violation(info.constraint_name()).into()
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            foreign_key_violation(info.constraint_name(), write)
        }
        other => other.into(),
    }
}

/// Shorthand for classifying the error of a single write statement.
pub(crate) trait ClassifyWrite<T> {
    fn classify(self, write: Write) -> Result<T, StoreError>;
}

impl<T> ClassifyWrite<T> for Result<T, DieselError> {
    fn classify(self, write: Write) -> Result<T, StoreError> {
        self.map_err(|err| classify(err, write))
    }
}
