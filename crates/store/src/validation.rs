// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::de::DeserializeOwned;

use crate::db::models::{
    AnnouncementPatch, AuditPatch, NewAnnouncement, NewAudit, NewTask, NewTaskFlag, NewTeam,
    NewTeamAvatar, TaskFlagPatch, TaskPatch, TeamAvatarPatch, TeamPatch,
};
use crate::error::{Entity, ValidationError};

pub const NAME_MAX_LEN: usize = 255;
pub const EMAIL_MAX_LEN: usize = 255;
pub const PASSWORD_MAX_LEN: usize = 255;
pub const COUNTRY_MAX_LEN: usize = 4;
pub const AVATAR_PATH_MAX_LEN: usize = 64;
pub const AFFILIATION_MAX_LEN: usize = 64;
pub const WEBSITE_MAX_LEN: usize = 255;
pub const CATEGORY_MAX_LEN: usize = 128;
pub const DIFFICULTY_MAX_LEN: usize = 32;
pub const FLAG_MAX_LEN: usize = 255;
pub const TITLE_MAX_LEN: usize = 255;

/// Explicit validation run by the store before every write.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn required(
    entity: Entity,
    field: &'static str,
    value: &str,
    max_len: Option<usize>,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(entity, field, "must not be blank"));
    }
    bounded(entity, field, value, max_len)
}

fn bounded(
    entity: Entity,
    field: &'static str,
    value: &str,
    max_len: Option<usize>,
) -> Result<(), ValidationError> {
    match max_len {
        Some(max_len) if value.chars().count() > max_len => Err(ValidationError::new(
            entity,
            field,
            format!("must be at most {max_len} characters"),
        )),
        _ => Ok(()),
    }
}

fn team_name(name: &str) -> Result<(), ValidationError> {
    required(Entity::Team, "name", name, Some(NAME_MAX_LEN))?;
    if !name.is_ascii() {
        return Err(ValidationError::new(
            Entity::Team,
            "name",
            "must only contain ASCII characters",
        ));
    }
    Ok(())
}

fn team_email(email: &str) -> Result<(), ValidationError> {
    required(Entity::Team, "email", email, Some(EMAIL_MAX_LEN))?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ValidationError::new(
            Entity::Team,
            "email",
            "must be an email address",
        )),
    }
}

fn team_country(country: &str) -> Result<(), ValidationError> {
    if country.is_empty() {
        return Ok(());
    }
    let len = country.len();
    if !(2..=COUNTRY_MAX_LEN).contains(&len) || !country.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::new(
            Entity::Team,
            "country",
            "must be a 2 to 4 letter country code",
        ));
    }
    Ok(())
}

fn team_website(website: &str) -> Result<(), ValidationError> {
    bounded(Entity::Team, "website", website, Some(WEBSITE_MAX_LEN))?;
    if !website.is_empty() && !website.starts_with("https://") {
        return Err(ValidationError::new(
            Entity::Team,
            "website",
            "must start with https://",
        ));
    }
    Ok(())
}

fn team_password(password: &str) -> Result<(), ValidationError> {
    required(Entity::Team, "password", password, Some(PASSWORD_MAX_LEN))
}

impl NewTeam {
    /// Trims the identifying fields the way logins are matched.
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
    }
}

impl Validate for NewTeam {
    fn validate(&self) -> Result<(), ValidationError> {
        team_name(&self.name)?;
        team_email(&self.email)?;
        team_password(&self.password)?;
        team_country(&self.country)?;
        bounded(
            Entity::Team,
            "affiliation",
            &self.affiliation,
            Some(AFFILIATION_MAX_LEN),
        )?;
        team_website(&self.website)
    }
}

impl TeamPatch {
    pub fn normalize(&mut self) {
        if let Some(name) = self.name.as_mut() {
            *name = name.trim().to_string();
        }
        if let Some(email) = self.email.as_mut() {
            *email = email.trim().to_string();
        }
    }
}

impl Validate for TeamPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            team_name(name)?;
        }
        if let Some(email) = &self.email {
            team_email(email)?;
        }
        if let Some(password) = &self.password {
            team_password(password)?;
        }
        if let Some(country) = &self.country {
            team_country(country)?;
        }
        if let Some(affiliation) = &self.affiliation {
            bounded(
                Entity::Team,
                "affiliation",
                affiliation,
                Some(AFFILIATION_MAX_LEN),
            )?;
        }
        if let Some(website) = &self.website {
            team_website(website)?;
        }
        Ok(())
    }
}

impl Validate for NewTask {
    fn validate(&self) -> Result<(), ValidationError> {
        required(Entity::Task, "name", &self.name, Some(NAME_MAX_LEN))?;
        required(Entity::Task, "description", &self.description, None)?;
        required(Entity::Task, "category", &self.category, Some(CATEGORY_MAX_LEN))?;
        required(
            Entity::Task,
            "difficult",
            &self.difficult,
            Some(DIFFICULTY_MAX_LEN),
        )
    }
}

impl Validate for TaskPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            required(Entity::Task, "name", name, Some(NAME_MAX_LEN))?;
        }
        if let Some(description) = &self.description {
            required(Entity::Task, "description", description, None)?;
        }
        if let Some(category) = &self.category {
            required(Entity::Task, "category", category, Some(CATEGORY_MAX_LEN))?;
        }
        if let Some(difficult) = &self.difficult {
            required(Entity::Task, "difficult", difficult, Some(DIFFICULTY_MAX_LEN))?;
        }
        Ok(())
    }
}

impl Validate for NewTaskFlag {
    fn validate(&self) -> Result<(), ValidationError> {
        required(Entity::TaskFlag, "flag", &self.flag, Some(FLAG_MAX_LEN))
    }
}

impl Validate for TaskFlagPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        match &self.flag {
            Some(flag) => required(Entity::TaskFlag, "flag", flag, Some(FLAG_MAX_LEN)),
            None => Ok(()),
        }
    }
}

// References are checked by the storage engine inside the write transaction.
impl Validate for NewAudit {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl Validate for AuditPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl Validate for NewAnnouncement {
    fn validate(&self) -> Result<(), ValidationError> {
        required(Entity::Announcement, "title", &self.title, Some(TITLE_MAX_LEN))?;
        required(Entity::Announcement, "description", &self.description, None)
    }
}

impl Validate for AnnouncementPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            required(Entity::Announcement, "title", title, Some(TITLE_MAX_LEN))?;
        }
        if let Some(description) = &self.description {
            required(Entity::Announcement, "description", description, None)?;
        }
        Ok(())
    }
}

fn avatar_bytes(avatar: &[u8]) -> Result<(), ValidationError> {
    if avatar.is_empty() {
        return Err(ValidationError::new(
            Entity::TeamAvatar,
            "avatar",
            "must not be empty",
        ));
    }
    Ok(())
}

impl Validate for NewTeamAvatar {
    fn validate(&self) -> Result<(), ValidationError> {
        required(
            Entity::TeamAvatar,
            "avatar_path",
            &self.avatar_path,
            Some(AVATAR_PATH_MAX_LEN),
        )?;
        avatar_bytes(&self.avatar)
    }
}

impl Validate for TeamAvatarPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(avatar_path) = &self.avatar_path {
            required(
                Entity::TeamAvatar,
                "avatar_path",
                avatar_path,
                Some(AVATAR_PATH_MAX_LEN),
            )?;
        }
        if let Some(avatar) = &self.avatar {
            avatar_bytes(avatar)?;
        }
        Ok(())
    }
}

/// Decodes a JSON patch body for `entity`. Unknown keys, including the
/// immutable `created_at`, are rejected.
pub fn decode_patch<T: DeserializeOwned>(
    entity: Entity,
    body: serde_json::Value,
) -> Result<T, ValidationError> {
    if body.get("created_at").is_some() {
        return Err(ValidationError::new(entity, "created_at", "is immutable"));
    }
    serde_json::from_value(body).map_err(|e| ValidationError::new(entity, "patch", e.to_string()))
}
