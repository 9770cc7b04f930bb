// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

use super::schema::*;

/// Distinguishes "leave unchanged" (missing key) from "set to null" (`null`)
/// when a patch is decoded from JSON.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/* =========================
 * TEAMS
 * ========================= */

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = team)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Team {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub country: String,
    pub avatar: String,
    pub affiliation: String,
    pub website: String,
}

#[derive(Insertable, Deserialize, Clone, Debug, Default)]
#[diesel(table_name = team)]
#[serde(deny_unknown_fields)]
pub struct NewTeam {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub affiliation: String,
    #[serde(default)]
    pub website: String,
}

/// `team.avatar` is absent here: it only changes together with the avatar
/// row, through `Store::set_team_avatar`.
#[derive(AsChangeset, Deserialize, Clone, Debug, Default)]
#[diesel(table_name = team)]
#[serde(deny_unknown_fields)]
pub struct TeamPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub active: Option<bool>,
    pub country: Option<String>,
    pub affiliation: Option<String>,
    pub website: Option<String>,
}

impl TeamPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.active.is_none()
            && self.country.is_none()
            && self.affiliation.is_none()
            && self.website.is_none()
    }
}

/* =========================
 * TASKS
 * ========================= */

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = task)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Task {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub category: String,
    pub difficult: String,
    pub started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn is_released_at(&self, now: DateTime<Utc>) -> bool {
        self.started_at.is_some_and(|started_at| started_at < now)
    }
}

#[derive(Insertable, Deserialize, Clone, Debug, Default)]
#[diesel(table_name = task)]
#[serde(deny_unknown_fields)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub category: String,
    pub difficult: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(AsChangeset, Deserialize, Clone, Debug, Default)]
#[diesel(table_name = task)]
#[serde(deny_unknown_fields)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficult: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub started_at: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.difficult.is_none()
            && self.started_at.is_none()
    }
}

/* =========================
 * TASK FLAGS
 * ========================= */

#[derive(
    Queryable, Selectable, Identifiable, Associations, Serialize, Clone, Debug, PartialEq,
)]
#[diesel(table_name = task_flags)]
#[diesel(belongs_to(Task))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskFlag {
    pub id: i32,
    pub task_id: i32,
    pub flag: String,
}

#[derive(Insertable, Deserialize, Clone, Debug)]
#[diesel(table_name = task_flags)]
#[serde(deny_unknown_fields)]
pub struct NewTaskFlag {
    pub task_id: i32,
    pub flag: String,
}

#[derive(AsChangeset, Deserialize, Clone, Debug, Default)]
#[diesel(table_name = task_flags)]
#[serde(deny_unknown_fields)]
pub struct TaskFlagPatch {
    pub task_id: Option<i32>,
    pub flag: Option<String>,
}

impl TaskFlagPatch {
    pub fn is_empty(&self) -> bool {
        self.task_id.is_none() && self.flag.is_none()
    }
}

/* =========================
 * AUDITS
 * ========================= */

#[derive(
    Queryable, Selectable, Identifiable, Associations, Serialize, Clone, Debug, PartialEq,
)]
#[diesel(table_name = audit)]
#[diesel(belongs_to(Task))]
#[diesel(belongs_to(Team))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Audit {
    pub id: i32,
    pub task_id: i32,
    pub team_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Deserialize, Clone, Copy, Debug)]
#[diesel(table_name = audit)]
#[serde(deny_unknown_fields)]
pub struct NewAudit {
    pub task_id: i32,
    pub team_id: i32,
}

#[derive(AsChangeset, Deserialize, Clone, Copy, Debug, Default)]
#[diesel(table_name = audit)]
#[serde(deny_unknown_fields)]
pub struct AuditPatch {
    pub task_id: Option<i32>,
    pub team_id: Option<i32>,
}

impl AuditPatch {
    pub fn is_empty(&self) -> bool {
        self.task_id.is_none() && self.team_id.is_none()
    }
}

/// An audit row joined with the names of the team and task it links.
#[derive(Queryable, Serialize, Clone, Debug, PartialEq)]
pub struct AuditEntry {
    pub id: i32,
    pub team_id: i32,
    pub task_id: i32,
    pub created_at: DateTime<Utc>,
    pub team_name: String,
    pub task_name: String,
}

/* =========================
 * ANNOUNCEMENTS
 * ========================= */

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = announcement)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Announcement {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Deserialize, Clone, Debug)]
#[diesel(table_name = announcement)]
#[serde(deny_unknown_fields)]
pub struct NewAnnouncement {
    pub title: String,
    pub description: String,
}

#[derive(AsChangeset, Deserialize, Clone, Debug, Default)]
#[diesel(table_name = announcement)]
#[serde(deny_unknown_fields)]
pub struct AnnouncementPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl AnnouncementPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

/* =========================
 * TEAM AVATARS
 * ========================= */

#[derive(Queryable, Selectable, Identifiable, Associations, Clone, PartialEq)]
#[diesel(table_name = team_avatar)]
#[diesel(belongs_to(Team))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TeamAvatar {
    pub id: i32,
    pub team_id: i32,
    pub avatar_path: String,
    pub avatar: Vec<u8>,
}

impl std::fmt::Debug for TeamAvatar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamAvatar")
            .field("id", &self.id)
            .field("team_id", &self.team_id)
            .field("avatar_path", &self.avatar_path)
            .field("avatar", &format_args!("<{} bytes>", self.avatar.len()))
            .finish()
    }
}

#[derive(Insertable, AsChangeset, Clone, Debug)]
#[diesel(table_name = team_avatar)]
pub struct NewTeamAvatar {
    pub team_id: i32,
    pub avatar_path: String,
    pub avatar: Vec<u8>,
}

#[derive(AsChangeset, Clone, Debug, Default)]
#[diesel(table_name = team_avatar)]
pub struct TeamAvatarPatch {
    pub avatar_path: Option<String>,
    pub avatar: Option<Vec<u8>>,
}

impl TeamAvatarPatch {
    pub fn is_empty(&self) -> bool {
        self.avatar_path.is_none() && self.avatar.is_none()
    }
}
