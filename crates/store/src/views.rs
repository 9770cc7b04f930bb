// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Admin list projections. Each row carries exactly the columns an
//! administrator sees for a record, in `COLUMNS` order.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::models::{Announcement, AuditEntry, Task, TaskFlag, Team};

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct AnnouncementRow {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl AnnouncementRow {
    pub const COLUMNS: &'static [&'static str] = &["id", "title", "description", "created_at"];
}

impl From<&Announcement> for AnnouncementRow {
    fn from(announcement: &Announcement) -> Self {
        Self {
            id: announcement.id,
            title: announcement.title.clone(),
            description: announcement.description.clone(),
            created_at: announcement.created_at,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct AuditRow {
    pub id: i32,
    pub task: String,
    pub team: String,
    pub created_at: DateTime<Utc>,
}

impl AuditRow {
    pub const COLUMNS: &'static [&'static str] = &["id", "task", "team", "created_at"];
}

impl From<&AuditEntry> for AuditRow {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            id: entry.id,
            task: entry.task_name.clone(),
            team: entry.team_name.clone(),
            created_at: entry.created_at,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TaskRow {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub difficult: String,
    pub started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TaskRow {
    pub const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "category",
        "difficult",
        "started_at",
        "created_at",
    ];
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            name: task.name.clone(),
            category: task.category.clone(),
            difficult: task.difficult.clone(),
            started_at: task.started_at,
            created_at: task.created_at,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TaskFlagRow {
    pub id: i32,
    pub task: String,
    pub flag: String,
}

impl TaskFlagRow {
    pub const COLUMNS: &'static [&'static str] = &["id", "task", "flag"];

    /// Flags are listed under the name of their task.
    pub fn new(flag: &TaskFlag, task_name: impl Into<String>) -> Self {
        Self {
            id: flag.id,
            task: task_name.into(),
            flag: flag.flag.clone(),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TeamRow {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub active: bool,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

impl TeamRow {
    pub const COLUMNS: &'static [&'static str] =
        &["id", "name", "email", "active", "country", "created_at"];
}

impl From<&Team> for TeamRow {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            name: team.name.clone(),
            email: team.email.clone(),
            active: team.active,
            country: team.country.clone(),
            created_at: team.created_at,
        }
    }
}
