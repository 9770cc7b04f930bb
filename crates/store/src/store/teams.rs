// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl, scoped_futures::ScopedFutureExt};

use super::Store;
use super::list::{ListOptions, apply_list_options};
use crate::db::models::{NewTeam, Team, TeamPatch};
use crate::db::schema::{audit, team};
use crate::error::{ClassifyWrite, ConstraintViolation, Entity, StoreError, Write};
use crate::validation::Validate;

#[derive(Debug, Clone, Default)]
pub struct TeamFilter {
    pub active: Option<bool>,
    /// Case-insensitive substring of the team name.
    pub name_contains: Option<String>,
}

pub(crate) fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl Store {
    pub async fn create_team(&self, mut new_team: NewTeam) -> Result<Team, StoreError> {
        new_team.normalize();
        new_team.validate()?;

        let mut conn = self.conn().await?;
        let created = conn
            .transaction::<_, StoreError, _>(|conn| {
                async move {
                    diesel::insert_into(team::table)
                        .values(&new_team)
                        .returning(Team::as_returning())
                        .get_result(conn)
                        .await
                        .classify(Write::plain())
                }
                .scope_boxed()
            })
            .await
            .inspect_err(|e| tracing::warn!("Rejected new team: {e}"))?;

        tracing::info!("Created team {} (#{})", created.name, created.id);
        Ok(created)
    }

    pub async fn get_team(&self, id: i32) -> Result<Team, StoreError> {
        tracing::debug!("Loading team #{id}");
        team::table
            .find(id)
            .select(Team::as_select())
            .first(&mut self.conn().await?)
            .await
            .optional()?
            .ok_or(StoreError::not_found(Entity::Team, id))
    }

    pub async fn list_teams(
        &self,
        filter: &TeamFilter,
        options: &ListOptions,
    ) -> Result<Vec<Team>, StoreError> {
        let mut query = team::table.select(Team::as_select()).into_boxed();
        if let Some(active) = filter.active {
            query = query.filter(team::active.eq(active));
        }
        if let Some(name) = &filter.name_contains {
            query = query.filter(team::name.ilike(like_pattern(name)));
        }
        let query = apply_list_options!(query, options, team::id, team::created_at);

        Ok(query.load(&mut self.conn().await?).await?)
    }

    /// Looks a team up the way the login form does: by email or by name.
    pub async fn find_team_by_login(&self, login: &str) -> Result<Option<Team>, StoreError> {
        let login = login.trim();
        Ok(team::table
            .filter(team::email.eq(login).or(team::name.eq(login)))
            .select(Team::as_select())
            .order(team::id.asc())
            .first(&mut self.conn().await?)
            .await
            .optional()?)
    }

    pub async fn update_team(&self, id: i32, mut patch: TeamPatch) -> Result<Team, StoreError> {
        patch.normalize();
        patch.validate()?;
        if patch.is_empty() {
            return self.get_team(id).await;
        }

        let mut conn = self.conn().await?;
        let updated = conn
            .transaction::<_, StoreError, _>(|conn| {
                async move {
                    diesel::update(team::table.find(id))
                        .set(&patch)
                        .returning(Team::as_returning())
                        .get_result(conn)
                        .await
                        .optional()
                        .classify(Write::plain())?
                        .ok_or(StoreError::not_found(Entity::Team, id))
                }
                .scope_boxed()
            })
            .await
            .inspect_err(|e| tracing::warn!("Rejected update of team #{id}: {e}"))?;

        tracing::info!("Updated team {} (#{})", updated.name, updated.id);
        Ok(updated)
    }

    /// Deletes a team and, by cascade, its avatar. Teams with recorded solves
    /// cannot be deleted.
    pub async fn delete_team(&self, id: i32) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                let solves: i64 = audit::table
                    .filter(audit::team_id.eq(id))
                    .count()
                    .get_result(conn)
                    .await?;
                if solves > 0 {
                    return Err(StoreError::from(ConstraintViolation::Referenced {
                        entity: Entity::Team,
                        id,
                        by: Entity::Audit,
                    }));
                }

                let deleted = diesel::delete(team::table.find(id))
                    .execute(conn)
                    .await
                    .classify(Write::Delete {
                        entity: Entity::Team,
                        id,
                    })?;
                if deleted == 0 {
                    return Err(StoreError::not_found(Entity::Team, id));
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .inspect_err(|e| tracing::warn!("Rejected deletion of team #{id}: {e}"))?;

        tracing::info!("Deleted team #{id}");
        Ok(())
    }
}
