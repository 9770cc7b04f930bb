// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl, scoped_futures::ScopedFutureExt};

use super::Store;
use super::list::{ListOptions, apply_list_options};
use crate::avatar::{check_avatar, generate_avatar_path};
use crate::db::models::{NewTeamAvatar, TeamAvatar, TeamAvatarPatch};
use crate::db::schema::{team, team_avatar};
use crate::error::{ClassifyWrite, Entity, StoreError, Write};
use crate::validation::Validate;

// `team.avatar` mirrors the path of the team's avatar row; every write below
// keeps the two in step inside the same transaction.

impl Store {
    pub async fn create_team_avatar(
        &self,
        new_avatar: NewTeamAvatar,
    ) -> Result<TeamAvatar, StoreError> {
        new_avatar.validate()?;

        let team_id = new_avatar.team_id;
        let mut conn = self.conn().await?;
        let created = conn
            .transaction::<_, StoreError, _>(|conn| {
                async move {
                    let created = diesel::insert_into(team_avatar::table)
                        .values(&new_avatar)
                        .returning(TeamAvatar::as_returning())
                        .get_result(conn)
                        .await
                        .classify(Write::Upsert {
                            task_id: None,
                            team_id: Some(team_id),
                        })?;
                    diesel::update(team::table.find(team_id))
                        .set(team::avatar.eq(&created.avatar_path))
                        .execute(conn)
                        .await?;
                    Ok::<_, StoreError>(created)
                }
                .scope_boxed()
            })
            .await
            .inspect_err(|e| tracing::warn!("Rejected avatar for team #{team_id}: {e}"))?;

        tracing::info!("Stored avatar {} for team #{team_id}", created.avatar_path);
        Ok(created)
    }

    pub async fn get_team_avatar(&self, id: i32) -> Result<TeamAvatar, StoreError> {
        team_avatar::table
            .find(id)
            .select(TeamAvatar::as_select())
            .first(&mut self.conn().await?)
            .await
            .optional()?
            .ok_or(StoreError::not_found(Entity::TeamAvatar, id))
    }

    pub async fn get_avatar_for_team(&self, team_id: i32) -> Result<Option<TeamAvatar>, StoreError> {
        Ok(team_avatar::table
            .filter(team_avatar::team_id.eq(team_id))
            .select(TeamAvatar::as_select())
            .first(&mut self.conn().await?)
            .await
            .optional()?)
    }

    /// Resolves the public file name an avatar is served under.
    pub async fn get_avatar_by_path(&self, path: &str) -> Result<Option<TeamAvatar>, StoreError> {
        Ok(team_avatar::table
            .filter(team_avatar::avatar_path.eq(path))
            .select(TeamAvatar::as_select())
            .first(&mut self.conn().await?)
            .await
            .optional()?)
    }

    pub async fn list_team_avatars(
        &self,
        options: &ListOptions,
    ) -> Result<Vec<TeamAvatar>, StoreError> {
        let query = team_avatar::table
            .select(TeamAvatar::as_select())
            .into_boxed();
        let query = apply_list_options!(query, options, team_avatar::id, team_avatar::id);

        Ok(query.load(&mut self.conn().await?).await?)
    }

    pub async fn update_team_avatar(
        &self,
        id: i32,
        patch: TeamAvatarPatch,
    ) -> Result<TeamAvatar, StoreError> {
        patch.validate()?;
        if patch.is_empty() {
            return self.get_team_avatar(id).await;
        }

        let mut conn = self.conn().await?;
        let updated = conn
            .transaction::<_, StoreError, _>(|conn| {
                async move {
                    let updated = diesel::update(team_avatar::table.find(id))
                        .set(&patch)
                        .returning(TeamAvatar::as_returning())
                        .get_result(conn)
                        .await
                        .optional()
                        .classify(Write::plain())?
                        .ok_or(StoreError::not_found(Entity::TeamAvatar, id))?;
                    diesel::update(team::table.find(updated.team_id))
                        .set(team::avatar.eq(&updated.avatar_path))
                        .execute(conn)
                        .await?;
                    Ok::<_, StoreError>(updated)
                }
                .scope_boxed()
            })
            .await?;

        tracing::info!("Updated avatar #{id} of team #{}", updated.team_id);
        Ok(updated)
    }

    pub async fn delete_team_avatar(&self, id: i32) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                let removed = diesel::delete(team_avatar::table.find(id))
                    .returning(TeamAvatar::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?
                    .ok_or(StoreError::not_found(Entity::TeamAvatar, id))?;
                diesel::update(
                    team::table
                        .find(removed.team_id)
                        .filter(team::avatar.eq(&removed.avatar_path)),
                )
                .set(team::avatar.eq(""))
                .execute(conn)
                .await?;
                Ok::<_, StoreError>(())
            }
            .scope_boxed()
        })
        .await?;

        tracing::info!("Deleted avatar #{id}");
        Ok(())
    }

    /// Replaces a team's avatar with a checked PNG payload under a freshly
    /// generated path. An empty payload removes the avatar.
    pub async fn set_team_avatar(
        &self,
        team_id: i32,
        payload: Vec<u8>,
    ) -> Result<Option<TeamAvatar>, StoreError> {
        if payload.is_empty() {
            self.clear_team_avatar(team_id).await?;
            return Ok(None);
        }

        let dimensions = check_avatar(&payload)?;
        let new_avatar = NewTeamAvatar {
            team_id,
            avatar_path: generate_avatar_path(),
            avatar: payload,
        };
        new_avatar.validate()?;

        let mut conn = self.conn().await?;
        let stored = conn
            .transaction::<_, StoreError, _>(|conn| {
                async move {
                    let stored = diesel::insert_into(team_avatar::table)
                        .values(&new_avatar)
                        .on_conflict(team_avatar::team_id)
                        .do_update()
                        .set(&new_avatar)
                        .returning(TeamAvatar::as_returning())
                        .get_result(conn)
                        .await
                        .classify(Write::Upsert {
                            task_id: None,
                            team_id: Some(team_id),
                        })?;
                    diesel::update(team::table.find(team_id))
                        .set(team::avatar.eq(&stored.avatar_path))
                        .execute(conn)
                        .await?;
                    Ok::<_, StoreError>(stored)
                }
                .scope_boxed()
            })
            .await
            .inspect_err(|e| tracing::warn!("Rejected avatar for team #{team_id}: {e}"))?;

        tracing::info!(
            "Set {}x{} avatar {} for team #{team_id}",
            dimensions.width,
            dimensions.height,
            stored.avatar_path
        );
        Ok(Some(stored))
    }

    pub async fn clear_team_avatar(&self, team_id: i32) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                let updated = diesel::update(team::table.find(team_id))
                    .set(team::avatar.eq(""))
                    .execute(conn)
                    .await?;
                if updated == 0 {
                    return Err(StoreError::not_found(Entity::Team, team_id));
                }
                diesel::delete(team_avatar::table.filter(team_avatar::team_id.eq(team_id)))
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        tracing::info!("Cleared avatar of team #{team_id}");
        Ok(())
    }
}
