// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl, scoped_futures::ScopedFutureExt};

use super::Store;
use super::list::{ListOptions, apply_list_options};
use crate::db::models::{Audit, AuditEntry, AuditPatch, NewAudit};
use crate::db::schema::{audit, task, team};
use crate::error::{ClassifyWrite, Entity, StoreError, Write};
use crate::validation::Validate;

#[derive(Debug, Clone, Copy, Default)]
pub struct AuditFilter {
    pub task_id: Option<i32>,
    pub team_id: Option<i32>,
}

impl Store {
    /// Records that a team solved a task. Each (task, team) pair is recorded
    /// at most once.
    pub async fn create_audit(&self, new_audit: NewAudit) -> Result<Audit, StoreError> {
        new_audit.validate()?;

        let NewAudit { task_id, team_id } = new_audit;
        let mut conn = self.conn().await?;
        let created = conn
            .transaction::<_, StoreError, _>(|conn| {
                async move {
                    diesel::insert_into(audit::table)
                        .values(&new_audit)
                        .returning(Audit::as_returning())
                        .get_result(conn)
                        .await
                        .classify(Write::Upsert {
                            task_id: Some(task_id),
                            team_id: Some(team_id),
                        })
                }
                .scope_boxed()
            })
            .await
            .inspect_err(|e| {
                tracing::warn!("Rejected solve of task #{task_id} by team #{team_id}: {e}")
            })?;

        tracing::info!(
            "Recorded solve #{} of task #{} by team #{}",
            created.id,
            created.task_id,
            created.team_id
        );
        Ok(created)
    }

    pub async fn get_audit(&self, id: i32) -> Result<Audit, StoreError> {
        audit::table
            .find(id)
            .select(Audit::as_select())
            .first(&mut self.conn().await?)
            .await
            .optional()?
            .ok_or(StoreError::not_found(Entity::Audit, id))
    }

    pub async fn list_audits(
        &self,
        filter: &AuditFilter,
        options: &ListOptions,
    ) -> Result<Vec<Audit>, StoreError> {
        let mut query = audit::table.select(Audit::as_select()).into_boxed();
        if let Some(task_id) = filter.task_id {
            query = query.filter(audit::task_id.eq(task_id));
        }
        if let Some(team_id) = filter.team_id {
            query = query.filter(audit::team_id.eq(team_id));
        }
        let query = apply_list_options!(query, options, audit::id, audit::created_at);

        Ok(query.load(&mut self.conn().await?).await?)
    }

    /// Audit rows joined with team and task names. Admin listings pass
    /// `ListOptions::newest_first()`.
    pub async fn list_audit_entries(
        &self,
        filter: &AuditFilter,
        options: &ListOptions,
    ) -> Result<Vec<AuditEntry>, StoreError> {
        let mut query = audit::table
            .inner_join(team::table)
            .inner_join(task::table)
            .select((
                audit::id,
                audit::team_id,
                audit::task_id,
                audit::created_at,
                team::name,
                task::name,
            ))
            .into_boxed();
        if let Some(task_id) = filter.task_id {
            query = query.filter(audit::task_id.eq(task_id));
        }
        if let Some(team_id) = filter.team_id {
            query = query.filter(audit::team_id.eq(team_id));
        }
        let query = apply_list_options!(query, options, audit::id, audit::created_at);

        Ok(query.load::<AuditEntry>(&mut self.conn().await?).await?)
    }

    /// Solves of a task, first solver first. Solves of tasks not yet released
    /// at `now` are not listed.
    pub async fn solves_by_task(
        &self,
        task_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(audit::table
            .inner_join(team::table)
            .inner_join(task::table)
            .filter(audit::task_id.eq(task_id))
            .filter(task::started_at.lt(now))
            .select((
                audit::id,
                audit::team_id,
                audit::task_id,
                audit::created_at,
                team::name,
                task::name,
            ))
            .order((audit::created_at.asc(), audit::id.asc()))
            .load::<AuditEntry>(&mut self.conn().await?)
            .await?)
    }

    /// Solves of a team, most recent first.
    pub async fn solves_by_team(&self, team_id: i32) -> Result<Vec<AuditEntry>, StoreError> {
        self.list_audit_entries(
            &AuditFilter {
                team_id: Some(team_id),
                ..Default::default()
            },
            &ListOptions::newest_first(),
        )
        .await
    }

    pub async fn update_audit(&self, id: i32, patch: AuditPatch) -> Result<Audit, StoreError> {
        patch.validate()?;
        if patch.is_empty() {
            return self.get_audit(id).await;
        }

        let mut conn = self.conn().await?;
        let updated = conn
            .transaction::<_, StoreError, _>(|conn| {
                async move {
                    diesel::update(audit::table.find(id))
                        .set(&patch)
                        .returning(Audit::as_returning())
                        .get_result(conn)
                        .await
                        .optional()
                        .classify(Write::Upsert {
                            task_id: patch.task_id,
                            team_id: patch.team_id,
                        })?
                        .ok_or(StoreError::not_found(Entity::Audit, id))
                }
                .scope_boxed()
            })
            .await
            .inspect_err(|e| tracing::warn!("Rejected update of audit #{id}: {e}"))?;

        tracing::info!("Updated audit #{id}");
        Ok(updated)
    }

    pub async fn delete_audit(&self, id: i32) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                let deleted = diesel::delete(audit::table.find(id))
                    .execute(conn)
                    .await?;
                if deleted == 0 {
                    return Err(StoreError::not_found(Entity::Audit, id));
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        tracing::info!("Deleted audit #{id}");
        Ok(())
    }
}
