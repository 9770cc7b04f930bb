// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl, scoped_futures::ScopedFutureExt};

use super::Store;
use super::list::{ListOptions, apply_list_options};
use crate::db::models::{NewTask, Task, TaskPatch};
use crate::db::schema::{audit, task, task_flags};
use crate::error::{ClassifyWrite, ConstraintViolation, Entity, StoreError, Write};
use crate::validation::Validate;

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub category: Option<String>,
    pub difficult: Option<String>,
    /// Only tasks whose `started_at` lies before this instant.
    pub released_before: Option<DateTime<Utc>>,
}

impl Store {
    pub async fn create_task(&self, new_task: NewTask) -> Result<Task, StoreError> {
        new_task.validate()?;

        let mut conn = self.conn().await?;
        let created = conn
            .transaction::<_, StoreError, _>(|conn| {
                async move {
                    diesel::insert_into(task::table)
                        .values(&new_task)
                        .returning(Task::as_returning())
                        .get_result(conn)
                        .await
                        .classify(Write::plain())
                }
                .scope_boxed()
            })
            .await
            .inspect_err(|e| tracing::warn!("Rejected new task: {e}"))?;

        tracing::info!(
            "Created task {} (#{}) in category {}",
            created.name,
            created.id,
            created.category
        );
        Ok(created)
    }

    pub async fn get_task(&self, id: i32) -> Result<Task, StoreError> {
        tracing::debug!("Loading task #{id}");
        task::table
            .find(id)
            .select(Task::as_select())
            .first(&mut self.conn().await?)
            .await
            .optional()?
            .ok_or(StoreError::not_found(Entity::Task, id))
    }

    pub async fn list_tasks(
        &self,
        filter: &TaskFilter,
        options: &ListOptions,
    ) -> Result<Vec<Task>, StoreError> {
        let mut query = task::table.select(Task::as_select()).into_boxed();
        if let Some(category) = &filter.category {
            query = query.filter(task::category.eq(category));
        }
        if let Some(difficult) = &filter.difficult {
            query = query.filter(task::difficult.eq(difficult));
        }
        if let Some(before) = filter.released_before {
            query = query.filter(task::started_at.lt(before));
        }
        let query = apply_list_options!(query, options, task::id, task::created_at);

        Ok(query.load(&mut self.conn().await?).await?)
    }

    /// Tasks visible to competitors at `now`, in creation order.
    pub async fn list_released_tasks(&self, now: DateTime<Utc>) -> Result<Vec<Task>, StoreError> {
        self.list_tasks(
            &TaskFilter {
                released_before: Some(now),
                ..Default::default()
            },
            &ListOptions::default(),
        )
        .await
    }

    pub async fn update_task(&self, id: i32, patch: TaskPatch) -> Result<Task, StoreError> {
        patch.validate()?;
        if patch.is_empty() {
            return self.get_task(id).await;
        }

        let mut conn = self.conn().await?;
        let updated = conn
            .transaction::<_, StoreError, _>(|conn| {
                async move {
                    diesel::update(task::table.find(id))
                        .set(&patch)
                        .returning(Task::as_returning())
                        .get_result(conn)
                        .await
                        .optional()
                        .classify(Write::plain())?
                        .ok_or(StoreError::not_found(Entity::Task, id))
                }
                .scope_boxed()
            })
            .await
            .inspect_err(|e| tracing::warn!("Rejected update of task #{id}: {e}"))?;

        tracing::info!("Updated task {} (#{})", updated.name, updated.id);
        Ok(updated)
    }

    /// Sets (or with `None`, clears) the instant a task becomes visible.
    pub async fn release_task(
        &self,
        id: i32,
        at: Option<DateTime<Utc>>,
    ) -> Result<Task, StoreError> {
        self.update_task(
            id,
            TaskPatch {
                started_at: Some(at),
                ..Default::default()
            },
        )
        .await
    }

    /// Deletes a task together with its flags. Tasks with recorded solves
    /// cannot be deleted.
    pub async fn delete_task(&self, id: i32) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let removed_flags = conn
            .transaction::<_, StoreError, _>(|conn| {
                async move {
                    let solves: i64 = audit::table
                        .filter(audit::task_id.eq(id))
                        .count()
                        .get_result(conn)
                        .await?;
                    if solves > 0 {
                        return Err(StoreError::from(ConstraintViolation::Referenced {
                            entity: Entity::Task,
                            id,
                            by: Entity::Audit,
                        }));
                    }

                    let removed_flags =
                        diesel::delete(task_flags::table.filter(task_flags::task_id.eq(id)))
                            .execute(conn)
                            .await?;
                    let deleted = diesel::delete(task::table.find(id))
                        .execute(conn)
                        .await
                        .classify(Write::Delete {
                            entity: Entity::Task,
                            id,
                        })?;
                    if deleted == 0 {
                        return Err(StoreError::not_found(Entity::Task, id));
                    }
                    Ok(removed_flags)
                }
                .scope_boxed()
            })
            .await
            .inspect_err(|e| tracing::warn!("Rejected deletion of task #{id}: {e}"))?;

        tracing::info!("Deleted task #{id} and {removed_flags} flag(s)");
        Ok(())
    }
}
