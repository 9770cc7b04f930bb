// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl, scoped_futures::ScopedFutureExt};

use super::Store;
use super::list::{ListOptions, apply_list_options};
use crate::db::models::{NewTaskFlag, TaskFlag, TaskFlagPatch};
use crate::db::schema::task_flags;
use crate::error::{ClassifyWrite, Entity, StoreError, Write};
use crate::validation::Validate;

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFlagFilter {
    pub task_id: Option<i32>,
}

impl Store {
    /// Flags are unique across every task, not only within one.
    pub async fn create_task_flag(&self, new_flag: NewTaskFlag) -> Result<TaskFlag, StoreError> {
        new_flag.validate()?;

        let task_id = new_flag.task_id;
        let mut conn = self.conn().await?;
        let created = conn
            .transaction::<_, StoreError, _>(|conn| {
                async move {
                    diesel::insert_into(task_flags::table)
                        .values(&new_flag)
                        .returning(TaskFlag::as_returning())
                        .get_result(conn)
                        .await
                        .classify(Write::Upsert {
                            task_id: Some(task_id),
                            team_id: None,
                        })
                }
                .scope_boxed()
            })
            .await
            .inspect_err(|e| tracing::warn!("Rejected new flag for task #{task_id}: {e}"))?;

        // The flag value itself is a secret and stays out of the logs.
        tracing::info!("Created flag #{} for task #{}", created.id, created.task_id);
        Ok(created)
    }

    pub async fn get_task_flag(&self, id: i32) -> Result<TaskFlag, StoreError> {
        task_flags::table
            .find(id)
            .select(TaskFlag::as_select())
            .first(&mut self.conn().await?)
            .await
            .optional()?
            .ok_or(StoreError::not_found(Entity::TaskFlag, id))
    }

    pub async fn list_task_flags(
        &self,
        filter: &TaskFlagFilter,
        options: &ListOptions,
    ) -> Result<Vec<TaskFlag>, StoreError> {
        let mut query = task_flags::table
            .select(TaskFlag::as_select())
            .into_boxed();
        if let Some(task_id) = filter.task_id {
            query = query.filter(task_flags::task_id.eq(task_id));
        }
        let query = apply_list_options!(query, options, task_flags::id, task_flags::id);

        Ok(query.load(&mut self.conn().await?).await?)
    }

    pub async fn list_flags_for_task(&self, task_id: i32) -> Result<Vec<TaskFlag>, StoreError> {
        self.list_task_flags(
            &TaskFlagFilter {
                task_id: Some(task_id),
            },
            &ListOptions::default(),
        )
        .await
    }

    pub async fn update_task_flag(
        &self,
        id: i32,
        patch: TaskFlagPatch,
    ) -> Result<TaskFlag, StoreError> {
        patch.validate()?;
        if patch.is_empty() {
            return self.get_task_flag(id).await;
        }

        let task_id = patch.task_id;
        let mut conn = self.conn().await?;
        let updated = conn
            .transaction::<_, StoreError, _>(|conn| {
                async move {
                    diesel::update(task_flags::table.find(id))
                        .set(&patch)
                        .returning(TaskFlag::as_returning())
                        .get_result(conn)
                        .await
                        .optional()
                        .classify(Write::Upsert {
                            task_id,
                            team_id: None,
                        })?
                        .ok_or(StoreError::not_found(Entity::TaskFlag, id))
                }
                .scope_boxed()
            })
            .await
            .inspect_err(|e| tracing::warn!("Rejected update of flag #{id}: {e}"))?;

        tracing::info!("Updated flag #{} of task #{}", updated.id, updated.task_id);
        Ok(updated)
    }

    pub async fn delete_task_flag(&self, id: i32) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                let deleted = diesel::delete(task_flags::table.find(id))
                    .execute(conn)
                    .await
                    .classify(Write::Delete {
                        entity: Entity::TaskFlag,
                        id,
                    })?;
                if deleted == 0 {
                    return Err(StoreError::not_found(Entity::TaskFlag, id));
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        tracing::info!("Deleted flag #{id}");
        Ok(())
    }
}
