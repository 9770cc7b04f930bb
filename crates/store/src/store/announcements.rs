// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl, scoped_futures::ScopedFutureExt};

use super::Store;
use super::list::{ListOptions, apply_list_options};
use crate::db::models::{Announcement, AnnouncementPatch, NewAnnouncement};
use crate::db::schema::announcement;
use crate::error::{ClassifyWrite, Entity, StoreError, Write};
use crate::validation::Validate;

impl Store {
    pub async fn create_announcement(
        &self,
        new_announcement: NewAnnouncement,
    ) -> Result<Announcement, StoreError> {
        new_announcement.validate()?;

        let mut conn = self.conn().await?;
        let created = conn
            .transaction::<_, StoreError, _>(|conn| {
                async move {
                    diesel::insert_into(announcement::table)
                        .values(&new_announcement)
                        .returning(Announcement::as_returning())
                        .get_result(conn)
                        .await
                        .classify(Write::plain())
                }
                .scope_boxed()
            })
            .await?;

        tracing::info!("Published announcement {} (#{})", created.title, created.id);
        Ok(created)
    }

    pub async fn get_announcement(&self, id: i32) -> Result<Announcement, StoreError> {
        announcement::table
            .find(id)
            .select(Announcement::as_select())
            .first(&mut self.conn().await?)
            .await
            .optional()?
            .ok_or(StoreError::not_found(Entity::Announcement, id))
    }

    pub async fn list_announcements(
        &self,
        options: &ListOptions,
    ) -> Result<Vec<Announcement>, StoreError> {
        let query = announcement::table
            .select(Announcement::as_select())
            .into_boxed();
        let query = apply_list_options!(
            query,
            options,
            announcement::id,
            announcement::created_at
        );

        Ok(query.load(&mut self.conn().await?).await?)
    }

    /// The newest announcements, as shown on the competition front page.
    pub async fn latest_announcements(&self, limit: i64) -> Result<Vec<Announcement>, StoreError> {
        self.list_announcements(&ListOptions::newest_first().page(limit, 0))
            .await
    }

    pub async fn update_announcement(
        &self,
        id: i32,
        patch: AnnouncementPatch,
    ) -> Result<Announcement, StoreError> {
        patch.validate()?;
        if patch.is_empty() {
            return self.get_announcement(id).await;
        }

        let mut conn = self.conn().await?;
        let updated = conn
            .transaction::<_, StoreError, _>(|conn| {
                async move {
                    diesel::update(announcement::table.find(id))
                        .set(&patch)
                        .returning(Announcement::as_returning())
                        .get_result(conn)
                        .await
                        .optional()
                        .classify(Write::plain())?
                        .ok_or(StoreError::not_found(Entity::Announcement, id))
                }
                .scope_boxed()
            })
            .await?;

        tracing::info!("Updated announcement #{id}");
        Ok(updated)
    }

    pub async fn delete_announcement(&self, id: i32) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                let deleted = diesel::delete(announcement::table.find(id))
                    .execute(conn)
                    .await?;
                if deleted == 0 {
                    return Err(StoreError::not_found(Entity::Announcement, id));
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        tracing::info!("Deleted announcement #{id}");
        Ok(())
    }
}
