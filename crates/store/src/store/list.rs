// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Id,
    /// Falls back to `Id` for records without a creation time.
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Ordering and window of a listing. Every call re-runs the query, so a
/// listing can be restarted or walked page by page with `limit`/`offset`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListOptions {
    pub order_by: SortKey,
    pub order: SortOrder,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListOptions {
    pub fn newest_first() -> Self {
        Self {
            order_by: SortKey::CreatedAt,
            order: SortOrder::Descending,
            ..Default::default()
        }
    }

    pub fn page(self, limit: i64, offset: i64) -> Self {
        Self {
            limit: Some(limit.max(0)),
            offset: Some(offset.max(0)),
            ..self
        }
    }
}

/// Applies `ListOptions` to a boxed select. Ties on `created_at` are broken
/// by id so pages stay stable.
macro_rules! apply_list_options {
    ($query:expr, $options:expr, $id:expr, $created_at:expr) => {{
        use $crate::store::list::{SortKey, SortOrder};
        let options: &$crate::store::list::ListOptions = $options;
        let query = $query;
        let mut query = match (options.order_by, options.order) {
            (SortKey::Id, SortOrder::Ascending) => query.order($id.asc()),
            (SortKey::Id, SortOrder::Descending) => query.order($id.desc()),
            (SortKey::CreatedAt, SortOrder::Ascending) => {
                query.order(($created_at.asc(), $id.asc()))
            }
            (SortKey::CreatedAt, SortOrder::Descending) => {
                query.order(($created_at.desc(), $id.desc()))
            }
        };
        if let Some(limit) = options.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = options.offset {
            query = query.offset(offset);
        }
        query
    }};
}

pub(crate) use apply_list_options;
