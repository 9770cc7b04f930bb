// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashMap;
use std::error::Error;
use std::io::Write;

use ctfplatform_store::store::{AuditFilter, ListOptions, TaskFilter, TaskFlagFilter, TeamFilter};
use ctfplatform_store::views::{AnnouncementRow, AuditRow, TaskFlagRow, TaskRow, TeamRow};
use ctfplatform_store::{Store, StoreConfig, db};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "usage: ctfplatform-store <migrate | list <teams|tasks|flags|audits|announcements>>";

fn print_rows<T: Serialize>(
    rows: impl IntoIterator<Item = T>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stdout().lock();
    for row in rows {
        serde_json::to_writer(&mut out, &row)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

async fn list(store: &Store, entity: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
    let options = ListOptions::default();
    match entity {
        "teams" => {
            let teams = store.list_teams(&TeamFilter::default(), &options).await?;
            print_rows(teams.iter().map(TeamRow::from))
        }
        "tasks" => {
            let tasks = store.list_tasks(&TaskFilter::default(), &options).await?;
            print_rows(tasks.iter().map(TaskRow::from))
        }
        "flags" => {
            let names: HashMap<i32, String> = store
                .list_tasks(&TaskFilter::default(), &options)
                .await?
                .into_iter()
                .map(|task| (task.id, task.name))
                .collect();
            let flags = store
                .list_task_flags(&TaskFlagFilter::default(), &options)
                .await?;
            print_rows(flags.iter().map(|flag| {
                let task_name = names.get(&flag.task_id).cloned().unwrap_or_default();
                TaskFlagRow::new(flag, task_name)
            }))
        }
        "audits" => {
            let entries = store
                .list_audit_entries(&AuditFilter::default(), &ListOptions::newest_first())
                .await?;
            print_rows(entries.iter().map(AuditRow::from))
        }
        "announcements" => {
            let announcements = store.list_announcements(&options).await?;
            print_rows(announcements.iter().map(AnnouncementRow::from))
        }
        other => Err(format!("unknown entity {other}\n{USAGE}").into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = StoreConfig::from_env()?;

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["migrate"] => {
            db::migrate(&config.database_url).await?;
            tracing::info!("Database is up to date");
        }
        ["list", entity] => {
            // Listing never changes the schema.
            let config = StoreConfig {
                run_migrations: false,
                ..config
            };
            let store = Store::open(&config).await?;
            let result = list(&store, entity).await;
            store.close();
            result?;
        }
        _ => return Err(USAGE.into()),
    }
    Ok(())
}
