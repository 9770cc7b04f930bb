// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Round trips against a live Postgres. These are ignored by default; run
//! them with `TEST_DATABASE_URL` set and `cargo test -- --ignored`.

use std::io::Cursor;

use chrono::{Duration, Utc};
use ctfplatform_store::models::{
    NewAnnouncement, NewAudit, NewTask, NewTaskFlag, NewTeam, NewTeamAvatar, TaskFlagPatch,
    TaskPatch, TeamPatch,
};
use ctfplatform_store::store::{AuditFilter, ListOptions, TeamFilter};
use ctfplatform_store::{ConstraintViolation, Entity, Store, StoreConfig, StoreError};
use image::{ImageFormat, Rgba, RgbaImage};
use rand::{Rng, distributions::Alphanumeric};

async fn store() -> Store {
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must point at a Postgres database for these tests");
    let mut config = StoreConfig::new(url);
    config.max_connections = 4;
    Store::open(&config).await.expect("Failed to open store")
}

fn suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect()
}

fn team(tag: &str) -> NewTeam {
    NewTeam {
        name: format!("team-{tag}"),
        email: format!("{tag}@example.org"),
        password: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        active: true,
        ..Default::default()
    }
}

fn task(tag: &str) -> NewTask {
    NewTask {
        name: format!("task-{tag}"),
        description: "Find the flag".to_string(),
        category: "misc".to_string(),
        difficult: "easy".to_string(),
        started_at: None,
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([40, 120, 200, 255]));
    let mut payload = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut payload), ImageFormat::Png)
        .expect("Failed to encode PNG");
    payload
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_competition_scenario() {
    let store = store().await;
    let tag = suffix();

    let alice = store.create_team(team(&tag)).await.unwrap();
    let mut same_name = team(&format!("{tag}-other"));
    same_name.name = alice.name.clone();
    let err = store.create_team(same_name).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::ConstraintViolation(ConstraintViolation::TeamName)
    ));

    let warmup = store.create_task(task(&tag)).await.unwrap();
    let flag = format!("FLAG{{{tag}}}");
    store
        .create_task_flag(NewTaskFlag {
            task_id: warmup.id,
            flag: flag.clone(),
        })
        .await
        .unwrap();
    let err = store
        .create_task_flag(NewTaskFlag {
            task_id: warmup.id,
            flag,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::ConstraintViolation(ConstraintViolation::FlagValue)
    ));

    let solve = NewAudit {
        task_id: warmup.id,
        team_id: alice.id,
    };
    store.create_audit(solve).await.unwrap();
    let err = store.create_audit(solve).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::ConstraintViolation(ConstraintViolation::AuditPair)
    ));

    let err = store.delete_team(alice.id).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::ConstraintViolation(ConstraintViolation::Referenced {
            entity: Entity::Team,
            by: Entity::Audit,
            ..
        })
    ));
    assert_eq!(store.get_team(alice.id).await.unwrap(), alice);

    let err = store.delete_task(warmup.id).await.unwrap_err();
    assert!(err.is_constraint_violation());

    store.close();
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_team_email_is_unique() {
    let store = store().await;
    let tag = suffix();

    let first = store.create_team(team(&tag)).await.unwrap();
    let mut same_email = team(&format!("{tag}-b"));
    same_email.email = first.email.clone();
    let err = store.create_team(same_email).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::ConstraintViolation(ConstraintViolation::TeamEmail)
    ));

    let other = store.create_team(team(&format!("{tag}-c"))).await.unwrap();
    let err = store
        .update_team(
            other.id,
            TeamPatch {
                email: Some(first.email.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_constraint_violation());
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_flags_are_unique_across_tasks() {
    let store = store().await;
    let tag = suffix();

    let first = store.create_task(task(&format!("{tag}-1"))).await.unwrap();
    let second = store.create_task(task(&format!("{tag}-2"))).await.unwrap();
    let flag = format!("FLAG{{shared-{tag}}}");
    store
        .create_task_flag(NewTaskFlag {
            task_id: first.id,
            flag: flag.clone(),
        })
        .await
        .unwrap();
    let err = store
        .create_task_flag(NewTaskFlag {
            task_id: second.id,
            flag,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::ConstraintViolation(ConstraintViolation::FlagValue)
    ));
    assert!(store.list_flags_for_task(second.id).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_round_trip_and_created_at_is_kept() {
    let store = store().await;
    let tag = suffix();

    let created = store.create_task(task(&tag)).await.unwrap();
    assert_eq!(store.get_task(created.id).await.unwrap(), created);

    let updated = store
        .update_task(
            created.id,
            TaskPatch {
                category: Some("web".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.category, "web");
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.created_at, created.created_at);

    let unchanged = store
        .update_task(created.id, TaskPatch::default())
        .await
        .unwrap();
    assert_eq!(unchanged, updated);
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_release_window() {
    let store = store().await;
    let tag = suffix();
    let now = Utc::now();

    let hidden = store.create_task(task(&tag)).await.unwrap();
    assert!(!hidden.is_released_at(now));

    let released = store
        .release_task(hidden.id, Some(now - Duration::minutes(5)))
        .await
        .unwrap();
    assert!(released.is_released_at(now));
    let visible = store.list_released_tasks(now).await.unwrap();
    assert!(visible.iter().any(|t| t.id == hidden.id));

    let withdrawn = store.release_task(hidden.id, None).await.unwrap();
    assert_eq!(withdrawn.started_at, None);
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_delete_task_removes_its_flags() {
    let store = store().await;
    let tag = suffix();

    let doomed = store.create_task(task(&tag)).await.unwrap();
    let flag = store
        .create_task_flag(NewTaskFlag {
            task_id: doomed.id,
            flag: format!("FLAG{{gone-{tag}}}"),
        })
        .await
        .unwrap();

    store.delete_task(doomed.id).await.unwrap();
    assert!(store.get_task(doomed.id).await.unwrap_err().is_not_found());
    assert!(store.get_task_flag(flag.id).await.unwrap_err().is_not_found());
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_missing_references_are_not_found() {
    let store = store().await;

    let err = store
        .create_task_flag(NewTaskFlag {
            task_id: i32::MAX,
            flag: format!("FLAG{{orphan-{}}}", suffix()),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound {
            entity: Entity::Task,
            ..
        }
    ));

    let err = store
        .update_task_flag(
            i32::MAX,
            TaskFlagPatch {
                flag: Some("FLAG{x}".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(store.delete_team(i32::MAX).await.unwrap_err().is_not_found());
    assert!(store.get_announcement(i32::MAX).await.unwrap_err().is_not_found());
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_validation_happens_before_writes() {
    let store = store().await;
    let tag = suffix();

    let mut blank = team(&tag);
    blank.name = "  ".to_string();
    assert!(store.create_team(blank).await.unwrap_err().is_validation());

    let found = store
        .list_teams(
            &TeamFilter {
                name_contains: Some(tag.clone()),
                ..Default::default()
            },
            &ListOptions::default(),
        )
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_avatar_set_and_clear() {
    let store = store().await;
    let tag = suffix();

    let owner = store.create_team(team(&tag)).await.unwrap();
    let stored = store
        .set_team_avatar(owner.id, png(64, 64))
        .await
        .unwrap()
        .expect("avatar should be stored");
    assert_eq!(store.get_team(owner.id).await.unwrap().avatar, stored.avatar_path);
    assert_eq!(
        store
            .get_avatar_by_path(&stored.avatar_path)
            .await
            .unwrap()
            .map(|a| a.team_id),
        Some(owner.id)
    );

    let replaced = store
        .set_team_avatar(owner.id, png(100, 90))
        .await
        .unwrap()
        .expect("avatar should be replaced");
    assert_eq!(replaced.id, stored.id);
    assert_ne!(replaced.avatar_path, stored.avatar_path);

    assert!(
        store
            .set_team_avatar(owner.id, png(300, 20))
            .await
            .unwrap_err()
            .is_validation()
    );

    assert_eq!(store.set_team_avatar(owner.id, Vec::new()).await.unwrap(), None);
    assert_eq!(store.get_team(owner.id).await.unwrap().avatar, "");
    assert!(store.get_avatar_for_team(owner.id).await.unwrap().is_none());

    let err = store
        .set_team_avatar(i32::MAX, png(64, 64))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_solves_and_announcements() {
    let store = store().await;
    let tag = suffix();
    let now = Utc::now();

    let mut released = task(&tag);
    released.started_at = Some(now - Duration::hours(1));
    let released = store.create_task(released).await.unwrap();
    let first = store.create_team(team(&format!("{tag}-1"))).await.unwrap();
    let second = store.create_team(team(&format!("{tag}-2"))).await.unwrap();
    for solver in [&first, &second] {
        store
            .create_audit(NewAudit {
                task_id: released.id,
                team_id: solver.id,
            })
            .await
            .unwrap();
    }

    let solves = store.solves_by_task(released.id, Utc::now()).await.unwrap();
    let solvers: Vec<_> = solves.iter().map(|s| s.team_name.clone()).collect();
    assert_eq!(solvers, vec![first.name.clone(), second.name.clone()]);

    let by_team = store
        .list_audits(
            &AuditFilter {
                team_id: Some(second.id),
                ..Default::default()
            },
            &ListOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_team.len(), 1);
    assert_eq!(by_team[0].task_id, released.id);

    let announcement = store
        .create_announcement(NewAnnouncement {
            title: format!("News {tag}"),
            description: "Scoreboard is live".to_string(),
        })
        .await
        .unwrap();
    let latest = store.latest_announcements(50).await.unwrap();
    assert!(latest.iter().any(|a| a.id == announcement.id));
    store.delete_announcement(announcement.id).await.unwrap();
    assert!(
        store
            .get_announcement(announcement.id)
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_team_rename_onto_existing_name() {
    let store = store().await;
    let tag = suffix();

    let taken = store.create_team(team(&format!("{tag}-a"))).await.unwrap();
    let other = store.create_team(team(&format!("{tag}-b"))).await.unwrap();
    let err = store
        .update_team(
            other.id,
            TeamPatch {
                name: Some(format!("  {}  ", taken.name)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::ConstraintViolation(ConstraintViolation::TeamName)
    ));
    assert_eq!(store.get_team(other.id).await.unwrap().name, other.name);
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_team_password_change_is_hashed() {
    let store = store().await;
    let tag = suffix();

    let owner = store.create_team(team(&tag)).await.unwrap();
    let updated = store
        .update_team(owner.id, TeamPatch::with_password("another secret").unwrap())
        .await
        .unwrap();
    assert!(updated.password.starts_with("$argon2"));
    assert_ne!(updated.password, owner.password);
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_one_avatar_per_team() {
    let store = store().await;
    let tag = suffix();

    let owner = store.create_team(team(&tag)).await.unwrap();
    let first = store
        .create_team_avatar(NewTeamAvatar {
            team_id: owner.id,
            avatar_path: format!("first-{tag}.png"),
            avatar: png(64, 64),
        })
        .await
        .unwrap();
    let err = store
        .create_team_avatar(NewTeamAvatar {
            team_id: owner.id,
            avatar_path: format!("second-{tag}.png"),
            avatar: png(64, 64),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::ConstraintViolation(ConstraintViolation::AvatarTeam)
    ));
    assert_eq!(store.get_team(owner.id).await.unwrap().avatar, first.avatar_path);
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_deleting_team_removes_its_avatar() {
    let store = store().await;
    let tag = suffix();

    let owner = store.create_team(team(&tag)).await.unwrap();
    let stored = store
        .set_team_avatar(owner.id, png(64, 64))
        .await
        .unwrap()
        .expect("avatar should be stored");

    store.delete_team(owner.id).await.unwrap();
    assert!(store.get_avatar_for_team(owner.id).await.unwrap().is_none());
    assert!(
        store
            .get_team_avatar(stored.id)
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(
        store
            .get_avatar_by_path(&stored.avatar_path)
            .await
            .unwrap()
            .is_none()
    );
}
