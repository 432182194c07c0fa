// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document store tests against the Firestore emulator.
//!
//! Skipped unless FIRESTORE_EMULATOR_HOST is set.

use slauson_points::db::DocumentStore;
use slauson_points::error::AppError;
use slauson_points::models::{Role, User, UserId, UserPatch};
use slauson_points::random::random_hex;

mod common;
use common::test_db;

fn unique_user(points: i64) -> User {
    let id = UserId::new(format!("test-{}", random_hex::<8>().unwrap()));
    let email = format!("{}@example.com", id);
    User::new_account(id, email, points)
}

#[tokio::test]
async fn test_set_and_get_record() {
    require_emulator!();
    let db = test_db().await;
    let user = unique_user(10);

    db.set_record(&user).await.unwrap();
    let stored = db.get_record(&user.id).await.unwrap().unwrap();
    assert_eq!(stored, user);
    assert_eq!(stored.role, Role::User);
    assert!(stored.badges.is_empty());
}

#[tokio::test]
async fn test_missing_record_is_none() {
    require_emulator!();
    let db = test_db().await;
    let missing = db.get_record(&UserId::from("test-does-not-exist")).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_update_fields_leaves_other_fields() {
    require_emulator!();
    let db = test_db().await;
    let mut user = unique_user(25);
    user.role = Role::Admin;
    db.set_record(&user).await.unwrap();

    let patch = UserPatch {
        points: Some(5),
        badges: Some(vec!["Rank".to_string()]),
    };
    db.update_fields(&user.id, &patch).await.unwrap();

    let stored = db.get_record(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.points, 5);
    assert_eq!(stored.badges, vec!["Rank".to_string()]);
    assert_eq!(stored.email, user.email);
    assert_eq!(stored.role, Role::Admin);
}

#[tokio::test]
async fn test_update_missing_record_fails() {
    require_emulator!();
    let db = test_db().await;
    let ghost = unique_user(0);

    let patch = UserPatch {
        points: Some(1),
        badges: None,
    };
    let err = db.update_fields(&ghost.id, &patch).await.unwrap_err();
    assert!(matches!(err, AppError::Write(_)));
    assert!(db.get_record(&ghost.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_subscription_sees_writes() {
    require_emulator!();
    let db = test_db().await;
    let mut subscription = db.subscribe().await.unwrap();
    subscription.next().await.unwrap();

    let user = unique_user(3);
    db.set_record(&user).await.unwrap();

    let snapshot = subscription.next().await.unwrap();
    assert!(snapshot.iter().any(|u| u.id == user.id));
}
