// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store for local development and tests.
//!
//! Records are kept in insertion order, which is also the snapshot order.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::config::AdminSeed;
use crate::db::{DocumentStore, SnapshotHub, Subscription};
use crate::error::AppError;
use crate::identity::IdentityProvider;
use crate::models::{Role, User, UserId, UserPatch};

#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<Vec<User>>>,
    hub: Arc<SnapshotHub>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `users`, in order.
    pub fn with_users(users: Vec<User>) -> Self {
        let store = Self::new();
        store.mutate(|records| *records = users);
        store
    }

    /// Remove a record, as an operator editing the backing store would.
    ///
    /// Returns `false` if there was nothing to remove.
    pub fn delete_record(&self, id: &UserId) -> bool {
        let removed = self.mutate(|records| {
            let before = records.len();
            records.retain(|u| &u.id != id);
            records.len() != before
        });
        if removed {
            tracing::info!(uid = %id, "Record deleted");
        }
        removed
    }

    /// Create an admin account in `identity` with a matching record here.
    pub async fn seed_admin(
        &self,
        identity: &dyn IdentityProvider,
        seed: &AdminSeed,
    ) -> Result<User, AppError> {
        let uid = identity.sign_up(&seed.email, &seed.password).await?;
        identity.sign_out(&uid).await;

        let mut admin = User::new_account(uid, seed.email.clone(), 0);
        admin.role = Role::Admin;
        self.set_record(&admin).await?;

        tracing::info!(uid = %admin.id, email = %admin.email, "Seeded admin account");
        Ok(admin)
    }

    /// Run `f` under the write lock and publish the resulting snapshot.
    ///
    /// Publishing happens before the lock is released, so snapshots reach
    /// the hub in write order.
    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<User>) -> R) -> R {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let result = f(&mut records);
        self.hub.publish(records.clone());
        result
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn subscribe(&self) -> Result<Subscription, AppError> {
        Ok(self.hub.subscribe())
    }

    async fn list_records(&self) -> Result<Vec<User>, AppError> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    async fn get_record(&self, id: &UserId) -> Result<Option<User>, AppError> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|u| &u.id == id)
            .cloned())
    }

    async fn set_record(&self, user: &User) -> Result<(), AppError> {
        self.mutate(|records| match records.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user.clone(),
            None => records.push(user.clone()),
        });
        Ok(())
    }

    async fn update_fields(&self, id: &UserId, patch: &UserPatch) -> Result<(), AppError> {
        self.mutate(|records| match records.iter_mut().find(|u| &u.id == id) {
            Some(user) => {
                patch.apply(user);
                Ok(())
            }
            None => Err(AppError::Write(format!("record {} no longer exists", id))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::identity::MemoryIdentity;

    fn user(id: &str, points: i64) -> User {
        User::new_account(id.into(), format!("{}@example.com", id), points)
    }

    #[tokio::test]
    async fn test_update_fields_on_missing_record_fails() {
        let store = MemoryStore::new();
        let err = store
            .update_fields(&"nobody".into(), &UserPatch::points(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Write(_)));
        assert!(store.list_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_fields_is_partial() {
        let store = MemoryStore::with_users(vec![user("a", 10)]);
        store
            .update_fields(&"a".into(), &UserPatch::points(3))
            .await
            .unwrap();

        let a = store.get_record(&"a".into()).await.unwrap().unwrap();
        assert_eq!(a.points, 3);
        assert_eq!(a.email, "a@example.com");
    }

    #[tokio::test]
    async fn test_set_record_replaces_in_place() {
        let store = MemoryStore::with_users(vec![user("a", 1), user("b", 2)]);
        let mut replacement = user("a", 50);
        replacement.badges.push("Rank".to_string());
        store.set_record(&replacement).await.unwrap();

        let records = store.list_records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], replacement);
    }

    #[tokio::test]
    async fn test_writes_reach_subscribers() {
        let store = MemoryStore::with_users(vec![user("a", 1)]);
        let mut sub = store.subscribe().await.unwrap();
        assert_eq!(sub.next().await.unwrap().len(), 1);

        store.set_record(&user("b", 2)).await.unwrap();
        assert_eq!(sub.next().await.unwrap().len(), 2);

        assert!(store.delete_record(&"a".into()));
        let snapshot = sub.next().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id.as_str(), "b");

        assert!(!store.delete_record(&"a".into()));
    }

    #[tokio::test]
    async fn test_seed_admin_can_sign_in() {
        let identity = MemoryIdentity::new();
        let store = MemoryStore::new();
        let seed = AdminSeed {
            email: "admin@example.com".to_string(),
            password: "changeme".to_string(),
        };

        let admin = store.seed_admin(&identity, &seed).await.unwrap();
        assert!(admin.is_admin());
        assert!(!identity.has_session(&admin.id));

        let uid = identity.sign_in("admin@example.com", "changeme").await.unwrap();
        assert_eq!(uid, admin.id);
        let record = store.get_record(&uid).await.unwrap().unwrap();
        assert_eq!(record.role, Role::Admin);

        let err = store.seed_admin(&identity, &seed).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::EmailExists)));
        assert_eq!(store.list_records().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_leave_latest_snapshot() {
        let ids: Vec<String> = (0..8).map(|i| format!("u{}", i)).collect();
        let store = MemoryStore::with_users(ids.iter().map(|id| user(id, 0)).collect());

        let mut tasks = Vec::new();
        for id in ids.clone() {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                for points in 1..=50 {
                    store
                        .update_fields(&id.as_str().into(), &UserPatch::points(points))
                        .await
                        .unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let records = store.list_records().await.unwrap();
        assert!(records.iter().all(|u| u.points == 50));
        assert_eq!(*store.hub.current(), records);
    }
}
