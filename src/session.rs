// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registry of per-browser controllers.
//!
//! Each browser session owns one [`Controller`], found by the random key in
//! its session cookie. Controllers that have not been used for a while are
//! dropped, which also drops their collection subscription.

use dashmap::DashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::controller::{Controller, Features};
use crate::db::DocumentStore;
use crate::error::AppError;
use crate::identity::IdentityProvider;
use crate::models::UserId;
use crate::random;

/// One browser session's controller plus bookkeeping.
pub struct SessionSlot {
    pub controller: Mutex<Controller>,
    last_seen: StdMutex<Instant>,
}

impl SessionSlot {
    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .elapsed()
    }
}

/// The caller's session, attached to each request by the session middleware.
#[derive(Clone)]
pub struct SessionHandle {
    pub key: String,
    pub slot: Arc<SessionSlot>,
}

pub struct SessionRegistry {
    slots: DashMap<String, Arc<SessionSlot>>,
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    features: Features,
}

impl SessionRegistry {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        features: Features,
    ) -> Self {
        Self {
            slots: DashMap::new(),
            identity,
            store,
            features,
        }
    }

    /// Find the controller for `key`, or mount a new one.
    ///
    /// A new controller starts from `restore`, the user id remembered in the
    /// cookie, and resolves it against the first snapshot.
    pub async fn open(
        &self,
        key: Option<String>,
        restore: Option<UserId>,
    ) -> Result<SessionHandle, AppError> {
        if let Some(key) = &key {
            if let Some(slot) = self.slots.get(key).map(|s| Arc::clone(&*s)) {
                slot.touch();
                return Ok(SessionHandle {
                    key: key.clone(),
                    slot,
                });
            }
        }

        let key = match key {
            Some(key) => key,
            None => random::random_hex::<16>()?,
        };

        let mut controller = Controller::new(
            Arc::clone(&self.identity),
            Arc::clone(&self.store),
            self.features.clone(),
            restore,
        );
        controller.mount().await?;

        let fresh = Arc::new(SessionSlot {
            controller: Mutex::new(controller),
            last_seen: StdMutex::new(Instant::now()),
        });

        // A concurrent request may have mounted one first; keep that one
        let slot = Arc::clone(&*self.slots.entry(key.clone()).or_insert(fresh));
        tracing::debug!(sessions = self.slots.len(), "Session opened");
        Ok(SessionHandle { key, slot })
    }

    /// Drop controllers idle for longer than `max_idle`. Returns how many.
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.idle_for() < max_idle);
        let pruned = before.saturating_sub(self.slots.len());
        if pruned > 0 {
            tracing::info!(pruned, remaining = self.slots.len(), "Pruned idle sessions");
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Periodically prune idle controllers.
    pub fn spawn_pruner(self: &Arc<Self>, max_idle: Duration) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(max_idle.max(Duration::from_secs(1)) / 2);
            loop {
                interval.tick().await;
                registry.prune_idle(max_idle);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::controller::Phase;
    use crate::db::MemoryStore;
    use crate::identity::MemoryIdentity;
    use crate::models::User;

    fn registry(store: MemoryStore) -> SessionRegistry {
        SessionRegistry::new(
            Arc::new(MemoryIdentity::new()),
            Arc::new(store),
            Features::from(&Config::test_default()),
        )
    }

    #[tokio::test]
    async fn test_open_reuses_known_key() {
        let reg = registry(MemoryStore::new());
        let first = reg.open(None, None).await.unwrap();
        let second = reg.open(Some(first.key.clone()), None).await.unwrap();
        assert!(Arc::ptr_eq(&first.slot, &second.slot));
        assert_eq!(reg.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_key_restores_user() {
        let store = MemoryStore::with_users(vec![User::new_account("u1".into(), "a@b.c", 3)]);
        let reg = registry(store);

        let handle = reg
            .open(Some("stale-key".to_string()), Some("u1".into()))
            .await
            .unwrap();
        assert_eq!(handle.key, "stale-key");

        let mut controller = handle.slot.controller.lock().await;
        controller.settle().await;
        assert_eq!(controller.phase(), Phase::Authenticated);
    }

    #[tokio::test]
    async fn test_prune_idle() {
        let store = MemoryStore::new();
        let reg = registry(store.clone());
        let handle = reg.open(None, None).await.unwrap();
        drop(handle);

        assert_eq!(reg.prune_idle(Duration::from_secs(3600)), 0);
        assert_eq!(reg.prune_idle(Duration::ZERO), 1);
        assert!(reg.is_empty());
    }
}
