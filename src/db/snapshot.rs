// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collection snapshots and their fan-out to subscribers.

use std::sync::Arc;
use tokio::sync::watch;

use crate::models::User;

/// Full contents of the `users` collection at one point in time.
pub type Snapshot = Arc<Vec<User>>;

/// Latest snapshot plus the channel subscribers listen on.
///
/// Publishing a snapshot equal to the current one is a no-op, so
/// subscribers only wake up on real changes.
pub struct SnapshotHub {
    tx: watch::Sender<Snapshot>,
}

impl Default for SnapshotHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotHub {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Vec::new()));
        Self { tx }
    }

    /// Replace the current snapshot. Returns `true` if subscribers were notified.
    pub fn publish(&self, users: Vec<User>) -> bool {
        self.tx.send_if_modified(|current| {
            if **current == users {
                false
            } else {
                *current = Arc::new(users);
                true
            }
        })
    }

    pub fn current(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription::new(self.tx.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A live subscription to the collection.
///
/// Dropping the subscription (or calling [`Subscription::unsubscribe`])
/// stops delivery.
pub struct Subscription {
    rx: watch::Receiver<Snapshot>,
    /// The snapshot current at subscribe time has not been handed out yet
    initial_pending: bool,
}

impl Subscription {
    fn new(rx: watch::Receiver<Snapshot>) -> Self {
        Self {
            rx,
            initial_pending: true,
        }
    }

    /// Wait for the next snapshot. `None` once the store has gone away.
    pub async fn next(&mut self) -> Option<Snapshot> {
        if self.initial_pending {
            self.initial_pending = false;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Take a pending snapshot without waiting.
    pub fn try_next(&mut self) -> Option<Snapshot> {
        if self.initial_pending {
            self.initial_pending = false;
            return Some(self.rx.borrow_and_update().clone());
        }
        match self.rx.has_changed() {
            Ok(true) => Some(self.rx.borrow_and_update().clone()),
            _ => None,
        }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        tracing::debug!("Collection subscription closed");
    }
}
