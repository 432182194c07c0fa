// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application state controller.
//!
//! One controller backs one browser session. It owns the collection
//! subscription and everything derived from it: the user list, the
//! leaderboard and the signed-in user's record. The signed-in record is only
//! ever replaced by values read back from the store, never edited locally.
//!
//! Every user action returns its result and also queues a notice; failures
//! never escape as anything but a message, except that a vanished account
//! additionally signs the session out.
//!
//! Point awards and redemptions are read-modify-write with no
//! compare-and-swap at the store. Two admins adjusting the same account at
//! once can lose one of the updates, and a redemption racing an award can
//! overwrite it.

use std::sync::Arc;

use crate::config::Config;
use crate::db::{DocumentStore, Snapshot, Subscription};
use crate::error::AppError;
use crate::identity::IdentityProvider;
use crate::models::{leaderboard, User, UserId, UserPatch};
use crate::notify::{Delivered, Notice, Notifications};

pub const ACCOUNT_REMOVED: &str = "Your account was removed.";
pub const ACCOUNT_REMOVED_CONTACT_ADMIN: &str = "Your account was removed. Please contact an admin.";

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Mounted, waiting for the first snapshot.
    Loading,
    Unauthenticated,
    Authenticated,
    AuthenticatedAdmin,
}

/// Administrative switches that shape the sign-in screen.
#[derive(Debug, Clone)]
pub struct Features {
    pub signup_enabled: bool,
    pub signup_disabled_reason: String,
    pub signin_enabled: bool,
    pub initial_points: i64,
}

impl From<&Config> for Features {
    fn from(config: &Config) -> Self {
        Self {
            signup_enabled: config.signup_enabled,
            signup_disabled_reason: config.signup_disabled_reason.clone(),
            signin_enabled: config.signin_enabled,
            initial_points: config.initial_points,
        }
    }
}

pub struct Controller {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    features: Features,
    subscription: Option<Subscription>,
    loading: bool,
    /// Session id carried over from an earlier visit, resolved on the first snapshot
    restore: Option<UserId>,
    session: Option<User>,
    users: Snapshot,
    leaderboard: Vec<User>,
    notices: Notifications,
}

impl Controller {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        features: Features,
        restore: Option<UserId>,
    ) -> Self {
        Self {
            identity,
            store,
            features,
            subscription: None,
            loading: true,
            restore,
            session: None,
            users: Arc::new(Vec::new()),
            leaderboard: Vec::new(),
            notices: Notifications::default(),
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────

    /// Subscribe to the users collection. The controller stays in
    /// [`Phase::Loading`] until the first snapshot is applied.
    pub async fn mount(&mut self) -> Result<(), AppError> {
        self.subscription = Some(self.store.subscribe().await?);
        tracing::debug!("Controller mounted");
        Ok(())
    }

    /// Drop the subscription; no further snapshots are applied.
    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Wait for the next snapshot and apply it.
    ///
    /// Returns `false` if not mounted or the store has gone away.
    pub async fn next_snapshot(&mut self) -> bool {
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };
        match subscription.next().await {
            Some(snapshot) => {
                self.apply_snapshot(snapshot).await;
                true
            }
            None => false,
        }
    }

    /// Apply a pending snapshot, if any, without waiting.
    pub async fn refresh(&mut self) -> bool {
        let pending = self.subscription.as_mut().and_then(Subscription::try_next);
        match pending {
            Some(snapshot) => {
                self.apply_snapshot(snapshot).await;
                true
            }
            None => false,
        }
    }

    /// Leave the loading phase (waiting if needed) and catch up with the store.
    pub async fn settle(&mut self) {
        if self.loading {
            self.next_snapshot().await;
        }
        self.refresh().await;
    }

    async fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.leaderboard = leaderboard(&snapshot);
        self.users = snapshot;

        if self.loading {
            self.loading = false;
            if let Some(uid) = self.restore.take() {
                match self.find_user(&uid) {
                    Some(user) => {
                        tracing::info!(uid = %uid, "Session restored");
                        self.session = Some(user);
                    }
                    None => {
                        tracing::warn!(uid = %uid, "Restored session has no record");
                        self.end_session_for_removed_account(uid).await;
                    }
                }
            }
            tracing::debug!(phase = ?self.phase(), users = self.users.len(), "First snapshot applied");
            return;
        }

        let Some(uid) = self.session.as_ref().map(|u| u.id.clone()) else {
            return;
        };
        match self.find_user(&uid) {
            Some(user) => {
                if self.session.as_ref().map(User::is_admin) != Some(user.is_admin()) {
                    tracing::info!(uid = %uid, role = user.role.as_str(), "Role changed");
                }
                self.session = Some(user);
            }
            None => {
                tracing::warn!(uid = %uid, "Signed-in account disappeared from the store");
                self.end_session_for_removed_account(uid).await;
            }
        }
    }

    async fn end_session_for_removed_account(&mut self, uid: UserId) {
        self.notices.notify(Notice::error(ACCOUNT_REMOVED));
        self.identity.sign_out(&uid).await;
        self.session = None;
    }

    fn find_user(&self, uid: &UserId) -> Option<User> {
        self.users.iter().find(|u| &u.id == uid).cloned()
    }

    // ─── Queries ─────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        if self.loading {
            return Phase::Loading;
        }
        match &self.session {
            None => Phase::Unauthenticated,
            Some(user) if user.is_admin() => Phase::AuthenticatedAdmin,
            Some(_) => Phase::Authenticated,
        }
    }

    pub fn session(&self) -> Option<&User> {
        self.session.as_ref()
    }

    /// Session id, including one still waiting to be restored.
    pub fn session_id(&self) -> Option<&UserId> {
        self.session.as_ref().map(|u| &u.id).or(self.restore.as_ref())
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn leaderboard(&self) -> &[User] {
        &self.leaderboard
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Queue a notice raised outside the controller's own actions.
    pub fn notify(&mut self, notice: Notice) {
        self.notices.notify(notice);
    }

    /// Hand out queued notices.
    pub fn take_notices(&mut self) -> Delivered {
        self.notices.drain()
    }

    // ─── Actions ─────────────────────────────────────────────────

    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<(), AppError> {
        let result = self.try_sign_up(email, password).await;
        self.report(result)
    }

    async fn try_sign_up(&mut self, email: &str, password: &str) -> Result<(), AppError> {
        if !self.features.signup_enabled {
            return Err(AppError::ConfigDisabled(format!(
                "Sign-up has been disabled by admin due to: {}",
                self.features.signup_disabled_reason
            )));
        }

        let email = email.trim();
        let uid = self.identity.sign_up(email, password).await?;
        let user = User::new_account(uid.clone(), email, self.features.initial_points);

        if let Err(e) = self.store.set_record(&user).await {
            // The identity exists but has no record; do not leave it signed in
            self.identity.sign_out(&uid).await;
            return Err(e);
        }

        tracing::info!(uid = %uid, points = user.points, "Account created");
        self.session = Some(user);
        self.loading = false;
        self.refresh().await;
        self.notices.notify(Notice::success("Account created successfully"));
        Ok(())
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), AppError> {
        let result = self.try_sign_in(email, password).await;
        self.report(result)
    }

    async fn try_sign_in(&mut self, email: &str, password: &str) -> Result<(), AppError> {
        if !self.features.signin_enabled {
            return Err(AppError::ConfigDisabled(
                "Sign-in has been disabled by admin".to_string(),
            ));
        }

        let uid = self.identity.sign_in(email.trim(), password).await?;

        let Some(user) = self.store.get_record(&uid).await? else {
            tracing::warn!(uid = %uid, "Signed in identity has no record");
            self.identity.sign_out(&uid).await;
            self.session = None;
            return Err(AppError::NotFound(ACCOUNT_REMOVED_CONTACT_ADMIN.to_string()));
        };

        tracing::info!(uid = %uid, role = user.role.as_str(), "Signed in");
        self.session = Some(user);
        self.loading = false;
        self.refresh().await;
        self.notices.notify(Notice::success("Signed in successfully"));
        Ok(())
    }

    pub async fn sign_out(&mut self) {
        self.restore = None;
        if let Some(user) = self.session.take() {
            self.identity.sign_out(&user.id).await;
            tracing::info!(uid = %user.id, "Signed out");
            self.notices.notify(Notice::info("Signed out"));
        }
    }

    /// Add `delta` (negative revokes) to a user's points. Returns the new balance.
    ///
    /// No floor is applied; balances may go negative.
    pub async fn award_points(&mut self, target: &UserId, delta: i64) -> Result<i64, AppError> {
        let result = self.try_award_points(target, delta).await;
        self.report(result)
    }

    async fn try_award_points(&mut self, target: &UserId, delta: i64) -> Result<i64, AppError> {
        let current = self
            .store
            .get_record(target)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", target)))?;

        let points = current
            .points
            .checked_add(delta)
            .ok_or_else(|| AppError::BadRequest("Point balance out of range".to_string()))?;

        self.store
            .update_fields(target, &UserPatch::points(points))
            .await?;

        tracing::info!(
            uid = %target,
            delta,
            points,
            by = ?self.session.as_ref().map(|u| &u.id),
            "Points adjusted"
        );
        self.refresh().await;
        self.notices.notify(Notice::success(format!(
            "{} {} points",
            if delta > 0 { "Awarded" } else { "Revoked" },
            delta.unsigned_abs()
        )));
        Ok(points)
    }

    /// Spend `cost` points of the signed-in user on `badge`.
    ///
    /// The balance check uses the last confirmed record; on success points
    /// and badges are written in a single update.
    pub async fn redeem_badge(&mut self, badge: &str, cost: i64) -> Result<(), AppError> {
        let result = self.try_redeem_badge(badge, cost).await;
        self.report(result)
    }

    async fn try_redeem_badge(&mut self, badge: &str, cost: i64) -> Result<(), AppError> {
        if cost < 0 {
            return Err(AppError::BadRequest("Badge cost cannot be negative".to_string()));
        }
        let user = self.session.as_ref().ok_or(AppError::Unauthorized)?;

        if user.points < cost {
            return Err(AppError::InsufficientPoints {
                available: user.points,
                cost,
            });
        }

        let mut badges = user.badges.clone();
        badges.push(badge.to_string());
        let patch = UserPatch {
            points: Some(user.points - cost),
            badges: Some(badges),
        };
        let uid = user.id.clone();

        self.store.update_fields(&uid, &patch).await?;

        tracing::info!(uid = %uid, badge, cost, "Badge redeemed");
        self.refresh().await;
        self.notices.notify(Notice::success(format!(
            "Redeemed {} for {} points",
            badge, cost
        )));
        Ok(())
    }

    fn report<T>(&mut self, result: Result<T, AppError>) -> Result<T, AppError> {
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Action failed");
            self.notices.notify(Notice::error(e.to_string()));
        }
        result
    }
}
