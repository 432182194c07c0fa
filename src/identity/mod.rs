// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider seam: email/password accounts.
//!
//! Account existence here is independent of the `users` collection; an
//! identity can exist without a matching record.

pub mod firebase;
pub mod memory;

pub use firebase::FirebaseAuth;
pub use memory::MemoryIdentity;

use crate::error::AuthError;
use crate::models::UserId;
use async_trait::async_trait;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and sign it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserId, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, AuthError>;

    /// Drop the session token held for `uid`. Never fails.
    async fn sign_out(&self, uid: &UserId);

    /// Whether a session token is currently held for `uid`.
    fn has_session(&self, uid: &UserId) -> bool;
}
