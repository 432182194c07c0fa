// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process identity provider for local development and tests.
//!
//! Passwords are stored as salted SHA-256 digests and compared in constant
//! time. The password policy matches the hosted provider: at least six
//! characters.

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::AuthError;
use crate::identity::IdentityProvider;
use crate::models::UserId;
use crate::random;

pub const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    uid: UserId,
    salt: [u8; 16],
    digest: [u8; 32],
}

fn digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

#[derive(Clone, Default)]
pub struct MemoryIdentity {
    /// Accounts keyed by lowercased email
    accounts: Arc<DashMap<String, Account>>,
    sessions: Arc<DashMap<UserId, ()>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a provider outage: every call fails with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), AuthError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthError::Unavailable("identity service offline".to_string()));
        }
        Ok(())
    }

    /// Register an account under a known uid, so it can be paired with an
    /// existing record.
    pub fn insert_account(
        &self,
        uid: UserId,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        validate(email, password)?;
        let salt = random::random_bytes::<16>()
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;
        match self.accounts.entry(email.trim().to_lowercase()) {
            Entry::Occupied(_) => Err(AuthError::EmailExists),
            Entry::Vacant(slot) => {
                slot.insert(Account {
                    uid,
                    salt,
                    digest: digest(&salt, password),
                });
                Ok(())
            }
        }
    }
}

fn validate(email: &str, password: &str) -> Result<(), AuthError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
        _ => return Err(AuthError::InvalidEmail),
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword(format!(
            "Password should be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        self.check_available()?;
        let uid = UserId::new(
            random::random_hex::<20>().map_err(|e| AuthError::Unavailable(e.to_string()))?,
        );
        self.insert_account(uid.clone(), email, password)?;
        self.sessions.insert(uid.clone(), ());
        tracing::info!(uid = %uid, "Identity created");
        Ok(uid)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        self.check_available()?;
        let account = self
            .accounts
            .get(&email.trim().to_lowercase())
            .ok_or(AuthError::InvalidCredentials)?;

        let candidate = digest(&account.salt, password);
        if !bool::from(candidate[..].ct_eq(&account.digest[..])) {
            return Err(AuthError::InvalidCredentials);
        }

        let uid = account.uid.clone();
        drop(account);
        self.sessions.insert(uid.clone(), ());
        tracing::info!(uid = %uid, "Identity signed in");
        Ok(uid)
    }

    async fn sign_out(&self, uid: &UserId) {
        self.sessions.remove(uid);
    }

    fn has_session(&self, uid: &UserId) -> bool {
        self.sessions.contains_key(uid)
    }
}
