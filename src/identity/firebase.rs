// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity Toolkit (Firebase Auth) REST client.
//!
//! Handles:
//! - Account creation (`accounts:signUp`)
//! - Password sign-in (`accounts:signInWithPassword`)
//! - Mapping provider error codes to [`AuthError`]

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::AuthError;
use crate::identity::IdentityProvider;
use crate::models::UserId;

const PRODUCTION_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Identity Toolkit client.
#[derive(Clone)]
pub struct FirebaseAuth {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    /// ID tokens of signed-in accounts, keyed by uid
    id_tokens: Arc<DashMap<UserId, String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseAuth {
    /// Create a client for the given web API key.
    ///
    /// For local development with the Auth emulator, set FIREBASE_AUTH_EMULATOR_HOST.
    pub fn new(api_key: String) -> Self {
        let base_url = match std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            Ok(host) => {
                tracing::info!(host = %host, "Using Firebase Auth emulator");
                format!("http://{}/identitytoolkit.googleapis.com/v1", host)
            }
            Err(_) => PRODUCTION_BASE_URL.to_string(),
        };
        Self::with_base_url(api_key, base_url)
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
            id_tokens: Arc::new(DashMap::new()),
        }
    }

    async fn password_call(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<UserId, AuthError> {
        let url = format!("{}/accounts:{}", self.base_url, endpoint);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => map_provider_error(&envelope.error.message),
                Err(_) => AuthError::Unavailable(format!("HTTP {}: {}", status, body)),
            });
        }

        let body: PasswordResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(format!("Malformed response: {}", e)))?;

        let uid = UserId::new(body.local_id);
        if let Some(token) = body.id_token {
            self.id_tokens.insert(uid.clone(), token);
        }
        Ok(uid)
    }
}

/// Translate an Identity Toolkit error code into an [`AuthError`].
///
/// Codes may carry a detail suffix, e.g.
/// `WEAK_PASSWORD : Password should be at least 6 characters`.
pub fn map_provider_error(message: &str) -> AuthError {
    let (code, detail) = match message.split_once(" : ") {
        Some((code, detail)) => (code.trim(), Some(detail.trim())),
        None => (message.trim(), None),
    };

    match code {
        "EMAIL_EXISTS" => AuthError::EmailExists,
        "EMAIL_NOT_FOUND"
        | "INVALID_PASSWORD"
        | "INVALID_LOGIN_CREDENTIALS"
        | "MISSING_PASSWORD" => AuthError::InvalidCredentials,
        "WEAK_PASSWORD" => AuthError::WeakPassword(
            detail
                .unwrap_or("Password should be at least 6 characters")
                .to_string(),
        ),
        "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail,
        "USER_DISABLED" => AuthError::UserDisabled,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthError::TooManyAttempts,
        _ => AuthError::Unavailable(message.to_string()),
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        let uid = self.password_call("signUp", email, password).await?;
        tracing::info!(uid = %uid, "Identity created");
        Ok(uid)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        let uid = self
            .password_call("signInWithPassword", email, password)
            .await?;
        tracing::info!(uid = %uid, "Identity signed in");
        Ok(uid)
    }

    async fn sign_out(&self, uid: &UserId) {
        // ID tokens are bearer tokens; forgetting ours is all sign-out means here
        self.id_tokens.remove(uid);
    }

    fn has_session(&self, uid: &UserId) -> bool {
        self.id_tokens.contains_key(uid)
    }
}
