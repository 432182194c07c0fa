// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie middleware.
//!
//! The cookie is an HS256 JWT naming the controller key and, once signed in,
//! the user id. It is reissued on every response so that it always reflects
//! the controller's current session.

use crate::models::UserId;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "points_session";

const SESSION_TTL_DAYS: i64 = 30;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (controller key)
    pub sub: String,
    /// Signed-in user, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Create a session JWT.
pub fn create_jwt(key: &str, uid: Option<&UserId>, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: key.to_string(),
        uid: uid.map(ToString::to_string),
        iat: now,
        exp: now + SESSION_TTL_DAYS as usize * 24 * 60 * 60,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Decode a session JWT; `None` if invalid or expired.
pub fn decode_jwt(token: &str, signing_key: &[u8]) -> Option<Claims> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_TTL_DAYS))
        .build()
}

/// Middleware that attaches the caller's [`crate::session::SessionHandle`] and refreshes the cookie.
pub async fn with_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| decode_jwt(cookie.value(), &state.config.jwt_signing_key));

    let (key, restore) = match claims {
        Some(claims) => (Some(claims.sub), claims.uid.map(UserId::new)),
        None => (None, None),
    };

    let handle = match state.sessions.open(key, restore).await {
        Ok(handle) => handle,
        Err(e) => return e.into_response(),
    };
    request.extensions_mut().insert(handle.clone());

    let response = next.run(request).await;

    let uid = handle.slot.controller.lock().await.session_id().cloned();
    match create_jwt(&handle.key, uid.as_ref(), &state.config.jwt_signing_key) {
        Ok(token) => (jar.add(session_cookie(token)), response).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to issue session cookie");
            response
        }
    }
}
