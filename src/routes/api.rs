// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON API routes.

use axum::{routing::get, Extension, Json, Router};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::leaderboard::{entries, LeaderboardEntry};
use crate::models::User;
use crate::session::SessionHandle;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/leaderboard", get(get_leaderboard))
        .route("/api/me", get(get_me))
}

/// Current leaderboard, highest points first.
async fn get_leaderboard(
    Extension(session): Extension<SessionHandle>,
) -> Json<Vec<LeaderboardEntry>> {
    let mut controller = session.slot.controller.lock().await;
    controller.settle().await;
    Json(entries(controller.leaderboard()))
}

/// Get the signed-in user's record.
async fn get_me(Extension(session): Extension<SessionHandle>) -> Result<Json<User>> {
    let mut controller = session.slot.controller.lock().await;
    controller.settle().await;
    controller
        .session()
        .cloned()
        .map(Json)
        .ok_or(AppError::Unauthorized)
}
