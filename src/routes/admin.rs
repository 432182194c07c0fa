// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin routes: awarding and revoking points.

use axum::{response::Redirect, routing::post, Extension, Form, Router};
use serde::Deserialize;
use std::sync::Arc;

use crate::controller::Phase;
use crate::error::{AppError, Result};
use crate::models::UserId;
use crate::session::SessionHandle;
use crate::view::ADMIN_DELTAS;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/admin/points", post(adjust_points))
}

#[derive(Deserialize)]
pub struct AdjustPointsForm {
    user_id: String,
    delta: i64,
}

/// Apply one of the panel's fixed point adjustments to a user.
async fn adjust_points(
    Extension(session): Extension<SessionHandle>,
    Form(form): Form<AdjustPointsForm>,
) -> Result<Redirect> {
    if !ADMIN_DELTAS.contains(&form.delta) {
        return Err(AppError::BadRequest(format!(
            "Unsupported point adjustment {}",
            form.delta
        )));
    }

    let mut controller = session.slot.controller.lock().await;
    controller.settle().await;

    // Role comes from the live record, so a demoted admin is refused at once
    if controller.phase() != Phase::AuthenticatedAdmin {
        tracing::warn!(
            uid = ?controller.session().map(|u| &u.id),
            target = %form.user_id,
            "Non-admin attempted point adjustment"
        );
        return Err(AppError::Forbidden);
    }

    let _ = controller
        .award_points(&UserId::new(form.user_id), form.delta)
        .await;

    Ok(Redirect::to("/"))
}
