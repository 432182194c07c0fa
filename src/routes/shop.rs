// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Badge shop routes.

use axum::{response::Redirect, routing::post, Extension, Form, Router};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::catalog;
use crate::session::SessionHandle;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/shop/redeem", post(redeem))
}

#[derive(Deserialize)]
pub struct RedeemForm {
    badge: String,
}

/// Redeem a catalog badge for the signed-in user.
///
/// The cost always comes from the catalog, never from the request.
async fn redeem(
    Extension(session): Extension<SessionHandle>,
    Form(form): Form<RedeemForm>,
) -> Result<Redirect> {
    let badge = catalog::find(&form.badge)
        .ok_or_else(|| AppError::NotFound(format!("No badge named {:?}", form.badge)))?;

    let mut controller = session.slot.controller.lock().await;
    controller.settle().await;
    if controller.session().is_none() {
        return Err(AppError::Unauthorized);
    }

    // Insufficient points and write failures are reported as notices
    let _ = controller.redeem_badge(badge.name, badge.cost).await;

    Ok(Redirect::to("/"))
}
