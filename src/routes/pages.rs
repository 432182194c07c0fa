// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-rendered pages.

use axum::{response::Html, routing::get, Extension, Router};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::session::SessionHandle;
use crate::view::{render, View};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(index))
}

/// Render whichever screen the caller's controller is on.
async fn index(Extension(session): Extension<SessionHandle>) -> Result<Html<String>> {
    let mut controller = session.slot.controller.lock().await;
    controller.settle().await;

    let view = View::project(&controller);
    let notices = controller.take_notices();
    let html = render(&view, &notices).map_err(|e| AppError::Internal(e.into()))?;

    Ok(Html(html))
}
