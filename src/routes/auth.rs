// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password authentication routes.
//!
//! Outcomes are reported through the controller's notices; every handler
//! redirects back to the page.

use axum::{response::Redirect, routing::post, Extension, Form, Router};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::notify::Notice;
use crate::session::SessionHandle;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/signout", post(sign_out))
}

#[derive(Deserialize, Validate)]
pub struct CredentialsForm {
    #[validate(length(min = 3, max = 320, message = "Enter your email address"))]
    email: String,
    #[validate(length(min = 1, max = 4096, message = "Enter your password"))]
    password: String,
}

/// First validation message, suitable for a notice.
fn validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(ToString::to_string))
        .unwrap_or_else(|| "Invalid form input".to_string())
}

async fn sign_up(
    Extension(session): Extension<SessionHandle>,
    Form(form): Form<CredentialsForm>,
) -> Redirect {
    let mut controller = session.slot.controller.lock().await;
    controller.settle().await;

    if let Err(errors) = form.validate() {
        controller.notify(Notice::error(validation_message(&errors)));
    } else if controller.sign_up(&form.email, &form.password).await.is_err() {
        tracing::debug!("Sign-up rejected");
    }

    Redirect::to("/")
}

async fn sign_in(
    Extension(session): Extension<SessionHandle>,
    Form(form): Form<CredentialsForm>,
) -> Redirect {
    let mut controller = session.slot.controller.lock().await;
    controller.settle().await;

    if let Err(errors) = form.validate() {
        controller.notify(Notice::error(validation_message(&errors)));
    } else if controller.sign_in(&form.email, &form.password).await.is_err() {
        tracing::debug!("Sign-in rejected");
    }

    Redirect::to("/")
}

async fn sign_out(Extension(session): Extension<SessionHandle>) -> Redirect {
    session.slot.controller.lock().await.sign_out().await;
    Redirect::to("/")
}
