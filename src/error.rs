// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failures reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("An account with this email already exists")]
    EmailExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Password is too weak: {0}")]
    WeakPassword(String),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("This account has been disabled")]
    UserDisabled,

    #[error("Too many attempts, try again later")]
    TooManyAttempts,

    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    NotFound(String),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Not enough points to redeem")]
    InsufficientPoints { available: i64, cost: i64 },

    #[error("{0}")]
    ConfigDisabled(String),

    #[error("Admin role required")]
    Forbidden,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Auth(AuthError::Unavailable(msg)) => {
                tracing::error!(error = %msg, "Identity provider unavailable");
                (StatusCode::BAD_GATEWAY, "auth_unavailable", None)
            }
            AppError::Auth(err) => (StatusCode::UNAUTHORIZED, "auth_error", Some(err.to_string())),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::Write(msg) => (StatusCode::CONFLICT, "write_error", Some(msg.clone())),
            AppError::InsufficientPoints { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_points",
                Some(self.to_string()),
            ),
            AppError::ConfigDisabled(msg) => {
                (StatusCode::FORBIDDEN, "disabled", Some(msg.clone()))
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", None),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
