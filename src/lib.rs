// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Slauson Robotics Points: a small rewards web app.
//!
//! Users sign up and sign in, collect points, redeem badges from a fixed
//! shop and see a leaderboard; admins award and revoke points. Accounts and
//! records live in a managed identity provider and document store.

pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod random;
pub mod routes;
pub mod session;
pub mod view;

use config::Config;
use session::SessionRegistry;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<SessionRegistry>,
}
