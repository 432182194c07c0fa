// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Slauson Robotics Points server
//!
//! Serves the rewards web app on top of Firestore and Firebase Auth, or on
//! in-process backends for local development.

use slauson_points::{
    config::{BackendKind, Config},
    controller::Features,
    db::{DocumentStore, FirestoreDb, MemoryStore},
    identity::{FirebaseAuth, IdentityProvider, MemoryIdentity},
    session::SessionRegistry,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.backend,
        signup_enabled = config.signup_enabled,
        signin_enabled = config.signin_enabled,
        "Starting Slauson Points"
    );

    let (identity, store): (Arc<dyn IdentityProvider>, Arc<dyn DocumentStore>) =
        match config.backend {
            BackendKind::Firestore => {
                let db = FirestoreDb::new(&config.gcp_project_id).await?;
                db.spawn_snapshot_poller(config.snapshot_poll);
                tracing::info!(
                    every_secs = config.snapshot_poll.as_secs(),
                    "Snapshot poller started"
                );
                (
                    Arc::new(FirebaseAuth::new(config.firebase_api_key.clone())),
                    Arc::new(db),
                )
            }
            BackendKind::Memory => {
                tracing::warn!("Using in-memory backend; data is lost on restart");
                let identity = MemoryIdentity::new();
                let store = MemoryStore::new();
                match &config.seed_admin {
                    Some(seed) => {
                        store.seed_admin(&identity, seed).await?;
                    }
                    None if !config.signup_enabled => tracing::warn!(
                        "No SEED_ADMIN_EMAIL and sign-up disabled; nobody can sign in"
                    ),
                    None => {}
                }
                (Arc::new(identity), Arc::new(store))
            }
        };

    let sessions = Arc::new(SessionRegistry::new(
        identity,
        store,
        Features::from(&config),
    ));
    sessions.spawn_pruner(config.session_idle);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        sessions,
    });

    // Build router
    let app = slauson_points::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("slauson_points=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
