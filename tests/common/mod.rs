// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use slauson_points::config::Config;
use slauson_points::controller::Features;
use slauson_points::db::{FirestoreDb, MemoryStore};
use slauson_points::identity::MemoryIdentity;
use slauson_points::models::{Role, User};
use slauson_points::routes::create_router;
use slauson_points::session::SessionRegistry;
use slauson_points::AppState;
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "secret1";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// A user record with a matching identity (password [`PASSWORD`]).
#[allow(dead_code)]
pub fn seeded_user(id: &str, points: i64, role: Role) -> User {
    let mut user = User::new_account(id.into(), format!("{}@example.com", id), points);
    user.role = role;
    user
}

/// In-process app plus handles on its backends.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub identity: MemoryIdentity,
    pub store: MemoryStore,
}

/// Create a test app on memory backends, with an identity for every seeded user.
#[allow(dead_code)]
pub fn create_test_app(config: Config, users: Vec<User>) -> TestApp {
    let identity = MemoryIdentity::new();
    for user in &users {
        identity
            .insert_account(user.id.clone(), &user.email, PASSWORD)
            .expect("seed identity");
    }
    let store = MemoryStore::with_users(users);

    let sessions = Arc::new(SessionRegistry::new(
        Arc::new(identity.clone()),
        Arc::new(store.clone()),
        Features::from(&config),
    ));
    let state = Arc::new(AppState { config, sessions });

    TestApp {
        router: create_router(state.clone()),
        state,
        identity,
        store,
    }
}

/// A browser: remembers the session cookie between requests.
#[allow(dead_code)]
pub struct Browser {
    router: axum::Router,
    cookie: Option<String>,
}

#[allow(dead_code)]
impl Browser {
    pub fn new(app: &TestApp) -> Self {
        Self {
            router: app.router.clone(),
            cookie: None,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> Response<Body> {
        let response = self.router.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        response
    }

    fn builder(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        let request = self.builder("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, uri: &str, form: &str) -> Response<Body> {
        let request = self
            .builder("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// GET a page and return its body.
    pub async fn page(&mut self, uri: &str) -> String {
        let response = self.get(uri).await;
        body_string(response).await
    }

    pub async fn sign_in(&mut self, id: &str) -> Response<Body> {
        self.post_form(
            "/auth/signin",
            &format!("email={}%40example.com&password={}", id, PASSWORD),
        )
        .await
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }
}

#[allow(dead_code)]
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
