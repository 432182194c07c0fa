//! Application configuration loaded from environment variables.
//!
//! Backend connection settings, the sign-up/sign-in switches and the
//! session parameters are read once at startup.

use std::env;
use std::time::Duration;

/// Which backend implementation the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Firestore document store plus the Identity Toolkit REST API.
    Firestore,
    /// In-process store and identity provider (local development).
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("BACKEND", s.to_string())),
        }
    }
}

/// Account created at startup on the memory backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Server ---
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// JWT signing key for session cookies (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// How long an unused controller is kept in the registry
    pub session_idle: Duration,

    // --- Backend ---
    pub backend: BackendKind,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Web API key for the Identity Toolkit
    pub firebase_api_key: String,
    /// Interval of the collection poller that picks up out-of-band changes
    pub snapshot_poll: Duration,

    // --- Feature switches ---
    pub signup_enabled: bool,
    /// Reason shown when sign-up is turned off
    pub signup_disabled_reason: String,
    pub signin_enabled: bool,
    /// Points granted to a freshly created account
    pub initial_points: i64,
    /// Admin account seeded into the memory backend
    pub seed_admin: Option<AdminSeed>,
}

impl Config {
    /// Config for tests only: memory backend, everything switched on.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            session_idle: Duration::from_secs(3600),
            backend: BackendKind::Memory,
            gcp_project_id: "test-project".to_string(),
            firebase_api_key: "test-api-key".to_string(),
            snapshot_poll: Duration::from_secs(5),
            signup_enabled: true,
            signup_disabled_reason: "Development in progress".to_string(),
            signin_enabled: true,
            initial_points: 10,
            seed_admin: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let backend: BackendKind = env::var("BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .parse()?;

        // The API key is only needed when talking to the real provider
        let firebase_api_key = match backend {
            BackendKind::Firestore => env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            BackendKind::Memory => env::var("FIREBASE_API_KEY").unwrap_or_default(),
        };

        Ok(Self {
            port: parse_or("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            session_idle: Duration::from_secs(parse_or("SESSION_IDLE_SECS", 3600)?),
            backend,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            firebase_api_key,
            snapshot_poll: Duration::from_secs(parse_or("SNAPSHOT_POLL_SECS", 5)?),
            signup_enabled: parse_or("SIGNUP_ENABLED", false)?,
            signup_disabled_reason: env::var("SIGNUP_DISABLED_REASON")
                .unwrap_or_else(|_| "Development in progress".to_string()),
            signin_enabled: parse_or("SIGNIN_ENABLED", true)?,
            initial_points: parse_or("INITIAL_POINTS", 10)?,
            seed_admin: admin_seed_from_env()?,
        })
    }
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// `SEED_ADMIN_EMAIL` and `SEED_ADMIN_PASSWORD`, which must be set together.
fn admin_seed_from_env() -> Result<Option<AdminSeed>, ConfigError> {
    match (env::var("SEED_ADMIN_EMAIL"), env::var("SEED_ADMIN_PASSWORD")) {
        (Ok(email), Ok(password)) => Ok(Some(AdminSeed {
            email: email.trim().to_string(),
            password,
        })),
        (Ok(_), Err(_)) => Err(ConfigError::Missing("SEED_ADMIN_PASSWORD")),
        (Err(_), Ok(_)) => Err(ConfigError::Missing("SEED_ADMIN_EMAIL")),
        (Err(_), Err(_)) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
