use std::env;
use std::net::SocketAddr;

use chrono::Duration;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::with_security_headers;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_SITE_URL: &str = "http://localhost:3001";
const DEVELOPMENT_SECRET_KEY: &str = "development-secret-key-change-me";
const DEFAULT_SESSION_TTL_HOURS: i64 = 12;
const DEFAULT_PASSWORD_RESET_TIMEOUT_DAYS: i64 = 3;

/// Credentials for the superuser created at startup when missing.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs the in-memory store.
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub secret_key: String,
    pub session_ttl: Duration,
    pub password_reset_timeout: Duration,
    /// Base of the links handed out for password reset and activation.
    pub site_url: String,
    pub cors_allowed_origins: Option<String>,
    pub is_production: bool,
    pub admin: Option<AdminCredentials>,
}

impl Config {
    pub fn from_env() -> Self {
        let is_production = env::var("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        let secret_key = env::var("SECRET_KEY").unwrap_or_else(|_| {
            tracing::warn!("SECRET_KEY is not set, using the development key");
            DEVELOPMENT_SECRET_KEY.to_string()
        });

        let admin = match (
            env::var("ADMIN_USERNAME"),
            env::var("ADMIN_EMAIL"),
            env::var("ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(email), Ok(password)) => Some(AdminCredentials {
                username,
                email,
                password,
            }),
            _ => None,
        };

        Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            bind_addr: parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT))),
            secret_key,
            session_ttl: Duration::hours(parse_or("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)),
            password_reset_timeout: Duration::days(parse_or(
                "PASSWORD_RESET_TIMEOUT_DAYS",
                DEFAULT_PASSWORD_RESET_TIMEOUT_DAYS,
            )),
            site_url: env::var("SITE_URL")
                .unwrap_or_else(|_| DEFAULT_SITE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS").ok(),
            is_production,
            admin,
        }
    }

    /// Defaults for tests and local tooling: in-memory store, fixed secret.
    pub fn development() -> Self {
        Self {
            database_url: None,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            secret_key: DEVELOPMENT_SECRET_KEY.to_string(),
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            password_reset_timeout: Duration::days(DEFAULT_PASSWORD_RESET_TIMEOUT_DAYS),
            site_url: DEFAULT_SITE_URL.to_string(),
            cors_allowed_origins: None,
            is_production: false,
            admin: None,
        }
    }

    pub fn uses_development_secret(&self) -> bool {
        self.secret_key == DEVELOPMENT_SECRET_KEY
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Ignoring unparsable setting");
                default
            }
        },
        Err(_) => default,
    }
}
