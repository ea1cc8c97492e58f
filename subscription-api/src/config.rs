//! Server configuration

use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Where repositories keep their data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = BoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown STORAGE_BACKEND: {other}").into()),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    /// HTTP listen port
    pub http_port: u16,
    pub storage: StorageBackend,
    /// PostgreSQL connection URL (required for the postgres backend)
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// HS256 signing secret for bearer tokens
    pub jwt_secret: String,
    /// Per-request deadline
    pub request_timeout: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let storage = match std::env::var("STORAGE_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => StorageBackend::Postgres,
        };
        let database_url = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err("DATABASE_URL must be set".into());
        }

        let log_format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            http_port: Self::parse_or("HTTP_PORT", 8080),
            storage,
            database_url,
            database_max_connections: Self::parse_or("DATABASE_MAX_CONNECTIONS", 10),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            request_timeout: Duration::from_secs(Self::parse_or("REQUEST_TIMEOUT_SECS", 30)),
            log_format,
            environment,
        })
    }

    /// In-memory configuration for tests and local runs
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            environment: "development".into(),
            http_port: 0,
            storage: StorageBackend::Memory,
            database_url: None,
            database_max_connections: 1,
            jwt_secret: jwt_secret.into(),
            request_timeout: Duration::from_secs(30),
            log_format: LogFormat::Pretty,
        }
    }
}
