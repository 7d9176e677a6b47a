use std::path::PathBuf;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | working directory (database, logs) |
/// | DATABASE_PATH | <WORK_DIR>/database/lanchonete.db | SQLite file |
/// | HTTP_PORT | 3000 | HTTP port |
/// | ENVIRONMENT | development | development / staging / production |
/// | LOG_LEVEL | info | tracing level or filter directive |
/// | LOG_DIR | (unset) | enables the daily rolling log file |
/// | REQUEST_TIMEOUT_MS | 30000 | request timeout (ms) |
/// | EVENT_CHANNEL_CAPACITY | 1024 | event bus buffer |
/// | ADMIN_EMAIL | admin@lanchonete.local | bootstrap admin for an empty database |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/srv/lanchonete HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and logs
    pub work_dir: String,
    /// Explicit database file, defaults under `work_dir`
    pub database_path: Option<String>,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub request_timeout_ms: u64,
    pub event_channel_capacity: usize,
    /// Admin account created when the user table is empty
    pub admin_email: String,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            database_path: std::env::var("DATABASE_PATH").ok(),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            event_channel_capacity: std::env::var("EVENT_CHANNEL_CAPACITY")
                .ok()
                .and_then(|p| p.parse().ok())
                .filter(|c| *c > 0)
                .unwrap_or(1024),
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@lanchonete.local".into()),
        }
    }

    /// Override a subset of values, mostly for tests
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.database_path = None;
        config.http_port = http_port;
        config
    }

    /// Resolved SQLite file path
    pub fn database_path(&self) -> PathBuf {
        match &self.database_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.work_dir)
                .join("database")
                .join("lanchonete.db"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
