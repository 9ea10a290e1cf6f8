use std::fmt;
use std::path::Path;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use super::ConfigError;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub require_tls: bool,
    #[serde(default)]
    pub max_connections: Option<u32>,
    #[serde(default)]
    pub min_connections: Option<u32>,
    #[serde(default = "default_ensure_schema")]
    pub ensure_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: None,
            port: None,
            user: None,
            password: None,
            name: None,
            filename: None,
            require_tls: false,
            max_connections: None,
            min_connections: None,
            ensure_schema: default_ensure_schema(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("name", &self.name)
            .field("filename", &self.filename)
            .field("require_tls", &self.require_tls)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("ensure_schema", &self.ensure_schema)
            .finish()
    }
}

impl DatabaseConfig {
    pub fn db_type(&self) -> DbType {
        if let Some(ref url) = self.url {
            if url.starts_with("sqlite://") {
                DbType::Sqlite
            } else {
                DbType::Postgres
            }
        } else if self.has_postgres_parts() {
            DbType::Postgres
        } else if self.filename.is_some() {
            DbType::Sqlite
        } else {
            DbType::Postgres
        }
    }

    /// Resolves the connection target in precedence order: full URL, the
    /// individual postgres parameters, then a sqlite filename.
    pub fn connection_string(&self) -> Option<SecretString> {
        let resolved = if let Some(ref url) = self.url {
            if self.require_tls && !url.starts_with("sqlite://") {
                Some(with_required_tls(url))
            } else {
                Some(url.clone())
            }
        } else if self.has_postgres_parts() {
            self.postgres_url_from_parts()
        } else {
            self.filename.as_ref().map(|file| format!("sqlite://{}", file))
        };

        resolved.map(SecretString::from)
    }

    pub fn sqlite_path(&self) -> Option<String> {
        if let DbType::Sqlite = self.db_type() {
            if let Some(ref url) = self.url {
                Some(url.strip_prefix("sqlite://").unwrap_or(url).to_string())
            } else {
                self.filename.clone()
            }
        } else {
            None
        }
    }

    pub fn max_connections(&self) -> Option<u32> {
        match self.db_type() {
            DbType::Postgres => self.max_connections,
            DbType::Sqlite => Some(1),
        }
    }

    pub fn min_connections(&self) -> Option<u32> {
        match self.db_type() {
            DbType::Postgres => self.min_connections,
            DbType::Sqlite => Some(1),
        }
    }

    fn has_postgres_parts(&self) -> bool {
        self.host.is_some() || self.user.is_some() || self.name.is_some()
    }

    fn postgres_url_from_parts(&self) -> Option<String> {
        let mut url = Url::parse("postgres://localhost").ok()?;
        url.set_host(Some(self.host.as_deref().unwrap_or("localhost")))
            .ok()?;
        url.set_port(Some(self.port.unwrap_or(5432))).ok()?;
        if let Some(ref user) = self.user {
            url.set_username(user).ok()?;
        }
        if let Some(ref password) = self.password {
            url.set_password(Some(password)).ok()?;
        }
        if let Some(ref name) = self.name {
            url.set_path(&format!("/{}", name));
        }

        let url = url.to_string();
        if self.require_tls {
            Some(with_required_tls(&url))
        } else {
            Some(url)
        }
    }
}

// Encrypts the connection without verifying the server certificate.
fn with_required_tls(url: &str) -> String {
    if url.contains("sslmode=") {
        url.to_string()
    } else if url.contains('?') {
        format!("{}&sslmode=require", url)
    } else {
        format!("{}?sslmode=require", url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    Postgres,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    #[serde(default = "default_user_id")]
    pub default_user_id: i32,
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            default_user_id: default_user_id(),
            session_cookie: default_session_cookie(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
}

impl Config {
    /// Loads the YAML file at `path` (default `config.yaml`), then layers
    /// environment overrides on top and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH)))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// A missing file yields the defaults.
    pub fn read_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = var("PORT") {
            self.server.port = parse_env("PORT", value)?;
        }
        if let Some(value) = var("DATABASE_URL") {
            self.database.require_tls = !value.starts_with("sqlite://");
            self.database.url = Some(value);
        }
        if let Some(value) = var("PG_USER") {
            self.database.user = Some(value);
        }
        if let Some(value) = var("PG_HOST") {
            self.database.host = Some(value);
        }
        if let Some(value) = var("PG_DATABASE") {
            self.database.name = Some(value);
        }
        if let Some(value) = var("PG_PASSWORD") {
            self.database.password = Some(value);
        }
        if let Some(value) = var("PG_PORT") {
            self.database.port = Some(parse_env("PG_PORT", value)?);
        }
        if let Some(value) = var("LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = var("LOG_FORMAT") {
            self.logging.format = value;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value,
    })
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "public".to_string()
}

fn default_ensure_schema() -> bool {
    true
}

fn default_user_id() -> i32 {
    1
}

fn default_session_cookie() -> String {
    "tracker_session".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
