use thiserror::Error;

use super::parser::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid value for environment variable {key}: {value:?}")]
    InvalidEnv { key: String, value: String },
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.connection_string().is_none() {
            return Err(ConfigError::InvalidConfig(
                "database connection cannot be resolved; set DATABASE_URL, PG_* or database.filename"
                    .to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "server.port must be between 1 and 65535".to_string(),
            ));
        }

        if self.tracker.session_cookie.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "tracker.session_cookie cannot be empty".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidConfig(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }

        if let (Some(min), Some(max)) = (
            self.database.min_connections,
            self.database.max_connections,
        ) {
            if min > max {
                return Err(ConfigError::InvalidConfig(
                    "database.min_connections cannot exceed database.max_connections".to_string(),
                ));
            }
        }

        Ok(())
    }
}
