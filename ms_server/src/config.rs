//! Admin runner configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use match_score::{CompetitionSettings, db::DatabaseConfig};

/// Complete runner configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Scheduling and roster rules
    pub competition: CompetitionSettings,
    /// Run pending migrations before executing a command
    pub auto_migrate: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Returns
    ///
    /// * `Result<ServerConfig, ConfigError>` - Loaded configuration or error
    ///
    /// # Errors
    ///
    /// Returns error if `DATABASE_URL` is missing and no override was given
    pub fn from_env(database_url_override: Option<String>) -> Result<Self, ConfigError> {
        let database_url = database_url_override
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .ok_or_else(|| ConfigError::MissingRequired {
                var: "DATABASE_URL".to_string(),
                hint: "e.g. postgres://postgres@localhost/match_score, or pass --db-url"
                    .to_string(),
            })?;

        let database = DatabaseConfig {
            database_url,
            ..DatabaseConfig::from_env()
        };

        Ok(ServerConfig {
            database,
            competition: CompetitionSettings::from_env(),
            auto_migrate: parse_env_or("AUTO_MIGRATE", false),
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        self.competition
            .validate()
            .map_err(|e| ConfigError::Invalid {
                var: "competition settings".to_string(),
                reason: e.to_string(),
            })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            database: DatabaseConfig::testing("postgres://localhost/match_score_test"),
            competition: CompetitionSettings::default(),
            auto_migrate: false,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "DATABASE_URL".to_string(),
            hint: "pass --db-url".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("DATABASE_URL"));
        assert!(msg.contains("pass --db-url"));
    }

    #[test]
    fn test_override_wins() {
        let config = ServerConfig::from_env(Some("postgres://override/db".to_string())).unwrap();
        assert_eq!(config.database.database_url, "postgres://override/db");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_pool_sizes() {
        let mut config = config();
        config.database.min_connections = 50;
        config.database.max_connections = 10;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_config_validation_competition() {
        let mut config = config();
        config.competition.max_roster_size = 2;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Roster limits"));
    }
}
