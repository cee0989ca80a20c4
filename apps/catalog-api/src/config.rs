//! Configuration for the Catalog API

use core_config::database::PostgresConfig;
use core_config::redis::RedisConfig;
use core_config::server::ServerConfig;
use core_config::{ConfigError, FromEnv};

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub postgres: PostgresConfig,
    pub redis: RedisConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    /// Sustained request rate allowed per client IP, per minute.
    pub rate_limit_per_minute: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = Environment::from_env();
        let postgres = PostgresConfig::from_env()?;
        let redis = RedisConfig::from_env()?;
        let server = ServerConfig::from_env()?;

        let rate_limit_per_minute = std::env::var("RATE_LIMIT_PER_MINUTE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Ok(Self {
            postgres,
            redis,
            server,
            environment,
            rate_limit_per_minute,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/catalog")),
                ("REDIS_URL", Some("redis://localhost:6379")),
                ("PORT", Some("3000")),
                ("RATE_LIMIT_PER_MINUTE", Some("120")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.server.port, 3000);
                assert_eq!(config.rate_limit_per_minute, 120);
            },
        );
    }

    #[test]
    fn test_rate_limit_defaults() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/catalog")),
                ("REDIS_URL", Some("redis://localhost:6379")),
                ("RATE_LIMIT_PER_MINUTE", None::<&str>),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.rate_limit_per_minute, 60);
            },
        );
    }
}
