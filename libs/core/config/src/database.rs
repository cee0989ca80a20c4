use crate::{env_required, ConfigError, FromEnv};

/// Postgres configuration
#[derive(Clone, Debug)]
pub struct PostgresConfig {
    pub url: String,
}

impl PostgresConfig {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

impl FromEnv for PostgresConfig {
    /// Requires DATABASE_URL to be set (no default)
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_required("DATABASE_URL")?,
        })
    }
}
