use std::env;

pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingVar(&'static str),
    #[error("Invalid value for {var}: {detail}")]
    InvalidVar { var: &'static str, detail: String },
}

/// Process configuration, read once at startup. Required variables fail
/// fast with the variable name; optional ones fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_private_key_path: String,
    pub jwt_public_key_path: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let required = |var: &'static str| env::var(var).map_err(|_| ConfigError::MissingVar(var));

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidVar {
                var: "PORT",
                detail: e.to_string(),
            })?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_private_key_path: required("JWT_PRIVATE_KEY_PATH")?,
            jwt_public_key_path: required("JWT_PUBLIC_KEY_PATH")?,
            allowed_origins,
            environment: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
