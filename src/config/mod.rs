use crate::core::{AppError, Result};
use crate::repository::RepositoryOptions;
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub repository: RepositoryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    pub log_errors: bool,
}

impl RepositoryConfig {
    pub fn from_env() -> Result<Self> {
        let log_errors = match env::var("REPOSITORY_LOG_ERRORS") {
            Ok(raw) => parse_flag(&raw).ok_or_else(|| {
                AppError::Configuration("Invalid REPOSITORY_LOG_ERRORS".to_string())
            })?,
            Err(_) => true,
        };
        Ok(Self { log_errors })
    }

    pub fn options(&self) -> RepositoryOptions {
        RepositoryOptions {
            log_errors: self.log_errors,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            repository: RepositoryConfig::from_env()?,
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.name.trim().is_empty() {
            return Err(AppError::Configuration(
                "MONGODB_DATABASE must not be empty".to_string(),
            ));
        }

        if self.database.max_pool_size == 0 {
            return Err(AppError::Configuration(
                "MONGODB_MAX_POOL_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.database.min_pool_size > self.database.max_pool_size {
            return Err(AppError::Configuration(
                "MONGODB_MIN_POOL_SIZE cannot exceed MONGODB_MAX_POOL_SIZE".to_string(),
            ));
        }

        if self.server.workers == 0 {
            return Err(AppError::Configuration(
                "SERVER_WORKERS must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
