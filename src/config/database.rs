use mongodb::options::ClientOptions;
use mongodb::Client;
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::core::{AppError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub name: String,
    pub min_pool_size: u32,
    pub max_pool_size: u32,
    pub app_name: String,
}

fn parse_var(name: &str, default: &str) -> Result<u32> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| AppError::Configuration(format!("Invalid {}", name)))
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        Ok(DatabaseConfig {
            uri: env::var("MONGODB_URI")
                .map_err(|_| AppError::Configuration("MONGODB_URI not set".to_string()))?,
            name: env::var("MONGODB_DATABASE")
                .map_err(|_| AppError::Configuration("MONGODB_DATABASE not set".to_string()))?,
            min_pool_size: parse_var("MONGODB_MIN_POOL_SIZE", "0")?,
            max_pool_size: parse_var("MONGODB_MAX_POOL_SIZE", "20")?,
            app_name: env::var("MONGODB_APP_NAME").unwrap_or_else(|_| "docrepo".to_string()),
        })
    }

    /// Create the MongoDB client; connections are opened lazily by the driver
    pub async fn create_client(&self) -> Result<Client> {
        let mut options = ClientOptions::parse(&self.uri).await?;
        options.app_name = Some(self.app_name.clone());
        options.min_pool_size = Some(self.min_pool_size);
        options.max_pool_size = Some(self.max_pool_size);
        options.connect_timeout = Some(Duration::from_secs(10));
        options.server_selection_timeout = Some(Duration::from_secs(30));
        options.max_idle_time = Some(Duration::from_secs(600)); // 10 minutes

        Ok(Client::with_options(options)?)
    }
}
