use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub app_name: String,
    pub deployment: String,
    pub bind_address: String,
    pub require_auth: bool,
    pub password_hash_cost: u32,
    pub tests_running: bool,
}

/// Cheapest bcrypt cost; keeps hashing fast under test
#[cfg(test)]
pub const TEST_HASH_COST: u32 = 4;

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name).map_or(default, |value| {
        !matches!(
            value.trim().to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        )
    })
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load from .env file if available
        let db_url = match env::var("DB_URL") {
            Ok(url) => url,
            Err(_) => format!(
                "{}://{}:{}@{}:{}/{}",
                env::var("DB_PREFIX").unwrap_or_else(|_| "postgresql".to_string()),
                env::var("DB_USER").context("DB_USER must be set when DB_URL is absent")?,
                env::var("DB_PASSWORD")
                    .context("DB_PASSWORD must be set when DB_URL is absent")?,
                env::var("DB_HOST").context("DB_HOST must be set when DB_URL is absent")?,
                env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string()),
                env::var("DB_NAME").context("DB_NAME must be set when DB_URL is absent")?,
            ),
        };

        let password_hash_cost = match env::var("PASSWORD_HASH_COST") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("PASSWORD_HASH_COST must be an integer, got {raw}"))?,
            Err(_) => bcrypt::DEFAULT_COST,
        };

        Ok(Config {
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "greenhouse-api".to_string()),
            deployment: env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            require_auth: env_flag("REQUIRE_AUTH", true),
            password_hash_cost,
            tests_running: false,
            db_url,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            db_url: "sqlite::memory:".to_string(),
            app_name: "greenhouse-api-test".to_string(),
            deployment: "test".to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            require_auth: false,
            password_hash_cost: TEST_HASH_COST,
            tests_running: true,
        }
    }
}
