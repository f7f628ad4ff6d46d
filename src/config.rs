use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;

const DEFAULT_DATABASE_PATH: &str = "portfolio.db";
const DATABASE_PATH_VAR: &str = "PORTFOLIO_DB_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup(DATABASE_PATH_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        Self {
            database_path: PathBuf::from(database_path),
        }
    }
}
