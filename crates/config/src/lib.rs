use std::path::PathBuf;

use anyhow::Context;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Directory holding the trained model and encoder artifacts
    pub model_dir: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `DATABASE_URL`: `PostgreSQL` connection string
    ///
    /// Optional environment variables:
    /// - `MODEL_DIR`: directory containing the trained artifacts (default: `models`)
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL environment variable not set")?;

        let model_dir =
            std::env::var("MODEL_DIR").map_or_else(|_| PathBuf::from("models"), PathBuf::from);

        Ok(Self {
            database_url,
            model_dir,
        })
    }
}
