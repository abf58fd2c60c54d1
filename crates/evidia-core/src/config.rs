//! Configuration module
//!
//! Environment-driven configuration for the ingestion service: server, database,
//! capability token secret, and the external blob store contract.

use std::env;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BLOB_STORE_TIMEOUT_SECS: u64 = 30;

/// Record store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    fn parse(s: &str) -> Result<Self, anyhow::Error> {
        match s {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow::anyhow!(
                "Invalid STORE_BACKEND '{}': must be 'postgres' or 'memory'",
                other
            )),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// HMAC secret for the capability token codec; shared across nodes.
    pub token_secret: String,
    /// Base URL of the external blob store, e.g. "https://blobs.internal".
    pub blob_store_url: String,
    /// Pre-shared key sent as a bearer credential to the blob store.
    pub blob_store_api_key: String,
    pub blob_store_timeout_seconds: u64,
    /// Maximum accepted request body for transfer/upload, in bytes.
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let store_backend = StoreBackend::parse(
            &env::var("STORE_BACKEND").unwrap_or_else(|_| "postgres".to_string()),
        )?;

        Ok(Config {
            server_port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            cors_origins,
            environment: env::var("ENVIRONMENT")
                .or_else(|_| env::var("APP_ENV"))
                .unwrap_or_else(|_| "development".to_string()),
            store_backend,
            database_url: env::var("DATABASE_URL").ok(),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_DB_TIMEOUT_SECS),
            token_secret: env::var("TOKEN_SECRET")
                .map_err(|_| anyhow::anyhow!("TOKEN_SECRET must be set"))?,
            blob_store_url: env::var("BLOB_STORE_URL")
                .map_err(|_| anyhow::anyhow!("BLOB_STORE_URL must be set"))?,
            blob_store_api_key: env::var("BLOB_STORE_API_KEY")
                .map_err(|_| anyhow::anyhow!("BLOB_STORE_API_KEY must be set"))?,
            blob_store_timeout_seconds: env::var("BLOB_STORE_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BLOB_STORE_TIMEOUT_SECS),
            max_upload_bytes: env::var("MAX_UPLOAD_MB")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(50)
                * 1024
                * 1024,
        })
    }

    /// Fail fast on misconfiguration before any service starts.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.token_secret.len() < 16 {
            anyhow::bail!("TOKEN_SECRET must be at least 16 bytes");
        }
        if self.store_backend == StoreBackend::Postgres && self.database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when STORE_BACKEND=postgres");
        }
        if !self.blob_store_url.starts_with("http://") && !self.blob_store_url.starts_with("https://")
        {
            anyhow::bail!("BLOB_STORE_URL must be an absolute http(s) URL");
        }
        if self.blob_store_timeout_seconds == 0 {
            anyhow::bail!("BLOB_STORE_TIMEOUT_SECONDS must be greater than zero");
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}
