//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub limiter: LimiterConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (default: 3000)
    pub port: u16,
    /// Public domain used in constructed URLs (e.g., "files.example.com")
    pub domain: String,
    /// Protocol of the public URL ("http" or "https")
    pub protocol: String,
    /// Identify clients by the first `X-Forwarded-For` entry
    /// instead of the socket address (only behind a trusted proxy)
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

impl ServerConfig {
    /// Get the base URL for the gateway
    ///
    /// # Returns
    /// Full URL like "https://files.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }

    /// Public URL through which an uploaded object is served by `/public/:file`
    pub fn public_url(&self, name: &str) -> String {
        format!("{}/public/{}", self.base_url(), urlencoding::encode(name))
    }
}

/// Which object store implementation backs the gateway
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    S3,
    /// In-process store; contents vanish on restart
    Memory,
}

/// Object store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Store host, with optional port (e.g., "minio.example.com:9000")
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    pub region: String,
    /// Destination bucket for uploads and `/public` downloads
    pub bucket: String,
    pub use_ssl: bool,
    /// Address buckets as `host/bucket` instead of `bucket.host`
    pub force_path_style: bool,
    /// Upper bound on a single store call
    pub timeout_seconds: u64,
}

impl StorageConfig {
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.endpoint)
    }
}

/// Upload form configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Password required by `POST /upload` and checked by `/validate/:pass`
    pub password: String,
    /// Maximum request body size for uploads
    pub max_bytes: usize,
}

/// Password retry limiter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LimiterConfig {
    /// Wrong guesses allowed before a client is blocked (default: 5)
    pub max_attempts: u32,
    /// Maximum number of clients tracked in memory
    pub max_tracked_clients: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (BUCKETGATE__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.protocol", "https")?
            .set_default("server.trust_forwarded_for", false)?
            .set_default("storage.backend", "s3")?
            .set_default("storage.region", "us-east-1")?
            .set_default("storage.bucket", "public")?
            .set_default("storage.use_ssl", true)?
            .set_default("storage.force_path_style", true)?
            .set_default("storage.timeout_seconds", 30)?
            .set_default("upload.max_bytes", 50 * 1024 * 1024)?
            .set_default("limiter.max_attempts", 5)?
            .set_default("limiter.max_tracked_clients", 10_000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("BUCKETGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        if self.upload.password.is_empty() {
            return Err(AppError::Config(
                "upload.password must not be empty".to_string(),
            ));
        }

        if self.storage.bucket.trim().is_empty() {
            return Err(AppError::Config(
                "storage.bucket must not be empty".to_string(),
            ));
        }

        if self.server.domain.trim().is_empty() {
            return Err(AppError::Config(
                "server.domain must not be empty".to_string(),
            ));
        }

        if self.limiter.max_attempts == 0 {
            return Err(AppError::Config(
                "limiter.max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.storage.timeout_seconds == 0 {
            return Err(AppError::Config(
                "storage.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::S3 && self.storage.endpoint.trim().is_empty() {
            return Err(AppError::Config(
                "storage.endpoint is required when storage.backend=s3".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::Memory {
            tracing::warn!("Using in-memory object store; uploads are lost on restart");
        }

        Ok(())
    }
}
