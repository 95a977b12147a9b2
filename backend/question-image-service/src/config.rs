/// Configuration management for question-image-service
///
/// Loads configuration from environment variables with sensible defaults.
/// AWS credentials are mandatory and are checked before any client is built.
use crate::services::compressor::{CompressionStrategy, DEFAULT_MAX_SIZE_BYTES};
use serde::Deserialize;
use thiserror::Error;

/// Default bucket used by the question bank deployment
pub const DEFAULT_BUCKET: &str = "lumi-questions";

/// Default limit for a single multipart file field (20 MiB)
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub s3: S3Config,
    pub upload: UploadConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UploadConfig {
    /// Payloads strictly larger than this are compressed before storage
    pub compression_threshold_bytes: usize,
    /// Ceiling handed to the compressor
    pub max_size_bytes: usize,
    /// Largest file field accepted from a multipart request
    pub max_request_bytes: usize,
    pub strategy: CompressionStrategy,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            compression_threshold_bytes: DEFAULT_MAX_SIZE_BYTES,
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            strategy: CompressionStrategy::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_key_id = required(&lookup, "AWS_ACCESS_KEY_ID")?;
        let secret_access_key = required(&lookup, "AWS_SECRET_ACCESS_KEY")?;

        let defaults = UploadConfig::default();

        Ok(Config {
            app: AppConfig {
                host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parsed(&lookup, "APP_PORT", 8000)?,
                env: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
            },
            s3: S3Config {
                bucket: lookup("S3_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
                region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id,
                secret_access_key,
                endpoint: lookup("S3_ENDPOINT").filter(|v| !v.trim().is_empty()),
            },
            upload: UploadConfig {
                compression_threshold_bytes: parsed(
                    &lookup,
                    "UPLOAD_COMPRESSION_THRESHOLD_BYTES",
                    defaults.compression_threshold_bytes,
                )?,
                max_size_bytes: parsed(&lookup, "UPLOAD_MAX_SIZE_BYTES", defaults.max_size_bytes)?,
                max_request_bytes: parsed(
                    &lookup,
                    "UPLOAD_MAX_REQUEST_BYTES",
                    defaults.max_request_bytes,
                )?,
                strategy: match lookup("UPLOAD_COMPRESSION_STRATEGY") {
                    Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                        name: "UPLOAD_COMPRESSION_STRATEGY",
                        value: raw,
                    })?,
                    None => defaults.strategy,
                },
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

fn parsed<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}
