//! Configuration module for the storage facade

use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};
use std::path::PathBuf;

/// SigV4 refuses presigned URLs valid for longer than one week.
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// S3 rejects multipart parts (other than the last) below 5 MiB.
pub const MIN_MULTIPART_PART_BYTES: usize = 5 * 1024 * 1024;

/// Main application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub s3: S3Settings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
    /// Largest accepted upload body
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct S3Settings {
    pub region: String,
    pub bucket_name: String,
    /// Static credentials. Leave both empty to use the default AWS credential chain.
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    /// Custom endpoint for S3-compatible stores (forces path-style addressing)
    pub endpoint: Option<String>,
    #[serde(default = "default_presign_expiry_secs")]
    pub presign_expiry_secs: u64,
    #[serde(default = "default_upload_prefix")]
    pub upload_prefix: String,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_server_side_encryption")]
    pub server_side_encryption: String,
    pub sse_kms_key_id: Option<String>,
    #[serde(default = "default_multipart_threshold_bytes")]
    pub multipart_threshold_bytes: usize,
    #[serde(default = "default_multipart_part_size_bytes")]
    pub multipart_part_size_bytes: usize,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_max_upload_bytes() -> usize { 20 * 1024 * 1024 }
fn default_presign_expiry_secs() -> u64 { 3600 }
fn default_upload_prefix() -> String { "profile_images".to_string() }
fn default_jpeg_quality() -> u8 { 50 }
fn default_server_side_encryption() -> String { "aws:kms".to_string() }
fn default_multipart_threshold_bytes() -> usize { 8 * 1024 * 1024 }
fn default_multipart_part_size_bytes() -> usize { 8 * 1024 * 1024 }

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: default_host(),
            port: default_port(),
            workers: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl S3Settings {
    /// Settings for a bucket with every optional knob at its default
    pub fn new(region: &str, bucket_name: &str) -> Self {
        S3Settings {
            region: region.to_string(),
            bucket_name: bucket_name.to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            endpoint: None,
            presign_expiry_secs: default_presign_expiry_secs(),
            upload_prefix: default_upload_prefix(),
            jpeg_quality: default_jpeg_quality(),
            server_side_encryption: default_server_side_encryption(),
            sse_kms_key_id: None,
            multipart_threshold_bytes: default_multipart_threshold_bytes(),
            multipart_part_size_bytes: default_multipart_part_size_bytes(),
        }
    }

    /// Whether a static key pair is configured
    pub fn has_static_credentials(&self) -> bool {
        !self.access_key.is_empty() && !self.secret_key.is_empty()
    }

    /// Check invariants the storage layer relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::Message("s3.region must not be empty".into()));
        }
        if self.bucket_name.trim().is_empty() {
            return Err(ConfigError::Message("s3.bucket_name must not be empty".into()));
        }
        if self.access_key.is_empty() != self.secret_key.is_empty() {
            return Err(ConfigError::Message(
                "s3.access_key and s3.secret_key must be set together".into(),
            ));
        }
        if self.presign_expiry_secs == 0 || self.presign_expiry_secs > MAX_PRESIGN_EXPIRY_SECS {
            return Err(ConfigError::Message(format!(
                "s3.presign_expiry_secs must be between 1 and {}",
                MAX_PRESIGN_EXPIRY_SECS
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Message("s3.jpeg_quality must be between 1 and 100".into()));
        }
        if self.multipart_part_size_bytes < MIN_MULTIPART_PART_BYTES {
            return Err(ConfigError::Message(format!(
                "s3.multipart_part_size_bytes must be at least {}",
                MIN_MULTIPART_PART_BYTES
            )));
        }
        if self.multipart_threshold_bytes < MIN_MULTIPART_PART_BYTES {
            return Err(ConfigError::Message(format!(
                "s3.multipart_threshold_bytes must be at least {}",
                MIN_MULTIPART_PART_BYTES
            )));
        }
        Ok(())
    }
}

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables (prefixed with S3IMG_)
    /// 2. config/local.toml (gitignored)
    /// 3. config/default.toml
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // S3IMG_S3__BUCKET_NAME, S3IMG_SERVER__PORT, ...
            .add_source(
                Environment::with_prefix("S3IMG")
                    .separator("__")
                    .try_parsing(true)
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.s3.validate()?;
        Ok(settings)
    }
}
