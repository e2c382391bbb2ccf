//! Configuration module
//!
//! Settings are read from the environment (after loading an optional `.env`
//! file). `Config::default()` describes a self-contained local setup and is
//! what tests start from.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{DEFAULT_DOWNLOAD_URL_HOST, DEFAULT_FIREBASE_JWKS_URL};
use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 8080;
const MAX_UPLOAD_SIZE_MB: u64 = 20;
const JWKS_CACHE_TTL_SECS: u64 = 3600;
const MIN_STATIC_TOKEN_LENGTH: usize = 32;
const LOCAL_BUCKET: &str = "local-bucket";
const LOCAL_STORAGE_PATH: &str = "./data/storage";

/// How bearer tokens are verified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Firebase ID tokens checked against Google's JWKS
    Firebase,
    /// Fixed tokens from configuration, for local development
    Static,
}

impl FromStr for AuthMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "firebase" => Ok(AuthMode::Firebase),
            "static" => Ok(AuthMode::Static),
            _ => Err(anyhow::anyhow!("Invalid auth mode: {}", s)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    pub gcs_service_account_path: Option<String>,
    pub local_storage_path: PathBuf,
    /// `<storage-host>` segment of download URLs (may include a path prefix)
    pub download_url_host: String,
}

impl StorageConfig {
    /// Bucket name; local and in-memory backends fall back to a fixed name.
    pub fn bucket_name(&self) -> Option<&str> {
        match (&self.bucket, self.backend) {
            (Some(bucket), _) => Some(bucket.as_str()),
            (None, StorageBackend::Local | StorageBackend::Memory) => Some(LOCAL_BUCKET),
            (None, _) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub firebase_project_id: Option<String>,
    pub jwks_url: String,
    pub jwks_cache_ttl_secs: u64,
    pub static_tokens: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub scratch_dir: PathBuf,
    pub max_file_size_bytes: u64,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub log_format: String,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub upload: UploadConfig,
    /// When set, record-deleted notifications must carry `Bearer <secret>`
    pub events_shared_secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            log_format: "text".to_string(),
            storage: StorageConfig {
                backend: StorageBackend::Local,
                bucket: None,
                s3_region: None,
                s3_endpoint: None,
                gcs_service_account_path: None,
                local_storage_path: PathBuf::from(LOCAL_STORAGE_PATH),
                download_url_host: DEFAULT_DOWNLOAD_URL_HOST.to_string(),
            },
            auth: AuthConfig {
                mode: AuthMode::Static,
                firebase_project_id: None,
                jwks_url: DEFAULT_FIREBASE_JWKS_URL.to_string(),
                jwks_cache_ttl_secs: JWKS_CACHE_TTL_SECS,
                static_tokens: Vec::new(),
            },
            upload: UploadConfig {
                scratch_dir: env::temp_dir(),
                max_file_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            },
            events_shared_secret: None,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Convert the configured megabyte cap to bytes, rejecting values that overflow.
fn upload_size_bytes(megabytes: u64) -> Result<u64, anyhow::Error> {
    megabytes
        .checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large: {}", megabytes))
}

/// Split a comma separated list, dropping empty entries.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or(defaults.environment);

        let server_port = match optional_var("SERVER_PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("Invalid SERVER_PORT '{}': {}", port, e))?,
            None => defaults.server_port,
        };

        let cors_origins = parse_list(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let backend = optional_var("STORAGE_BACKEND")
            .map(|s| s.parse::<StorageBackend>())
            .transpose()?
            .unwrap_or(StorageBackend::Gcs);

        let storage = StorageConfig {
            backend,
            bucket: optional_var("STORAGE_BUCKET"),
            s3_region: optional_var("S3_REGION").or_else(|| optional_var("AWS_REGION")),
            s3_endpoint: optional_var("S3_ENDPOINT"),
            gcs_service_account_path: optional_var("GOOGLE_SERVICE_ACCOUNT_PATH"),
            local_storage_path: optional_var("LOCAL_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage.local_storage_path),
            download_url_host: optional_var("DOWNLOAD_URL_HOST")
                .map(|h| h.trim_end_matches('/').to_string())
                .unwrap_or(defaults.storage.download_url_host),
        };

        let auth = AuthConfig {
            mode: optional_var("AUTH_MODE")
                .map(|s| s.parse::<AuthMode>())
                .transpose()?
                .unwrap_or(AuthMode::Firebase),
            firebase_project_id: optional_var("FIREBASE_PROJECT_ID"),
            jwks_url: optional_var("JWKS_URL").unwrap_or(defaults.auth.jwks_url),
            jwks_cache_ttl_secs: optional_var("JWKS_CACHE_TTL_SECS")
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(JWKS_CACHE_TTL_SECS),
            static_tokens: optional_var("STATIC_BEARER_TOKENS")
                .map(|s| parse_list(&s))
                .unwrap_or_default(),
        };

        let max_upload_size_mb = optional_var("MAX_UPLOAD_SIZE_MB")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let upload = UploadConfig {
            scratch_dir: optional_var("UPLOAD_SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload.scratch_dir),
            max_file_size_bytes: upload_size_bytes(max_upload_size_mb)?,
        };

        let config = Config {
            server_port,
            environment,
            cors_origins,
            log_format: optional_var("LOG_FORMAT").unwrap_or(defaults.log_format),
            storage,
            auth,
            upload,
            events_shared_secret: optional_var("EVENTS_SHARED_SECRET"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.storage.bucket_name().is_none() {
            return Err(anyhow::anyhow!(
                "STORAGE_BUCKET is required for the {} storage backend",
                self.storage.backend
            ));
        }

        if self.storage.backend == StorageBackend::S3 && self.storage.s3_region.is_none() {
            return Err(anyhow::anyhow!(
                "S3_REGION or AWS_REGION is required for the s3 storage backend"
            ));
        }

        match self.auth.mode {
            AuthMode::Firebase => {
                if self.auth.firebase_project_id.is_none() {
                    return Err(anyhow::anyhow!(
                        "FIREBASE_PROJECT_ID is required when AUTH_MODE=firebase"
                    ));
                }
            }
            AuthMode::Static => {
                if self.auth.static_tokens.is_empty() {
                    return Err(anyhow::anyhow!(
                        "STATIC_BEARER_TOKENS is required when AUTH_MODE=static"
                    ));
                }
                if self
                    .auth
                    .static_tokens
                    .iter()
                    .any(|t| t.len() < MIN_STATIC_TOKEN_LENGTH)
                {
                    return Err(anyhow::anyhow!(
                        "STATIC_BEARER_TOKENS entries must be at least {} characters long",
                        MIN_STATIC_TOKEN_LENGTH
                    ));
                }
                if self.is_production() {
                    return Err(anyhow::anyhow!(
                        "AUTH_MODE=static is not allowed in production"
                    ));
                }
            }
        }

        if self.upload.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than zero"));
        }

        Ok(())
    }
}
