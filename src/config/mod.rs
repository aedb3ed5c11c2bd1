use serde::Serialize;
use std::env;
use tracing::{info, warn};
use utoipa::ToSchema;

pub const DEFAULT_REGION: &str = "eu-west-1";

/// Request body ceiling enforced by the server (16 MiB)
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 16 * 1024 * 1024;

/// How the storage client obtains its credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Static access key pair read from the environment
    AccessKey,
    /// AWS default provider chain (profile, IMDS, web identity...)
    DefaultChain,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::AccessKey => "access_key",
            AuthMethod::DefaultChain => "default_chain",
        }
    }

    /// Human readable label shown on the upload page
    pub fn label(&self) -> &'static str {
        match self {
            AuthMethod::AccessKey => "AWS Access Key",
            AuthMethod::DefaultChain => "AWS Default Credential Chain",
        }
    }
}

/// Process-wide configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// AWS region (default: "eu-west-1")
    pub region: String,

    /// Destination bucket. Uploads fail with a configuration error when unset.
    pub bucket: Option<String>,

    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,

    /// Custom S3-compatible endpoint (MinIO, etc.). Enables path-style addressing.
    pub endpoint_url: Option<String>,

    /// Maximum accepted request body in bytes (default: 16 MiB)
    pub max_upload_size: usize,

    pub host: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            bucket: None,
            access_key_id: None,
            secret_access_key: None,
            endpoint_url: None,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            region: var("AWS_REGION").unwrap_or(default.region),
            bucket: var("BUCKET_NAME"),
            access_key_id: var("AWS_ACCESS_KEY_ID"),
            secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
            endpoint_url: var("S3_ENDPOINT_URL"),
            max_upload_size: var("MAX_UPLOAD_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),
            host: var("HOST").unwrap_or(default.host),
            port: var("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),
        }
    }

    pub fn auth_method(&self) -> AuthMethod {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(_), Some(_)) => AuthMethod::AccessKey,
            _ => AuthMethod::DefaultChain,
        }
    }

    /// Public URL of an object in the configured store
    pub fn object_url(&self, bucket: &str, key: &str) -> String {
        match &self.endpoint_url {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
            None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, self.region, key),
        }
    }

    /// Logs the effective configuration with credentials masked
    pub fn log_summary(&self) {
        let mask = |v: &Option<String>| if v.is_some() { "********" } else { "not defined" };

        info!("🔧 Region: {}", self.region);
        info!(
            "🪣 Bucket: {}",
            self.bucket.as_deref().unwrap_or("not defined")
        );
        info!("🔐 AWS_ACCESS_KEY_ID: {}", mask(&self.access_key_id));
        info!("🔐 AWS_SECRET_ACCESS_KEY: {}", mask(&self.secret_access_key));
        if let Some(endpoint) = &self.endpoint_url {
            info!("☁️  Custom endpoint: {}", endpoint);
        }
        info!(
            "📏 Max upload size: {}MB",
            self.max_upload_size / 1024 / 1024
        );

        if self.bucket.is_none() {
            warn!("⚠️  BUCKET_NAME is not defined, uploads will fail until it is set");
        }
    }
}
