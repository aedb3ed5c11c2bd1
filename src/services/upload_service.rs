use crate::config::AppConfig;
use crate::services::storage::StorageService;
use crate::utils::validation::{effective_content_type, sanitize_filename, storage_key};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::{error, info, warn};

/// The ways an upload can fail. Each one is reported inline on the page.
#[derive(Error, Debug)]
pub enum UploadError {
    /// Missing file, empty filename or an unreadable form
    #[error("{0}")]
    Input(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials, network or service failure reported by the storage backend
    #[error("Upload error: {0:#}")]
    Backend(#[from] anyhow::Error),
}

impl UploadError {
    pub fn no_file() -> Self {
        UploadError::Input("No file selected".to_string())
    }
}

/// A file received from the client, alive for the duration of one request
pub struct UploadedFile<'a> {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub body: Box<dyn AsyncRead + Unpin + Send + 'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    pub filename: String,
    pub key: String,
    pub url: String,
    pub bucket: String,
    pub region: String,
}

pub struct UploadService {
    storage: Arc<dyn StorageService>,
    config: Arc<AppConfig>,
}

impl UploadService {
    pub fn new(storage: Arc<dyn StorageService>, config: Arc<AppConfig>) -> Self {
        Self { storage, config }
    }

    pub async fn upload(&self, file: UploadedFile<'_>) -> Result<UploadResult, UploadError> {
        let original = file.filename.as_deref().unwrap_or_default();
        if original.is_empty() {
            warn!("Empty filename");
            return Err(UploadError::no_file());
        }

        let filename = sanitize_filename(original).ok_or_else(|| {
            warn!("Filename '{}' has no usable characters", original);
            UploadError::Input(format!("Invalid filename: '{}'", original))
        })?;
        info!("📤 Receiving file: {}", filename);

        let bucket = self.config.bucket.as_deref().ok_or_else(|| {
            error!("Upload rejected: BUCKET_NAME is not defined");
            UploadError::Config("BUCKET_NAME environment variable is not defined".to_string())
        })?;

        let key = storage_key(&filename, Utc::now());
        let content_type = effective_content_type(file.content_type.as_deref());

        info!(
            "Uploading '{}' ({}) to s3://{}/{}",
            filename, content_type, bucket, key
        );

        let size = self
            .storage
            .put_object(bucket, &key, &content_type, file.body)
            .await
            .map_err(|e| {
                error!("❌ Upload of {} failed: {:#}", key, e);
                UploadError::Backend(e)
            })?;

        let url = self.config.object_url(bucket, &key);
        info!("✅ Uploaded {} bytes: {}", size, url);

        Ok(UploadResult {
            filename,
            key,
            url,
            bucket: bucket.to_string(),
            region: self.config.region.clone(),
        })
    }
}
