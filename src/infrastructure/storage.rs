use crate::config::AppConfig;
use crate::services::storage::S3StorageService;
use aws_sdk_s3::config::{Credentials, Region};
use std::sync::Arc;
use tracing::info;

/// Builds the S3 client once for the process lifetime.
///
/// A static credential provider is used when both halves of the access key
/// pair are configured, otherwise the SDK's default chain resolves them.
/// A custom endpoint switches to path-style addressing.
pub async fn setup_storage(config: &AppConfig) -> Arc<S3StorageService> {
    let mut loader = aws_config::from_env().region(Region::new(config.region.clone()));

    if let (Some(access_key), Some(secret_key)) =
        (&config.access_key_id, &config.secret_access_key)
    {
        loader = loader.credentials_provider(Credentials::new(
            access_key.clone(),
            secret_key.clone(),
            None,
            None,
            "static",
        ));
    }

    if let Some(endpoint_url) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }

    let aws_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.endpoint_url.is_some())
        .build();

    info!(
        "☁️  S3 Storage: region {} (auth: {})",
        config.region,
        config.auth_method().as_str()
    );

    Arc::new(S3StorageService::new(aws_sdk_s3::Client::from_conf(
        s3_config,
    )))
}
