//! Object storage for uploaded images and downloadable files.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;

use crate::config::StorageConfig;

/// Error returned by object storage operations.
#[derive(Debug, thiserror::Error)]
#[error("Object storage error: {0}")]
pub struct StorageError(pub String);

/// Minimal object storage surface used by the handlers.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `body` under `key`.
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    /// Remove the object at `key`. Missing objects are not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// A time-limited download URL that suggests `file_name` to the browser.
    async fn presigned_get(&self, key: &str, file_name: &str) -> Result<String, StorageError>;

    /// Permanent public URL for objects served directly (images).
    fn public_url(&self, key: &str) -> String;
}

/// [`ObjectStorage`] backed by `aws-sdk-s3`. Works with AWS S3 and
/// S3-compatible services via a custom endpoint.
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
    region: String,
    endpoint: Option<String>,
    public_base_url: Option<String>,
    presign_ttl: Duration,
}

impl S3Storage {
    /// Build a client from configuration.
    ///
    /// Static credentials are used when both key id and secret are set;
    /// otherwise the default provider chain (env, profile, IMDS) applies.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key_id.clone(),
                secret.clone(),
                None,
                None,
                "eduportal-env",
            ));
        }
        let sdk_config = loader.load().await;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint {
            s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config.build()),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
            public_base_url: config.public_base_url.clone(),
            presign_ttl: Duration::from_secs(config.presign_secs),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError(format!("put {key}: {e}")))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError(format!("delete {key}: {e}")))?;
        Ok(())
    }

    async fn presigned_get(&self, key: &str, file_name: &str) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(self.presign_ttl)
            .map_err(|e| StorageError(format!("presign config: {e}")))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .response_content_disposition(content_disposition(file_name))
            .presigned(presigning)
            .await
            .map_err(|e| StorageError(format!("presign {key}: {e}")))?;
        Ok(request.uri().to_string())
    }

    fn public_url(&self, key: &str) -> String {
        public_url_for(
            self.public_base_url.as_deref(),
            self.endpoint.as_deref(),
            &self.bucket,
            &self.region,
            key,
        )
    }
}

/// `attachment` disposition with quotes stripped from the file name.
fn content_disposition(file_name: &str) -> String {
    format!("attachment; filename=\"{}\"", file_name.replace('"', ""))
}

/// Resolve the public URL of an object: CDN base, then custom endpoint
/// (path-style), then the virtual-hosted AWS form.
pub fn public_url_for(
    public_base_url: Option<&str>,
    endpoint: Option<&str>,
    bucket: &str,
    region: &str,
    key: &str,
) -> String {
    match (public_base_url, endpoint) {
        (Some(base), _) => format!("{}/{key}", base.trim_end_matches('/')),
        (None, Some(endpoint)) => format!("{}/{bucket}/{key}", endpoint.trim_end_matches('/')),
        (None, None) => format!("https://{bucket}.s3.{region}.amazonaws.com/{key}"),
    }
}
