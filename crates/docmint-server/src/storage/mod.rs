use anyhow::{Context, Result};
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};
use axum::body::Bytes;
use docmint_common::checksum::sha256_hex;
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::content::ContentStream;

pub mod config;

/// S3-compatible blob storage for template content
#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
}

impl Storage {
    pub async fn new(config: config::StorageConfig) -> Result<Self> {
        debug!(
            bucket = %config.bucket,
            endpoint = ?config.endpoint,
            region = %config.region,
            "Initializing storage"
        );

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "docmint-storage",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!("Storage client initialized for bucket: {}", config.bucket);

        Ok(Self {
            client,
            bucket: config.bucket,
        })
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn upload(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<UploadResult> {
        let checksum = sha256_hex(&data);
        let size = data.len() as i64;

        debug!("Uploading {} bytes to s3://{}/{}", size, self.bucket, key);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request.send().await.context("Failed to upload to S3")?;

        info!("Successfully uploaded to s3://{}/{}", self.bucket, key);

        Ok(UploadResult {
            key: key.to_string(),
            checksum,
            size,
        })
    }

    /// Open a streamed read of an object's bytes
    #[instrument(skip(self))]
    pub async fn download_stream(&self, key: &str) -> Result<ContentStream> {
        debug!("Getting stream from s3://{}/{}", self.bucket, key);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to get stream from S3: {}", key))?;

        Ok(ReaderStream::new(response.body.into_async_read()).boxed())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<()> {
        debug!("Deleting s3://{}/{}", self.bucket, key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to delete from S3: {}", key))?;

        info!("Deleted s3://{}/{}", self.bucket, key);
        Ok(())
    }

    /// Keys under `prefix`, at most one listing page
    #[instrument(skip(self))]
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .send()
            .await
            .context("Failed to list S3 objects")?;

        Ok(response
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(str::to_string))
            .collect())
    }

    /// Create the bucket unless it already exists
    pub async fn ensure_bucket(&self) -> Result<()> {
        if self.client.head_bucket().bucket(&self.bucket).send().await.is_ok() {
            return Ok(());
        }

        self.client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .with_context(|| format!("Failed to create bucket {}", self.bucket))?;

        info!("Created bucket: {}", self.bucket);
        Ok(())
    }

    /// Object key for a template's content
    pub fn template_key(&self, id: Uuid, filename: &str) -> String {
        template_key(id, filename)
    }
}

fn template_key(id: Uuid, filename: &str) -> String {
    let name: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("templates/{}/{}", id, name)
}

#[derive(Debug, Clone)]
pub struct UploadResult {
    pub key: String,
    pub checksum: String,
    pub size: i64,
}
