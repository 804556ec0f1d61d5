//! S3-compatible storage for processed CSV files

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};
use std::path::Path;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::collaborators::OutputStore;

pub mod config;

pub use config::StorageConfig;

pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Object key of a job's processed output
pub fn output_key(job_id: &str) -> String {
    format!("{}.csv", job_id)
}

pub struct S3OutputStore {
    client: Client,
    config: StorageConfig,
    bucket_ready: OnceCell<()>,
}

impl S3OutputStore {
    pub fn new(config: StorageConfig) -> Self {
        debug!(
            endpoint = ?config.endpoint,
            bucket = %config.bucket,
            "Initializing output storage"
        );

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "fixwidth-storage",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version_latest()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            config,
            bucket_ready: OnceCell::new(),
        }
    }

    /// Create the output bucket unless it is already there
    #[instrument(skip(self), fields(bucket = %self.config.bucket))]
    pub async fn ensure_bucket(&self) -> Result<()> {
        let bucket = &self.config.bucket;

        if self.client.head_bucket().bucket(bucket).send().await.is_ok() {
            return Ok(());
        }

        match self.client.create_bucket().bucket(bucket).send().await {
            Ok(_) => {
                info!("Created bucket {}", bucket);
                Ok(())
            },
            Err(e)
                if e.as_service_error().is_some_and(|err| {
                    err.is_bucket_already_owned_by_you() || err.is_bucket_already_exists()
                }) =>
            {
                Ok(())
            },
            Err(e) => Err(e).with_context(|| format!("Failed to create bucket {}", bucket)),
        }
    }
}

#[async_trait]
impl OutputStore for S3OutputStore {
    #[instrument(skip(self, path))]
    async fn put_csv(&self, key: &str, path: &Path) -> Result<String> {
        self.bucket_ready
            .get_or_try_init(|| self.ensure_bucket())
            .await?;

        let body = ByteStream::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(CSV_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .with_context(|| format!("Failed to upload s3://{}/{}", self.config.bucket, key))?;

        info!("Uploaded s3://{}/{}", self.config.bucket, key);

        Ok(self.config.object_url(key))
    }
}
