use fixwidth_common::Result;

use crate::config::{env_or, env_parse_or};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_PROCESSED_BUCKET: &str = "processed";
pub const DEFAULT_MINIO_HOST: &str = "localhost";
pub const DEFAULT_MINIO_PORT: u16 = 9000;
pub const DEFAULT_CREDENTIAL: &str = "minioadmin";

/// Object storage settings for processed output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// S3 API endpoint; `None` means AWS
    pub endpoint: Option<String>,
    /// Base URL used when reporting object locations, defaults to `endpoint`
    pub public_url: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub path_style: bool,
}

impl StorageConfig {
    /// Load from `S3_*` variables, falling back to the `MINIO_*` set used by
    /// the local stack
    pub fn from_env() -> Result<Self> {
        let endpoint = match std::env::var("S3_ENDPOINT") {
            Ok(endpoint) => Some(endpoint),
            Err(_) => {
                let host = env_or("MINIO_HOST", DEFAULT_MINIO_HOST);
                let port: u16 = env_parse_or("MINIO_PORT", DEFAULT_MINIO_PORT)?;
                Some(format!("http://{}:{}", host, port))
            },
        };

        Ok(Self {
            endpoint,
            public_url: std::env::var("S3_PUBLIC_URL").ok(),
            region: env_or("S3_REGION", DEFAULT_REGION),
            bucket: env_or("PROCESSED_BUCKET", DEFAULT_PROCESSED_BUCKET),
            access_key: std::env::var("S3_ACCESS_KEY")
                .or_else(|_| std::env::var("MINIO_ROOT_USER"))
                .unwrap_or_else(|_| DEFAULT_CREDENTIAL.to_string()),
            secret_key: std::env::var("S3_SECRET_KEY")
                .or_else(|_| std::env::var("MINIO_ROOT_PASSWORD"))
                .unwrap_or_else(|_| DEFAULT_CREDENTIAL.to_string()),
            path_style: env_parse_or("S3_PATH_STYLE", true)?,
        })
    }

    pub fn for_minio(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            public_url: None,
            region: DEFAULT_REGION.to_string(),
            bucket: bucket.into(),
            access_key: DEFAULT_CREDENTIAL.to_string(),
            secret_key: DEFAULT_CREDENTIAL.to_string(),
            path_style: true,
        }
    }

    /// Public URL of an object in the configured bucket
    pub fn object_url(&self, key: &str) -> String {
        match self.public_url.as_deref().or(self.endpoint.as_deref()) {
            Some(base) => format!("{}/{}/{}", base.trim_end_matches('/'), self.bucket, key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }
}
