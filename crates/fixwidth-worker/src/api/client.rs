//! HTTP client for the backend API
//!
//! One client serves metadata reads, status writes and source downloads.
//! Metadata and status calls use a bounded timeout; downloads are only
//! bounded on connect, since a large source can legitimately stream for a
//! long time.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::api::endpoints;
use crate::api::types::{DocumentType, JobDescriptor, OutputUpdate, StatusUpdate};
use crate::collaborators::{ChunkStream, MetadataClient, SourceReader, StatusReporter};
use crate::models::{JobStatus, ReportedSummary};

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("GET {} returned an error status", url))?;

        response
            .json()
            .await
            .with_context(|| format!("GET {} returned an unexpected body", url))
    }
}

#[async_trait]
impl MetadataClient for BackendClient {
    #[instrument(skip(self))]
    async fn fetch_job(&self, job_id: &str) -> Result<JobDescriptor> {
        self.get_json(&endpoints::bulk_file_url(&self.base_url, job_id))
            .await
    }

    #[instrument(skip(self))]
    async fn fetch_document_type(&self, document_type_id: &str) -> Result<DocumentType> {
        self.get_json(&endpoints::document_type_url(&self.base_url, document_type_id))
            .await
    }
}

#[async_trait]
impl StatusReporter for BackendClient {
    #[instrument(skip(self, summary))]
    async fn set_status(
        &self,
        job_id: &str,
        status: JobStatus,
        summary: Option<&ReportedSummary>,
    ) -> Result<()> {
        let url = endpoints::ingestion_status_url(&self.base_url, job_id);

        self.client
            .patch(&url)
            .timeout(self.request_timeout)
            .json(&StatusUpdate { status, summary })
            .send()
            .await
            .with_context(|| format!("PATCH {} failed", url))?
            .error_for_status()
            .with_context(|| format!("PATCH {} returned an error status", url))?;

        debug!(job_id, %status, "Status updated");
        Ok(())
    }

    #[instrument(skip(self, summary))]
    async fn record_output(
        &self,
        job_id: &str,
        output_location: &str,
        summary: Option<&ReportedSummary>,
    ) -> Result<()> {
        let url = endpoints::bulk_file_url(&self.base_url, job_id);

        self.client
            .put(&url)
            .timeout(self.request_timeout)
            .json(&OutputUpdate {
                clean_file_url: output_location,
                ingestion_summary: summary,
            })
            .send()
            .await
            .with_context(|| format!("PUT {} failed", url))?
            .error_for_status()
            .with_context(|| format!("PUT {} returned an error status", url))?;

        Ok(())
    }
}

#[async_trait]
impl SourceReader for BackendClient {
    #[instrument(skip(self))]
    async fn open(&self, location: &str) -> Result<ChunkStream> {
        let url = endpoints::source_url(&self.base_url, location);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to download {}", url))?
            .error_for_status()
            .with_context(|| format!("Failed to download {}", url))?;

        debug!(url = %url, size = ?response.content_length(), "Source stream opened");

        Ok(response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .context("Source stream interrupted")
            })
            .boxed())
    }
}
