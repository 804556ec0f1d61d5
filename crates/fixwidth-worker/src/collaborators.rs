//! Services a job depends on but does not own
//!
//! The lifecycle and dispatcher only talk to these traits. Production
//! implementations live in [`crate::api`], [`crate::storage`] and
//! [`crate::notify`]; tests substitute in-memory fakes.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::path::Path;

use crate::api::types::{DocumentType, JobDescriptor};
use crate::models::{JobStatus, ReportedSummary};

/// Raw source bytes in delivery order, chunked arbitrarily
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>>>;

/// Read access to job and document type metadata
#[async_trait]
pub trait MetadataClient: Send + Sync {
    async fn fetch_job(&self, job_id: &str) -> Result<JobDescriptor>;

    async fn fetch_document_type(&self, document_type_id: &str) -> Result<DocumentType>;
}

/// Write access to a job's ingestion status
///
/// Callers treat failures as non-fatal.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn set_status(
        &self,
        job_id: &str,
        status: JobStatus,
        summary: Option<&ReportedSummary>,
    ) -> Result<()>;

    /// Attach the processed output location to the job
    async fn record_output(
        &self,
        job_id: &str,
        output_location: &str,
        summary: Option<&ReportedSummary>,
    ) -> Result<()>;
}

/// Opens a job's raw source as a byte stream
#[async_trait]
pub trait SourceReader: Send + Sync {
    async fn open(&self, location: &str) -> Result<ChunkStream>;
}

/// Destination for processed CSV files
#[async_trait]
pub trait OutputStore: Send + Sync {
    /// Store the file at `path` under `key`, returning its public location
    async fn put_csv(&self, key: &str, path: &Path) -> Result<String>;
}

/// Delivers job identifiers, one payload per notification
#[async_trait]
pub trait NotificationSource: Send {
    /// Next payload, or `None` once the source is closed for good
    async fn recv(&mut self) -> Result<Option<String>>;
}
