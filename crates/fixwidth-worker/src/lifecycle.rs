//! Lifecycle of a single ingestion job
//!
//! [`JobRunner::run`] takes one job from `pending` to `completed` or `failed`:
//! metadata, schema, source stream, pipeline, upload, status. Status writes are
//! best effort; the returned `Result` is the authoritative outcome.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::collaborators::{MetadataClient, OutputStore, SourceReader, StatusReporter};
use crate::error::{JobFailure, Result};
use crate::models::{JobStatus, JobSummary, ReportedSummary};
use crate::pipeline::IngestionPipeline;
use crate::reassembler::DEFAULT_MAX_LINE_BYTES;
use crate::schema::Schema;
use crate::storage::output_key;

#[derive(Clone)]
pub struct JobRunner {
    metadata: Arc<dyn MetadataClient>,
    status: Arc<dyn StatusReporter>,
    source: Arc<dyn SourceReader>,
    output: Arc<dyn OutputStore>,
    max_line_bytes: usize,
}

impl JobRunner {
    pub fn new(
        metadata: Arc<dyn MetadataClient>,
        status: Arc<dyn StatusReporter>,
        source: Arc<dyn SourceReader>,
        output: Arc<dyn OutputStore>,
    ) -> Self {
        Self {
            metadata,
            status,
            source,
            output,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Run one job to a terminal status
    #[instrument(skip(self))]
    pub async fn run(&self, job_id: &str) -> Result<JobSummary> {
        let mut tracker = StatusTracker::new(job_id, &*self.status);

        tracker.advance(JobStatus::Running, None).await?;

        match self.process(job_id).await {
            Ok(summary) => {
                tracker
                    .advance(JobStatus::Completed, Some(&summary.reported()))
                    .await?;
                info!(
                    records = summary.record_count,
                    errors = summary.error_count(),
                    "Job completed"
                );
                Ok(summary)
            },
            Err(failure) => {
                warn!(error = %failure, "Job failed");
                tracker
                    .advance(
                        JobStatus::Failed,
                        Some(&ReportedSummary::failure(failure.to_string())),
                    )
                    .await?;
                Err(failure)
            },
        }
    }

    async fn process(&self, job_id: &str) -> Result<JobSummary> {
        let job = self
            .metadata
            .fetch_job(job_id)
            .await
            .map_err(JobFailure::Metadata)?;

        let document_type = self
            .metadata
            .fetch_document_type(job.document_type.id.as_str())
            .await
            .map_err(JobFailure::Metadata)?;

        let config = match document_type.ingestion_config {
            Some(config) if config.is_fixed_width() => config,
            Some(config) => return Err(JobFailure::UnsupportedFormat(config.format)),
            None => return Err(JobFailure::UnsupportedFormat(None)),
        };
        let schema = Schema::from_config(&config)?;

        let chunks = self
            .source
            .open(&job.raw_file_url)
            .await
            .map_err(JobFailure::Source)?;

        let mut staged = tempfile::Builder::new()
            .prefix("fixwidth-")
            .suffix(".csv")
            .tempfile()?;

        let summary = IngestionPipeline::new(&schema)
            .with_max_line_bytes(self.max_line_bytes)
            .run(chunks, staged.as_file_mut())
            .await?;

        let location = self
            .output
            .put_csv(&output_key(job_id), staged.path())
            .await
            .map_err(JobFailure::Output)?;

        if let Err(e) = self
            .status
            .record_output(job_id, &location, Some(&summary.reported()))
            .await
        {
            warn!(error = %format!("{:#}", e), "Failed to record output location");
        }

        Ok(summary)
    }
}

/// Local view of a job's status, guarding forward-only transitions
struct StatusTracker<'a> {
    job_id: &'a str,
    reporter: &'a dyn StatusReporter,
    current: JobStatus,
}

impl<'a> StatusTracker<'a> {
    fn new(job_id: &'a str, reporter: &'a dyn StatusReporter) -> Self {
        Self {
            job_id,
            reporter,
            current: JobStatus::Queued,
        }
    }

    async fn advance(&mut self, next: JobStatus, summary: Option<&ReportedSummary>) -> Result<()> {
        if !self.current.can_transition_to(next) {
            return Err(JobFailure::IllegalTransition {
                from: self.current,
                to: next,
            });
        }
        self.current = next;

        if let Err(e) = self.reporter.set_status(self.job_id, next, summary).await {
            warn!(
                job_id = self.job_id,
                status = %next,
                error = %format!("{:#}", e),
                "Failed to report status"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::api::types::{DocumentType, JobDescriptor};
    use crate::collaborators::ChunkStream;
    use async_trait::async_trait;
    use futures::{stream, StreamExt};
    use serde_json::json;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct FakeMetadata {
        config: serde_json::Value,
    }

    #[async_trait]
    impl MetadataClient for FakeMetadata {
        async fn fetch_job(&self, job_id: &str) -> anyhow::Result<JobDescriptor> {
            Ok(serde_json::from_value(json!({
                "id": job_id,
                "rawFileUrl": "http://storage/raw/input.txt",
                "documentType": { "id": 3 }
            }))?)
        }

        async fn fetch_document_type(&self, id: &str) -> anyhow::Result<DocumentType> {
            Ok(serde_json::from_value(json!({
                "id": id,
                "ingestionConfig": self.config
            }))?)
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        statuses: Mutex<Vec<(JobStatus, Option<ReportedSummary>)>>,
        outputs: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl StatusReporter for RecordingReporter {
        async fn set_status(
            &self,
            _job_id: &str,
            status: JobStatus,
            summary: Option<&ReportedSummary>,
        ) -> anyhow::Result<()> {
            self.statuses
                .lock()
                .unwrap()
                .push((status, summary.cloned()));
            if self.fail {
                anyhow::bail!("backend unavailable");
            }
            Ok(())
        }

        async fn record_output(
            &self,
            _job_id: &str,
            output_location: &str,
            _summary: Option<&ReportedSummary>,
        ) -> anyhow::Result<()> {
            self.outputs
                .lock()
                .unwrap()
                .push(output_location.to_string());
            if self.fail {
                anyhow::bail!("backend unavailable");
            }
            Ok(())
        }
    }

    struct FakeSource {
        body: &'static str,
        opened: AtomicBool,
    }

    #[async_trait]
    impl SourceReader for FakeSource {
        async fn open(&self, _location: &str) -> anyhow::Result<ChunkStream> {
            self.opened.store(true, Ordering::SeqCst);
            let chunks: Vec<anyhow::Result<Vec<u8>>> = self
                .body
                .as_bytes()
                .chunks(5)
                .map(|c| Ok(c.to_vec()))
                .collect();
            Ok(stream::iter(chunks).boxed())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        files: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl OutputStore for MemoryStore {
        async fn put_csv(&self, key: &str, path: &Path) -> anyhow::Result<String> {
            let content = std::fs::read_to_string(path)?;
            self.files.lock().unwrap().push((key.to_string(), content));
            Ok(format!("http://storage/processed/{}", key))
        }
    }

    fn fixed_width_config() -> serde_json::Value {
        json!({
            "format": "fixed-width",
            "lineLength": 8,
            "fields": [
                { "name": "id", "type": "int", "length": 3 },
                { "name": "name", "type": "str", "length": 5 }
            ]
        })
    }

    struct Harness {
        reporter: Arc<RecordingReporter>,
        source: Arc<FakeSource>,
        store: Arc<MemoryStore>,
        runner: JobRunner,
    }

    fn harness(config: serde_json::Value, body: &'static str, reporter: RecordingReporter) -> Harness {
        let reporter = Arc::new(reporter);
        let source = Arc::new(FakeSource {
            body,
            opened: AtomicBool::new(false),
        });
        let store = Arc::new(MemoryStore::default());
        let runner = JobRunner::new(
            Arc::new(FakeMetadata { config }),
            reporter.clone(),
            source.clone(),
            store.clone(),
        );
        Harness {
            reporter,
            source,
            store,
            runner,
        }
    }

    fn statuses(reporter: &RecordingReporter) -> Vec<JobStatus> {
        reporter
            .statuses
            .lock()
            .unwrap()
            .iter()
            .map(|(status, _)| *status)
            .collect()
    }

    #[tokio::test]
    async fn test_malformed_line_still_completes() {
        let h = harness(
            fixed_width_config(),
            "001Alice\nabcBob  \n003Carol\n",
            RecordingReporter::default(),
        );

        let summary = h.runner.run("42").await.unwrap();

        assert_eq!(summary.record_count, 2);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(statuses(&h.reporter), vec![JobStatus::Running, JobStatus::Completed]);

        let files = h.store.files.lock().unwrap();
        assert_eq!(files[0].0, "42.csv");
        assert_eq!(files[0].1, "id,name\n1,Alice\n3,Carol\n");
        assert_eq!(
            *h.reporter.outputs.lock().unwrap(),
            vec!["http://storage/processed/42.csv".to_string()]
        );

        let completed = h.reporter.statuses.lock().unwrap()[1].1.clone().unwrap();
        assert_eq!(completed.record_count, Some(2));
        assert_eq!(completed.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_format_fails_without_reading_source() {
        let h = harness(
            json!({ "format": "csv", "fields": [] }),
            "001Alice\n",
            RecordingReporter::default(),
        );

        let err = h.runner.run("7").await.unwrap_err();

        assert!(matches!(err, JobFailure::UnsupportedFormat(Some(ref f)) if f == "csv"));
        assert!(!h.source.opened.load(Ordering::SeqCst));
        assert!(h.store.files.lock().unwrap().is_empty());
        assert_eq!(statuses(&h.reporter), vec![JobStatus::Running, JobStatus::Failed]);

        let failed = h.reporter.statuses.lock().unwrap()[1].1.clone().unwrap();
        assert_eq!(failed.errors, vec!["Unsupported format: csv".to_string()]);
        assert_eq!(failed.record_count, None);
    }

    #[tokio::test]
    async fn test_invalid_schema_fails() {
        let h = harness(
            json!({
                "format": "fixed-width",
                "fields": [{ "name": "id", "type": "int", "length": 0 }]
            }),
            "001\n",
            RecordingReporter::default(),
        );

        let err = h.runner.run("9").await.unwrap_err();

        assert!(matches!(err, JobFailure::Schema(_)));
        assert!(!h.source.opened.load(Ordering::SeqCst));
        assert_eq!(statuses(&h.reporter), vec![JobStatus::Running, JobStatus::Failed]);
    }

    #[tokio::test]
    async fn test_numeric_string_widths_are_processed() {
        let h = harness(
            json!({
                "format": "fixed-width",
                "lineLength": "8",
                "fields": [
                    { "name": "id", "type": "int", "length": "3" },
                    { "name": "name", "type": "str", "length": 5 }
                ]
            }),
            "001Alice\n",
            RecordingReporter::default(),
        );

        let summary = h.runner.run("12").await.unwrap();

        assert_eq!(summary.record_count, 1);
        assert_eq!(statuses(&h.reporter), vec![JobStatus::Running, JobStatus::Completed]);
        assert_eq!(h.store.files.lock().unwrap()[0].1, "id,name\n1,Alice\n");
    }

    #[tokio::test]
    async fn test_reported_errors_are_capped() {
        let h = harness(
            fixed_width_config(),
            "xx1a\nxx2b\nxx3c\nxx4d\nxx5e\nxx6f\nxx7g\n001Alice\n",
            RecordingReporter::default(),
        );

        let summary = h.runner.run("11").await.unwrap();

        assert_eq!(summary.errors.len(), 7);
        let completed = h.reporter.statuses.lock().unwrap()[1].1.clone().unwrap();
        assert_eq!(completed.errors.len(), 5);
        assert_eq!(completed.errors[..], summary.errors[..5]);
    }

    #[tokio::test]
    async fn test_status_failures_do_not_fail_the_job() {
        let h = harness(
            fixed_width_config(),
            "001Alice\n",
            RecordingReporter {
                fail: true,
                ..Default::default()
            },
        );

        let summary = h.runner.run("5").await.unwrap();

        assert_eq!(summary.record_count, 1);
        assert_eq!(statuses(&h.reporter), vec![JobStatus::Running, JobStatus::Completed]);
        assert_eq!(h.store.files.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tracker_rejects_backward_transition() {
        let reporter = RecordingReporter::default();
        let mut tracker = StatusTracker::new("1", &reporter);

        tracker.advance(JobStatus::Running, None).await.unwrap();
        tracker.advance(JobStatus::Completed, None).await.unwrap();
        let err = tracker.advance(JobStatus::Running, None).await.unwrap_err();

        assert!(matches!(
            err,
            JobFailure::IllegalTransition {
                from: JobStatus::Completed,
                to: JobStatus::Running
            }
        ));
        assert_eq!(statuses(&reporter).len(), 2);
    }
}
