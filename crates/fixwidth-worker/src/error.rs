//! Error tiers for fixed-width ingestion
//!
//! - [`SchemaError`]: the document type's field layout is unusable. Raised once
//!   per job, before any line is read.
//! - [`RowError`]: one line could not be decoded. Recorded in the job summary;
//!   the line is dropped and the job continues.
//! - [`JobFailure`]: the job as a whole cannot finish and moves to `failed`.

use thiserror::Error;

use crate::models::JobStatus;

/// Result type alias for job-level operations
pub type Result<T> = std::result::Result<T, JobFailure>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema defines no fields")]
    NoFields,

    #[error("Field #{position} has non-positive length")]
    NonPositiveLength { position: usize },

    #[error("Field #{position} has invalid length '{value}'")]
    InvalidLength { position: usize, value: String },

    #[error("Invalid lineLength '{value}'")]
    InvalidLineLength { value: String },

    #[error("Field #{position} has unknown type '{field_type}'")]
    UnknownType { position: usize, field_type: String },

    #[error("Sum of field lengths ({total}) does not match lineLength ({line_length})")]
    LineLengthMismatch { total: usize, line_length: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("{field}: Empty integer field")]
    EmptyInteger { field: String },

    #[error("{field}: Invalid int: '{value}'")]
    InvalidInt { field: String, value: String },

    #[error("{field}: Empty float field")]
    EmptyFloat { field: String },

    #[error("{field}: Invalid float: '{value}'")]
    InvalidFloat { field: String, value: String },

    #[error("Line exceeds the maximum length of {limit} bytes")]
    LineTooLong { limit: usize },
}

#[derive(Error, Debug)]
pub enum JobFailure {
    #[error("Failed to fetch job metadata: {0:#}")]
    Metadata(anyhow::Error),

    #[error("Unsupported format: {}", .0.as_deref().unwrap_or("<none>"))]
    UnsupportedFormat(Option<String>),

    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("Failed to read source: {0:#}")]
    Source(anyhow::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to store output: {0:#}")]
    Output(anyhow::Error),

    #[error("Job cannot move from {from} to {to}")]
    IllegalTransition { from: JobStatus, to: JobStatus },
}
