//! Fixwidth Worker Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Converts fixed-width text files into CSV. The backend announces each
//! uploaded file with a notification carrying its id; the worker fetches the
//! file's document type, decodes every line against the field layout and
//! uploads the resulting CSV.
//!
//! # Layers
//!
//! - **Decoding**: [`decoder`], [`reassembler`] and [`schema`] are pure and
//!   synchronous
//! - **Streaming**: [`pipeline`] drives a chunk stream into a CSV sink
//! - **Jobs**: [`lifecycle`] runs one job, [`dispatcher`] loops over
//!   notifications
//! - **Collaborators**: traits in [`collaborators`], implemented by [`api`],
//!   [`storage`] and [`notify`]
//!
//! # Example
//!
//! ```no_run
//! use fixwidth_worker::schema::{FieldDefinition, FieldType, Schema};
//! use fixwidth_worker::decoder::decode_line;
//!
//! fn main() -> anyhow::Result<()> {
//!     let schema = Schema::new(&[
//!         FieldDefinition::new("id", FieldType::Integer, 4),
//!         FieldDefinition::new("name", FieldType::Text, 6),
//!     ])?;
//!     let row = decode_line("0042Alice ", &schema)?;
//!     assert_eq!(row, vec!["42", "Alice "]);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod collaborators;
pub mod config;
pub mod decoder;
pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod reassembler;
pub mod schema;
pub mod storage;

pub use config::WorkerConfig;
pub use dispatcher::{DispatchStats, Dispatcher};
pub use error::{JobFailure, RowError, SchemaError};
pub use lifecycle::JobRunner;
pub use models::{JobStatus, JobSummary, ReportedSummary};
pub use pipeline::IngestionPipeline;
pub use schema::Schema;
