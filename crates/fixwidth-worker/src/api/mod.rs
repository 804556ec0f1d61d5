//! Backend API access
//!
//! HTTP client for job metadata, status reporting and raw source download.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::BackendClient;
pub use types::*;
