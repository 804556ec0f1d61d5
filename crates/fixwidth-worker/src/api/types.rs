//! API request and response types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{JobStatus, ReportedSummary};
use crate::schema::IngestionConfig;

/// Backend identifier, sent either as a string (UUID) or a number
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawId")]
pub struct ResourceId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for ResourceId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(id) => ResourceId(id),
            RawId::Number(id) => ResourceId(id.to_string()),
        }
    }
}

impl ResourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bulk file awaiting ingestion
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    #[serde(default)]
    pub id: Option<ResourceId>,
    pub raw_file_url: String,
    pub document_type: DocumentTypeRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentTypeRef {
    pub id: ResourceId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentType {
    #[serde(default)]
    pub id: Option<ResourceId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ingestion_config: Option<IngestionConfig>,
}

/// Body of `PATCH /api/bulk-files/{id}/ingestion-status`
#[derive(Debug, Serialize)]
pub struct StatusUpdate<'a> {
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<&'a ReportedSummary>,
}

/// Body of `PUT /api/bulk-files/{id}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputUpdate<'a> {
    pub clean_file_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingestion_summary: Option<&'a ReportedSummary>,
}
