//! API endpoint URL builders

/// Build bulk file (job) details URL
pub fn bulk_file_url(base_url: &str, job_id: &str) -> String {
    format!("{}/api/bulk-files/{}", base_url, job_id)
}

/// Build ingestion status URL
pub fn ingestion_status_url(base_url: &str, job_id: &str) -> String {
    format!("{}/api/bulk-files/{}/ingestion-status", base_url, job_id)
}

/// Build document type details URL
pub fn document_type_url(base_url: &str, document_type_id: &str) -> String {
    format!("{}/api/document-types/{}", base_url, document_type_id)
}

/// Resolve a source location that may be relative to the backend
pub fn source_url(base_url: &str, location: &str) -> String {
    if location.starts_with("http://") || location.starts_with("https://") {
        location.to_string()
    } else if location.starts_with('/') {
        format!("{}{}", base_url, location)
    } else {
        format!("{}/{}", base_url, location)
    }
}
