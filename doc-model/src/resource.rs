use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{FileId, ResourceId, TenantId};

/// The kind of content a [`Resource`] was ingested from; drives which
/// [`crate::ids::CategoryType`]-independent File Processor variant ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Pdf,
    Image,
    Csv,
    Text,
    Snippet,
}

impl FileType {
    pub fn from_mime(mime: &str) -> Self {
        match mime {
            "application/pdf" => FileType::Pdf,
            m if m.starts_with("image/") => FileType::Image,
            "text/csv" => FileType::Csv,
            _ => FileType::Text,
        }
    }
}

/// One ingested document or snippet. See spec §3 "Resource".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub resource_id: ResourceId,
    pub tenant_id: TenantId,
    pub file_id: Option<FileId>,

    pub file_name: String,
    pub mime_type: String,
    pub file_type: FileType,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// User-authored description. Never overwritten by machine extraction.
    pub summary: String,
    /// Processor-derived detail: page counts, OCR engine, reader backend, etc.
    pub technical_metadata: serde_json::Value,
    pub tags: BTreeSet<String>,

    pub vendor: Option<String>,
    pub entities: BTreeSet<String>,
    pub keywords: BTreeSet<String>,
    pub amounts_cents: BTreeSet<i64>,
    pub currency: Option<String>,
    pub dates: BTreeSet<NaiveDate>,
    pub content: String,
    pub document_embedding: Option<Vec<f32>>,
}

impl Resource {
    /// Fields whose change should trigger a reindex event (§4.L decision tree);
    /// used by callers that mutate a resource to compute `changed_fields`.
    pub fn searchable_field_names() -> &'static [&'static str] {
        &["content", "summary", "tags", "file_name", "vendor", "keywords"]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceValidationError {
    #[error("resource_id must not be empty")]
    EmptyResourceId,
    #[error("tenant_id must not be empty")]
    EmptyTenantId,
    #[error("file_name must not be empty")]
    EmptyFileName,
}

impl Resource {
    /// Best-effort structural check; does not touch storage. Mirrors the
    /// teacher's `ChunkRecord::validate_soft` convention.
    pub fn validate_soft(&self) -> Result<(), ResourceValidationError> {
        if self.resource_id.as_str().is_empty() {
            return Err(ResourceValidationError::EmptyResourceId);
        }
        if self.tenant_id.as_str().is_empty() {
            return Err(ResourceValidationError::EmptyTenantId);
        }
        if self.file_name.is_empty() {
            return Err(ResourceValidationError::EmptyFileName);
        }
        Ok(())
    }
}
