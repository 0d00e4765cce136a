use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::application::ApplicationId;
use super::history::Attribution;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Resume,
    AcademicTranscript,
    InternshipReport,
    Other,
}

/// Caller-supplied metadata for a file kept in external storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    pub name: String,
    pub kind: DocumentKind,
    pub storage_key: String,
}

/// Bookkeeping row for a document attached to an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub application: ApplicationId,
    pub name: String,
    pub kind: DocumentKind,
    pub storage_key: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: Attribution,
}
