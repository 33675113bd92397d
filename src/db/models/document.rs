use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = crate::schema::documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Document {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub category: Option<String>,
    pub current_version: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::documents)]
pub struct NewDocument {
    pub project_id: Uuid,
    pub title: String,
    pub category: Option<String>,
    pub current_version: i32,
    pub created_by: Uuid,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = crate::schema::document_versions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentVersion {
    pub id: Uuid,
    pub document_id: Uuid,
    pub version: i32,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
    pub checksum_sha256: String,
    pub uploaded_by: Uuid,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::document_versions)]
pub struct NewDocumentVersion {
    pub document_id: Uuid,
    pub version: i32,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
    pub checksum_sha256: String,
    pub uploaded_by: Uuid,
    pub note: Option<String>,
}

/// File metadata supplied when creating a document or a new version.
#[derive(Deserialize, Clone)]
pub struct VersionUpload {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
    pub checksum_sha256: String,
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateDocumentRequest {
    pub title: String,
    pub category: Option<String>,
    #[serde(flatten)]
    pub file: VersionUpload,
}

#[derive(Deserialize)]
pub struct UpdateDocumentRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "crate::utils::double_option")]
    pub category: Option<Option<String>>,
}

#[derive(Serialize)]
pub struct DocumentInfo {
    #[serde(flatten)]
    pub document: Document,
    pub latest: Option<DocumentVersion>,
}

#[derive(Deserialize)]
pub struct DocumentListQuery {
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct DownloadLinkQuery {
    pub version: Option<i32>,
}

#[derive(Serialize)]
pub struct DownloadLink {
    pub document_id: Uuid,
    pub version: i32,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct ResolveDownloadQuery {
    pub token: String,
}

#[derive(Serialize)]
pub struct ResolvedDownload {
    pub document_id: Uuid,
    pub version: i32,
    pub file_name: String,
    pub content_type: String,
    pub storage_key: String,
    pub checksum_sha256: String,
}
