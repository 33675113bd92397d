use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    db::models::document::{
        CreateDocumentRequest, Document, DocumentInfo, DocumentVersion, DownloadLink, NewDocument, NewDocumentVersion,
        ResolvedDownload, UpdateDocumentRequest, VersionUpload,
    },
    db::repositories::documents::DocumentsRepo,
    error::AppError,
    middleware::rbac::Permission,
    services::{context::RequestContext, projects_service::ProjectsService},
    utils::SignedUrlSigner,
    validation::document::{
        validate_checksum, validate_document_title, validate_file_name, validate_size, validate_storage_key,
    },
};

pub struct DocumentsService;

impl DocumentsService {
    fn find(conn: &mut PgConnection, ctx: &RequestContext, project_id: Uuid, document_id: Uuid) -> Result<Document, AppError> {
        ProjectsService::find(conn, ctx, project_id)?;
        DocumentsRepo::find_in_project(conn, project_id, document_id)?.ok_or_else(|| AppError::not_found("Document"))
    }

    pub fn list(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
        category: Option<&str>,
    ) -> Result<Vec<DocumentInfo>, AppError> {
        ctx.require(Permission::ViewAll)?;
        ProjectsService::find(conn, ctx, project_id)?;
        let documents = DocumentsRepo::list_by_project(conn, project_id, category)?;
        documents.into_iter().map(|document| with_latest(conn, document)).collect()
    }

    pub fn get(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
        document_id: Uuid,
    ) -> Result<DocumentInfo, AppError> {
        ctx.require(Permission::ViewAll)?;
        let document = Self::find(conn, ctx, project_id, document_id)?;
        with_latest(conn, document)
    }

    pub fn versions(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
        document_id: Uuid,
    ) -> Result<Vec<DocumentVersion>, AppError> {
        ctx.require(Permission::ViewAll)?;
        let document = Self::find(conn, ctx, project_id, document_id)?;
        Ok(DocumentsRepo::list_versions(conn, document.id)?)
    }

    /// Creates the document together with its first version.
    pub fn create(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
        req: &CreateDocumentRequest,
    ) -> Result<DocumentInfo, AppError> {
        ctx.require(Permission::ManageDocuments)?;
        ProjectsService::find(conn, ctx, project_id)?;
        validate_document_title(&req.title)?;
        validate_upload(&req.file)?;

        conn.transaction::<DocumentInfo, AppError, _>(|conn| {
            let document = DocumentsRepo::insert(
                conn,
                &NewDocument {
                    project_id,
                    title: req.title.trim().to_string(),
                    category: req.category.clone(),
                    current_version: 1,
                    created_by: ctx.user_id,
                },
            )?;
            let version = DocumentsRepo::insert_version(conn, &new_version(document.id, 1, ctx.user_id, &req.file))?;
            Ok(DocumentInfo {
                document,
                latest: Some(version),
            })
        })
    }

    /// Appends a version numbered one past the current one.
    pub fn add_version(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
        document_id: Uuid,
        upload: &VersionUpload,
    ) -> Result<DocumentInfo, AppError> {
        ctx.require(Permission::ManageDocuments)?;
        Self::find(conn, ctx, project_id, document_id)?;
        validate_upload(upload)?;

        conn.transaction::<DocumentInfo, AppError, _>(|conn| {
            let locked = DocumentsRepo::lock(conn, document_id)?;
            let number = locked.current_version + 1;
            let version = DocumentsRepo::insert_version(conn, &new_version(document_id, number, ctx.user_id, upload))?;
            let document = DocumentsRepo::set_current_version(conn, document_id, number)?;
            Ok(DocumentInfo {
                document,
                latest: Some(version),
            })
        })
    }

    pub fn update(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        project_id: Uuid,
        document_id: Uuid,
        req: &UpdateDocumentRequest,
    ) -> Result<DocumentInfo, AppError> {
        ctx.require(Permission::ManageDocuments)?;
        Self::find(conn, ctx, project_id, document_id)?;
        if let Some(title) = &req.title {
            validate_document_title(title)?;
        }
        let document = DocumentsRepo::update_metadata(
            conn,
            document_id,
            req.title.as_ref().map(|t| t.trim().to_string()),
            req.category.clone(),
        )?;
        with_latest(conn, document)
    }

    pub fn delete(conn: &mut PgConnection, ctx: &RequestContext, project_id: Uuid, document_id: Uuid) -> Result<(), AppError> {
        ctx.require(Permission::ManageDocuments)?;
        Self::find(conn, ctx, project_id, document_id)?;
        DocumentsRepo::delete(conn, document_id)?;
        Ok(())
    }

    /// Signs a download token for `version`, or the current version.
    pub fn download_link(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        signer: &SignedUrlSigner,
        project_id: Uuid,
        document_id: Uuid,
        version: Option<i32>,
    ) -> Result<DownloadLink, AppError> {
        ctx.require(Permission::ViewAll)?;
        let document = Self::find(conn, ctx, project_id, document_id)?;
        let number = version.unwrap_or(document.current_version);
        if DocumentsRepo::find_version(conn, document.id, number)?.is_none() {
            return Err(AppError::not_found("Document version"));
        }

        let (token, expires_at) = signer.sign(document.id, number);
        Ok(DownloadLink {
            document_id: document.id,
            version: number,
            token,
            expires_at,
        })
    }

    /// Resolves a download token to the stored object. The token itself is
    /// the credential.
    pub fn resolve(conn: &mut PgConnection, signer: &SignedUrlSigner, token: &str) -> Result<ResolvedDownload, AppError> {
        let claims = signer.verify(token)?;
        let version = DocumentsRepo::find_version(conn, claims.document_id, claims.version)?
            .ok_or_else(|| AppError::not_found("Document version"))?;
        Ok(ResolvedDownload {
            document_id: version.document_id,
            version: version.version,
            file_name: version.file_name,
            content_type: version.content_type,
            storage_key: version.storage_key,
            checksum_sha256: version.checksum_sha256,
        })
    }
}

fn validate_upload(upload: &VersionUpload) -> Result<(), AppError> {
    validate_file_name(&upload.file_name)?;
    validate_size(upload.size_bytes)?;
    validate_checksum(&upload.checksum_sha256)?;
    validate_storage_key(&upload.storage_key)?;
    Ok(())
}

fn new_version(document_id: Uuid, version: i32, uploaded_by: Uuid, upload: &VersionUpload) -> NewDocumentVersion {
    NewDocumentVersion {
        document_id,
        version,
        file_name: upload.file_name.trim().to_string(),
        content_type: upload.content_type.clone(),
        size_bytes: upload.size_bytes,
        storage_key: upload.storage_key.clone(),
        checksum_sha256: upload.checksum_sha256.to_ascii_lowercase(),
        uploaded_by,
        note: upload.note.clone(),
    }
}

fn with_latest(conn: &mut PgConnection, document: Document) -> Result<DocumentInfo, AppError> {
    let latest = DocumentsRepo::find_version(conn, document.id, document.current_version)?;
    Ok(DocumentInfo { document, latest })
}
