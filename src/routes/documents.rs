use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    db::models::{
        api::ApiResponse,
        document::{
            CreateDocumentRequest, DocumentListQuery, DownloadLinkQuery, ResolveDownloadQuery, UpdateDocumentRequest,
            VersionUpload,
        },
    },
    error::AppError,
    middleware::auth::AuthUserInfo,
    services::DocumentsService,
};

pub async fn get_documents(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
    Query(query): Query<DocumentListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let documents = DocumentsService::list(&mut conn, &ctx, project_id, query.category.as_deref())?;
    Ok(Json(ApiResponse::success(documents, "Documents retrieved successfully")))
}

pub async fn create_document(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let document = DocumentsService::create(&mut conn, &ctx, project_id, &payload)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(document, "Document created successfully"))))
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path((project_id, document_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let document = DocumentsService::get(&mut conn, &ctx, project_id, document_id)?;
    Ok(Json(ApiResponse::success(document, "Document retrieved successfully")))
}

pub async fn update_document(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path((project_id, document_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let document = DocumentsService::update(&mut conn, &ctx, project_id, document_id, &payload)?;
    Ok(Json(ApiResponse::success(document, "Document updated successfully")))
}

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path((project_id, document_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    DocumentsService::delete(&mut conn, &ctx, project_id, document_id)?;
    Ok(Json(ApiResponse::<()>::ok("Document deleted successfully")))
}

pub async fn get_versions(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path((project_id, document_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let versions = DocumentsService::versions(&mut conn, &ctx, project_id, document_id)?;
    Ok(Json(ApiResponse::success(versions, "Versions retrieved successfully")))
}

pub async fn add_version(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path((project_id, document_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<VersionUpload>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let document = DocumentsService::add_version(&mut conn, &ctx, project_id, document_id, &payload)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::created(document, "Version added successfully"))))
}

pub async fn create_download_link(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Path((project_id, document_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<DownloadLinkQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = auth_info.context()?;
    let mut conn = state.db.get()?;
    let link = DocumentsService::download_link(&mut conn, &ctx, &state.signer, project_id, document_id, query.version)?;
    Ok(Json(ApiResponse::success(link, "Download link created")))
}

/// Public: the signed token is the credential.
pub async fn resolve_download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResolveDownloadQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.db.get()?;
    let resolved = DocumentsService::resolve(&mut conn, &state.signer, &query.token)?;
    Ok(Json(ApiResponse::success(resolved, "Download resolved")))
}
