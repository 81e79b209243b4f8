//! File uploads and authenticated serving of stored files
//!
//! Photos and documents land on disk under the configured upload
//! directory with UUID filenames; the database only holds the URL path.
//! Everything under `/uploads` is served through the session gate, never
//! as public static files.

use std::path::{Path as FsPath, PathBuf};

use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::{NewEmployeeDocument, UpdateEmployee},
    state::AppState,
};

/// Content types accepted for the document field: PDF, Word, Excel and
/// images
const DOCUMENT_TYPES: [&str; 5] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// Pull one named file field out of a multipart body
pub async fn read_file_field(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<(String, Option<String>, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart request: {e}")))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("uploaded file has no filename".to_string()))?;
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read uploaded file: {e}")))?
            .to_vec();

        if data.is_empty() {
            return Err(ApiError::BadRequest("uploaded file is empty".to_string()));
        }

        return Ok((filename, content_type, data));
    }

    Err(ApiError::BadRequest(format!(
        "multipart field '{field_name}' is missing"
    )))
}

/// Resolve a stored `/uploads/...` URL path back to the file on disk
///
/// Rejects anything that is not a plain relative path below the upload
/// directory.
pub fn stored_file_path(upload_dir: &FsPath, url_path: &str) -> Option<PathBuf> {
    let relative = url_path.strip_prefix("/uploads/")?;
    if relative.is_empty() || relative.split('/').any(|part| part.is_empty() || part == "..") {
        return None;
    }
    Some(upload_dir.join(relative))
}

async fn store_file(
    upload_dir: &FsPath,
    subdir: &str,
    original_filename: &str,
    data: &[u8],
) -> Result<String, ApiError> {
    let extension = FsPath::new(original_filename)
        .extension()
        .and_then(|ext| ext.to_str());
    let filename = match extension {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_lowercase()),
        None => Uuid::new_v4().to_string(),
    };

    let dir = upload_dir.join(subdir);
    tokio::fs::create_dir_all(&dir).await.map_err(|e| {
        error!("failed to create upload directory: {e}");
        ApiError::Internal
    })?;
    tokio::fs::write(dir.join(&filename), data).await.map_err(|e| {
        error!("failed to store uploaded file: {e}");
        ApiError::Internal
    })?;

    Ok(format!("/uploads/{subdir}/{filename}"))
}

/// Upload an employee photo and point the employee record at it
pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(employee_id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let organization_id = current.organization_id();
    if state
        .storage
        .get_employee(organization_id, employee_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("employee not found".to_string()));
    }

    let (filename, content_type, data) = read_file_field(&mut multipart, "photo").await?;
    if !content_type.as_deref().is_some_and(|ct| ct.starts_with("image/")) {
        return Err(ApiError::BadRequest(
            "only image uploads are accepted for photos".to_string(),
        ));
    }

    let photo_url = store_file(&state.config.upload_dir, "photos", &filename, &data).await?;

    let employee = state
        .storage
        .update_employee(
            organization_id,
            employee_id,
            UpdateEmployee {
                photo: Some(photo_url.clone()),
                ..UpdateEmployee::default()
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("employee not found".to_string()))?;

    info!(employee_id, "photo uploaded");

    Ok(Json(json!({
        "success": true,
        "photoUrl": photo_url,
        "employee": employee,
    })))
}

/// Upload a document and attach its record to an employee
pub async fn upload_document(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(employee_id): Path<i64>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let organization_id = current.organization_id();
    if state
        .storage
        .get_employee(organization_id, employee_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("employee not found".to_string()));
    }

    let (filename, content_type, data) = read_file_field(&mut multipart, "document").await?;
    let accepted = content_type
        .as_deref()
        .is_some_and(|ct| DOCUMENT_TYPES.contains(&ct) || ct.starts_with("image/"));
    if !accepted {
        return Err(ApiError::BadRequest(
            "unsupported document format".to_string(),
        ));
    }

    let path = store_file(&state.config.upload_dir, "documents", &filename, &data).await?;

    let document = state
        .storage
        .add_employee_document(
            organization_id,
            NewEmployeeDocument {
                employee_id,
                filename,
                path,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("employee not found".to_string()))?;

    info!(employee_id, document_id = document.id, "document uploaded");

    Ok(Json(json!({
        "success": true,
        "document": document,
    })))
}

/// Serve a stored upload to an authenticated user
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let file_path = stored_file_path(&state.config.upload_dir, &format!("/uploads/{path}"))
        .ok_or_else(|| ApiError::BadRequest("invalid file path".to_string()))?;

    let data = tokio::fs::read(&file_path)
        .await
        .map_err(|_| ApiError::NotFound("file not found".to_string()))?;

    let content_type = mime_guess::from_path(&file_path).first_or_octet_stream();

    Ok(([(header::CONTENT_TYPE, content_type.to_string())], data))
}
