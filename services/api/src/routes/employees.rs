//! Employee routes, including the dismissal transition and document records

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::{CreateEmployeeRequest, Permission, UpdateEmployee},
    routes::uploads,
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeesQuery {
    pub department_id: Option<i64>,
}

/// Request for the dismissal transition; both fields are mandatory
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DismissRequest {
    #[serde(default)]
    pub dismissal_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dismissal_order_number: Option<String>,
}

/// List the organization's employees, optionally narrowed to a department
pub async fn list_employees(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<EmployeesQuery>,
) -> ApiResult<impl IntoResponse> {
    let employees = state
        .storage
        .get_employees(current.organization_id(), query.department_id)
        .await?;
    Ok(Json(employees))
}

/// Fetch one employee
pub async fn get_employee(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let employee = state
        .storage
        .get_employee(current.organization_id(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("employee not found".to_string()))?;
    Ok(Json(employee))
}

/// Create an employee; new employees start active
pub async fn create_employee(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateEmployeeRequest>,
) -> ApiResult<impl IntoResponse> {
    current.require(Permission::ManageEmployees)?;

    if payload.full_name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "employee full name is required".to_string(),
        ));
    }

    let employee = state
        .storage
        .create_employee(payload.into_new_employee(current.organization_id()))
        .await?;

    Ok((StatusCode::CREATED, Json(employee)))
}

/// Patch an employee
pub async fn update_employee(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(patch): Json<UpdateEmployee>,
) -> ApiResult<impl IntoResponse> {
    current.require(Permission::ManageEmployees)?;

    let employee = state
        .storage
        .update_employee(current.organization_id(), id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("employee not found".to_string()))?;

    Ok(Json(employee))
}

/// Dismiss an employee
///
/// A dedicated transition rather than a field update: the date and order
/// number are both required, and a dismissed employee stays dismissed.
pub async fn dismiss_employee(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<DismissRequest>,
) -> ApiResult<impl IntoResponse> {
    current.require(Permission::ManageEmployees)?;

    let (Some(dismissal_date), Some(dismissal_order_number)) = (
        payload.dismissal_date,
        payload
            .dismissal_order_number
            .filter(|number| !number.trim().is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "dismissal date and order number are required".to_string(),
        ));
    };

    let employee = state
        .storage
        .dismiss_employee(
            current.organization_id(),
            id,
            dismissal_date,
            &dismissal_order_number,
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("employee not found".to_string()))?;

    Ok(Json(employee))
}

/// List an employee's attached documents
pub async fn list_documents(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let documents = state
        .storage
        .get_employee_documents(current.organization_id(), id)
        .await?;
    Ok(Json(documents))
}

/// Delete a document record and its stored file
pub async fn delete_document(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    current.require(Permission::ManageEmployees)?;

    let document = state
        .storage
        .delete_employee_document(current.organization_id(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("document not found".to_string()))?;

    // The record is gone either way; losing the file is only worth a warning
    if let Some(path) = uploads::stored_file_path(&state.config.upload_dir, &document.path) {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), "failed to remove stored document: {e}");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}
