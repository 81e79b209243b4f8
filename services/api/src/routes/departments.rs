//! Department routes

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::{CreateDepartmentRequest, NewDepartment, Permission, UpdateDepartment},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct DepartmentsQuery {
    pub stats: Option<String>,
}

/// List departments; `?stats=true` returns the per-department aggregates
/// instead
pub async fn list_departments(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<DepartmentsQuery>,
) -> ApiResult<impl IntoResponse> {
    let organization_id = current.organization_id();

    if query.stats.as_deref() == Some("true") {
        let stats = state.storage.get_department_stats(organization_id).await?;
        return Ok(Json(stats).into_response());
    }

    let departments = state.storage.get_departments(organization_id).await?;
    Ok(Json(departments).into_response())
}

/// Create a department
pub async fn create_department(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateDepartmentRequest>,
) -> ApiResult<impl IntoResponse> {
    current.require(Permission::ManageDepartments)?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "department name is required".to_string(),
        ));
    }

    let department = state
        .storage
        .create_department(NewDepartment {
            name: payload.name,
            organization_id: current.organization_id(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(department)))
}

/// Patch a department
pub async fn update_department(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(patch): Json<UpdateDepartment>,
) -> ApiResult<impl IntoResponse> {
    current.require(Permission::ManageDepartments)?;

    let department = state
        .storage
        .update_department(current.organization_id(), id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("department not found".to_string()))?;

    Ok(Json(department))
}

/// Delete a department; its employees and inventory are left in place
pub async fn delete_department(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    current.require(Permission::ManageDepartments)?;

    let deleted = state
        .storage
        .delete_department(current.organization_id(), id)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound("department not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
