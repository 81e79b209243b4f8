//! Inventory item routes

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
    models::{CreateInventoryItemRequest, Permission, UpdateInventoryItem},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryQuery {
    pub employee_id: Option<i64>,
    pub department_id: Option<i64>,
}

/// List inventory by employee or by department; one of the two filters is
/// required
pub async fn list_inventory(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<InventoryQuery>,
) -> ApiResult<impl IntoResponse> {
    let organization_id = current.organization_id();

    let items = if let Some(employee_id) = query.employee_id {
        state
            .storage
            .get_inventory_items(organization_id, employee_id)
            .await?
    } else if let Some(department_id) = query.department_id {
        state
            .storage
            .get_inventory_items_by_department(organization_id, department_id)
            .await?
    } else {
        return Err(ApiError::BadRequest(
            "employeeId or departmentId query parameter is required".to_string(),
        ));
    };

    Ok(Json(items))
}

/// Create an inventory item
pub async fn create_item(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateInventoryItemRequest>,
) -> ApiResult<impl IntoResponse> {
    current.require(Permission::ManageLiability)?;

    if payload.name.trim().is_empty() || payload.inventory_number.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "item name and inventory number are required".to_string(),
        ));
    }

    let item = state
        .storage
        .create_inventory_item(payload.into_new_item(current.organization_id()))
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// Patch an inventory item
pub async fn update_item(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(patch): Json<UpdateInventoryItem>,
) -> ApiResult<impl IntoResponse> {
    current.require(Permission::ManageLiability)?;

    let item = state
        .storage
        .update_inventory_item(current.organization_id(), id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("inventory item not found".to_string()))?;

    Ok(Json(item))
}

/// Delete an inventory item
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    current.require(Permission::ManageLiability)?;

    let deleted = state
        .storage
        .delete_inventory_item(current.organization_id(), id)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound("inventory item not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
