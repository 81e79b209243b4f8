//! User account routes

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use crate::{
    auth,
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::{CreateUserRequest, NewUser, Permission, UserResponse},
    state::AppState,
    validation,
};

/// List the caller's organization's user accounts
pub async fn list_users(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    current.require(Permission::ViewEmployeeData)?;

    let users = state.storage.get_users(current.organization_id()).await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();

    Ok(Json(users))
}

/// Create a user account inside the caller's organization
pub async fn create_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    current.require(Permission::ManageEmployees)?;

    validation::validate_username(&payload.username).map_err(ApiError::BadRequest)?;
    validation::validate_password(&payload.password).map_err(ApiError::BadRequest)?;

    let password = auth::hash_password(&payload.password).map_err(|e| {
        error!("failed to hash password: {e}");
        ApiError::Internal
    })?;

    let user = state
        .storage
        .create_user(NewUser {
            username: payload.username,
            password,
            full_name: payload.full_name,
            position: payload.position,
            organization_id: current.organization_id(),
            role: payload.role,
            permissions: payload.permissions,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}
