//! Setup, authentication and organization routes

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{
    auth,
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::{NewOrganization, NewUser, Permission, UserResponse},
    session::SESSION_COOKIE,
    state::AppState,
    validation,
};

/// Request for the one-time system setup
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    #[serde(default)]
    pub organization_name: String,
    #[serde(default)]
    pub admin_username: String,
    #[serde(default)]
    pub admin_password: String,
    #[serde(default)]
    pub admin_full_name: String,
    #[serde(default)]
    pub admin_position: String,
}

/// Request for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api",
    }))
}

/// Whether the one-time setup has already run
pub async fn system_status(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let is_setup = state.storage.is_initialized().await?;
    Ok(Json(json!({ "isSetup": is_setup })))
}

/// One-time system setup: create the organization and its administrator,
/// then log the administrator in
pub async fn setup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SetupRequest>,
) -> ApiResult<impl IntoResponse> {
    let required = [
        payload.organization_name.trim(),
        payload.admin_username.trim(),
        payload.admin_password.trim(),
        payload.admin_full_name.trim(),
        payload.admin_position.trim(),
    ];
    if required.iter().any(|field| field.is_empty()) {
        return Err(ApiError::BadRequest(
            "all setup fields are required".to_string(),
        ));
    }

    validation::validate_username(&payload.admin_username).map_err(ApiError::BadRequest)?;
    validation::validate_password(&payload.admin_password).map_err(ApiError::BadRequest)?;

    let password = auth::hash_password(&payload.admin_password).map_err(|e| {
        error!("failed to hash password: {e}");
        ApiError::Internal
    })?;

    let (organization, admin) = state
        .storage
        .initialize(
            NewOrganization {
                name: payload.organization_name,
            },
            NewUser {
                username: payload.admin_username,
                password,
                full_name: payload.admin_full_name,
                position: payload.admin_position,
                organization_id: 0, // assigned by the store
                role: "admin".to_string(),
                permissions: vec![Permission::FullAccess],
            },
        )
        .await?;

    info!(organization = %organization.name, "system setup completed");

    let session = state.sessions.open(admin.id).await?;
    let jar = jar.add(state.sessions.cookie(&session));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({
            "message": "system configured",
            "organization": organization,
            "admin": UserResponse::from(admin),
        })),
    ))
}

/// Credential login; on success the session cookie is set
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .storage
        .get_user_by_username(&payload.username)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let verified = auth::verify_password(&payload.password, &user.password).map_err(|e| {
        error!("failed to verify password: {e}");
        ApiError::Internal
    })?;
    if !verified {
        return Err(ApiError::Unauthorized);
    }

    let session = state.sessions.open(user.id).await?;
    let jar = jar.add(state.sessions.cookie(&session));

    Ok((jar, Json(UserResponse::from(user))))
}

/// Drop the session, if any, and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let token = cookie.value().to_string();
        state.sessions.close(&token).await?;
    }

    let jar = jar.remove(state.sessions.removal_cookie());
    Ok((jar, Json(json!({ "message": "logged out" }))))
}

/// The authenticated user, password stripped
pub async fn current_user(
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(UserResponse::from(current.user)))
}

/// Fetch the caller's own organization
pub async fn get_organization(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if id != current.organization_id() {
        return Err(ApiError::Forbidden);
    }

    let organization = state
        .storage
        .get_organization(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("organization not found".to_string()))?;

    Ok(Json(organization))
}
