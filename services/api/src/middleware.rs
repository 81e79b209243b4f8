//! Session authentication middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::error;

use crate::{
    auth::has_permission,
    error::ApiError,
    models::{Permission, User},
    state::AppState,
};

/// The authenticated user, injected into request extensions by
/// [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
}

impl CurrentUser {
    /// The tenant every storage call of this request is scoped to
    pub fn organization_id(&self) -> i64 {
        self.user.organization_id
    }

    /// Gate a mutating operation on a permission
    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        if has_permission(&self.user.permissions, permission) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// Reject requests without a live session; attach the user otherwise
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let jar = CookieJar::from_headers(req.headers());
    let token = jar
        .get(crate::session::SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(ApiError::Unauthorized)?;

    let user = state
        .sessions
        .resolve(&token)
        .await
        .map_err(|e| {
            error!("failed to resolve session: {e}");
            ApiError::Internal
        })?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(CurrentUser { user });

    Ok(next.run(req).await)
}
