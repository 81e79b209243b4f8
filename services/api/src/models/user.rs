//! User model and the permission enumeration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Permissions a user account can hold
///
/// `FullAccess` short-circuits every permission check. The set is closed:
/// unknown permission strings are rejected when a payload is deserialized,
/// so handlers only ever see values from this enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    FullAccess,
    ManagePositions,
    ViewEmployeeData,
    ManageEmployees,
    ManageDepartments,
    PrintDocuments,
    ManageLiability,
}

/// User entity
///
/// `password` holds the argon2 PHC string. The struct deliberately does not
/// implement `Serialize`; responses go through [`UserResponse`], which
/// strips the hash.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub position: String,
    pub organization_id: i64,
    pub role: String,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
}

/// New user payload for the storage layer; `password` is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub position: String,
    pub organization_id: i64,
    pub role: String,
    pub permissions: Vec<Permission>,
}

/// User update payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub role: Option<String>,
    pub permissions: Option<Vec<Permission>>,
}

/// Request for creating a user account
///
/// The organization id is always taken from the acting user's session,
/// never from the payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub position: String,
    pub role: String,
    pub permissions: Vec<Permission>,
}

/// User shape returned by the API: the stored hash never leaves the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub position: String,
    pub organization_id: i64,
    pub role: String,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            position: user.position,
            organization_id: user.organization_id,
            role: user.role,
            permissions: user.permissions,
            created_at: user.created_at,
        }
    }
}
