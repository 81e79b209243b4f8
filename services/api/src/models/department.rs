//! Department model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Department entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub organization_id: i64,
    pub created_at: DateTime<Utc>,
}

/// New department payload for the storage layer
#[derive(Debug, Clone)]
pub struct NewDepartment {
    pub name: String,
    pub organization_id: i64,
}

/// Department update payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartment {
    pub name: Option<String>,
}

/// Request for creating a department
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartmentRequest {
    pub name: String,
}

/// Per-department aggregate returned by `GET /api/departments?stats=true`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentStats {
    pub department_id: i64,
    pub department_name: String,
    pub employee_count: i64,
    pub inventory_count: i64,
}
