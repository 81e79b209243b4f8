//! Employee document model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file attached to an employee record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDocument {
    pub id: i64,
    pub employee_id: i64,
    /// Original filename as uploaded
    pub filename: String,
    /// URL path the stored file is served from
    pub path: String,
    pub upload_date: DateTime<Utc>,
}

/// New document payload for the storage layer
#[derive(Debug, Clone)]
pub struct NewEmployeeDocument {
    pub employee_id: i64,
    pub filename: String,
    pub path: String,
}
