//! Organization model
//!
//! The organization is the tenant boundary: every other entity carries an
//! organization id and all queries are scoped by it. Organizations are
//! never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Organization entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// New organization payload
#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
}
