//! Inventory item model
//!
//! An item is attributed to exactly one employee; the department id is
//! carried redundantly so department-level listings and stats do not have
//! to join through employees.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inventory item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    /// Unique across the whole store, not just per organization
    pub inventory_number: String,
    pub description: String,
    /// Cost in minor currency units
    pub cost: i32,
    pub employee_id: i64,
    pub department_id: i64,
    pub organization_id: i64,
    pub created_at: DateTime<Utc>,
}

/// New inventory item payload for the storage layer
#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub name: String,
    pub inventory_number: String,
    pub description: String,
    pub cost: i32,
    pub employee_id: i64,
    pub department_id: i64,
    pub organization_id: i64,
}

/// Inventory item update payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInventoryItem {
    pub name: Option<String>,
    pub inventory_number: Option<String>,
    pub description: Option<String>,
    pub cost: Option<i32>,
    pub employee_id: Option<i64>,
    pub department_id: Option<i64>,
}

/// Request for creating an inventory item
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInventoryItemRequest {
    pub name: String,
    pub inventory_number: String,
    pub description: String,
    pub cost: i32,
    pub employee_id: i64,
    pub department_id: i64,
}

impl CreateInventoryItemRequest {
    /// Attach the acting user's organization id to form a storage payload
    pub fn into_new_item(self, organization_id: i64) -> NewInventoryItem {
        NewInventoryItem {
            name: self.name,
            inventory_number: self.inventory_number,
            description: self.description,
            cost: self.cost,
            employee_id: self.employee_id,
            department_id: self.department_id,
            organization_id,
        }
    }
}
