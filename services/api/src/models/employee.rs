//! Employee model
//!
//! Employees are created active and never physically deleted; the only
//! lifecycle transition is the one-way dismissal, which goes through a
//! dedicated storage operation rather than the generic update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of material liability an employee carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialLiabilityType {
    Individual,
    Collective,
    None,
}

impl MaterialLiabilityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Collective => "collective",
            Self::None => "none",
        }
    }

    /// Parse the stored text form; anything unrecognized maps to `None`
    pub fn parse(value: &str) -> Self {
        match value {
            "individual" => Self::Individual,
            "collective" => Self::Collective,
            _ => Self::None,
        }
    }
}

/// Employee entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    pub full_name: String,
    pub department_id: i64,
    pub position: String,
    pub hire_date: DateTime<Utc>,
    pub hire_order_number: String,
    pub passport: String,
    pub birth_date: DateTime<Utc>,
    pub address: String,
    pub phone: String,
    pub photo: Option<String>,
    pub material_liability_type: MaterialLiabilityType,
    pub material_liability_document: Option<String>,
    pub dismissed: bool,
    pub dismissal_date: Option<DateTime<Utc>>,
    pub dismissal_order_number: Option<String>,
    pub organization_id: i64,
    pub created_at: DateTime<Utc>,
}

/// New employee payload for the storage layer
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub full_name: String,
    pub department_id: i64,
    pub position: String,
    pub hire_date: DateTime<Utc>,
    pub hire_order_number: String,
    pub passport: String,
    pub birth_date: DateTime<Utc>,
    pub address: String,
    pub phone: String,
    pub photo: Option<String>,
    pub material_liability_type: MaterialLiabilityType,
    pub material_liability_document: Option<String>,
    pub organization_id: i64,
}

/// Employee update payload
///
/// The dismissal fields and the organization id are deliberately absent:
/// dismissal has its own operation and the tenant of a record never
/// changes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployee {
    pub full_name: Option<String>,
    pub department_id: Option<i64>,
    pub position: Option<String>,
    pub hire_date: Option<DateTime<Utc>>,
    pub hire_order_number: Option<String>,
    pub passport: Option<String>,
    pub birth_date: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub photo: Option<String>,
    pub material_liability_type: Option<MaterialLiabilityType>,
    pub material_liability_document: Option<String>,
}

/// Request for creating an employee
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    pub full_name: String,
    pub department_id: i64,
    pub position: String,
    pub hire_date: DateTime<Utc>,
    pub hire_order_number: String,
    pub passport: String,
    pub birth_date: DateTime<Utc>,
    pub address: String,
    pub phone: String,
    #[serde(default)]
    pub photo: Option<String>,
    pub material_liability_type: MaterialLiabilityType,
    #[serde(default)]
    pub material_liability_document: Option<String>,
}

impl CreateEmployeeRequest {
    /// Attach the acting user's organization id to form a storage payload
    pub fn into_new_employee(self, organization_id: i64) -> NewEmployee {
        NewEmployee {
            full_name: self.full_name,
            department_id: self.department_id,
            position: self.position,
            hire_date: self.hire_date,
            hire_order_number: self.hire_order_number,
            passport: self.passport,
            birth_date: self.birth_date,
            address: self.address,
            phone: self.phone,
            photo: self.photo,
            material_liability_type: self.material_liability_type,
            material_liability_document: self.material_liability_document,
            organization_id,
        }
    }
}
