//! Storage abstraction
//!
//! Single point of truth for persistence. The [`Storage`] trait is
//! implemented twice — by an in-memory map-backed store used for tests and
//! ephemeral mode, and by a PostgreSQL adapter — with identical observable
//! behavior: identifiers are assigned monotonically starting at 1,
//! creation timestamps are stamped by the store, lookups report absence as
//! `Ok(None)`, updates merge a partial patch, deletes return a success
//! flag, and listings come back ordered by id.
//!
//! Tenant scoping lives here rather than in the route handlers: every
//! read, update and delete of a tenant-owned entity takes the organization
//! id as a mandatory parameter and filters by it, so a handler cannot
//! forget to scope a query.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Department, DepartmentStats, Employee, EmployeeDocument, InventoryItem, NewDepartment,
    NewEmployee, NewEmployeeDocument, NewInventoryItem, NewOrganization, NewUser, Organization,
    Session, UpdateDepartment, UpdateEmployee, UpdateInventoryItem, UpdateUser, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemStorage;
pub use postgres::PgStorage;

/// Errors raised by the storage layer
///
/// Absence of an entity is not an error — lookups return `Ok(None)` and
/// deletes return `Ok(false)`. The variants here are genuine contract
/// violations or backend failures.
#[derive(Error, Debug)]
pub enum StorageError {
    /// `initialize` was called on a store that already holds a tenant
    #[error("system is already initialized")]
    AlreadyInitialized,

    /// A unique value (username, inventory number) is already taken
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    /// `dismiss_employee` was called on an already dismissed employee
    #[error("employee is already dismissed")]
    AlreadyDismissed,

    /// Unexpected backend failure
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Result alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence contract shared by the in-memory and PostgreSQL backends
#[async_trait]
pub trait Storage: Send + Sync {
    // Setup
    /// Whether the one-time system setup has run
    async fn is_initialized(&self) -> StorageResult<bool>;
    /// Atomically create the first organization and its administrator and
    /// flip the setup sentinel; rejected once the store is initialized
    async fn initialize(
        &self,
        organization: NewOrganization,
        admin: NewUser,
    ) -> StorageResult<(Organization, User)>;

    // Organizations
    async fn get_organization(&self, id: i64) -> StorageResult<Option<Organization>>;
    async fn create_organization(
        &self,
        organization: NewOrganization,
    ) -> StorageResult<Organization>;

    // Users
    async fn get_user(&self, id: i64) -> StorageResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> StorageResult<User>;
    async fn get_users(&self, organization_id: i64) -> StorageResult<Vec<User>>;
    async fn update_user(
        &self,
        organization_id: i64,
        id: i64,
        patch: UpdateUser,
    ) -> StorageResult<Option<User>>;

    // Departments
    async fn get_department(
        &self,
        organization_id: i64,
        id: i64,
    ) -> StorageResult<Option<Department>>;
    async fn get_departments(&self, organization_id: i64) -> StorageResult<Vec<Department>>;
    async fn create_department(&self, department: NewDepartment) -> StorageResult<Department>;
    async fn update_department(
        &self,
        organization_id: i64,
        id: i64,
        patch: UpdateDepartment,
    ) -> StorageResult<Option<Department>>;
    /// No cascade: employees and inventory referencing the department keep
    /// their department id
    async fn delete_department(&self, organization_id: i64, id: i64) -> StorageResult<bool>;

    // Employees
    async fn get_employee(&self, organization_id: i64, id: i64)
    -> StorageResult<Option<Employee>>;
    async fn get_employees(
        &self,
        organization_id: i64,
        department_id: Option<i64>,
    ) -> StorageResult<Vec<Employee>>;
    async fn create_employee(&self, employee: NewEmployee) -> StorageResult<Employee>;
    async fn update_employee(
        &self,
        organization_id: i64,
        id: i64,
        patch: UpdateEmployee,
    ) -> StorageResult<Option<Employee>>;
    /// One-way transition; a second dismissal fails with
    /// [`StorageError::AlreadyDismissed`]
    async fn dismiss_employee(
        &self,
        organization_id: i64,
        id: i64,
        dismissal_date: DateTime<Utc>,
        dismissal_order_number: &str,
    ) -> StorageResult<Option<Employee>>;

    // Employee documents (scoped through the owning employee)
    async fn get_employee_documents(
        &self,
        organization_id: i64,
        employee_id: i64,
    ) -> StorageResult<Vec<EmployeeDocument>>;
    /// Returns `Ok(None)` when the employee does not exist in the
    /// organization
    async fn add_employee_document(
        &self,
        organization_id: i64,
        document: NewEmployeeDocument,
    ) -> StorageResult<Option<EmployeeDocument>>;
    /// Returns the deleted record so the caller can remove the stored file
    async fn delete_employee_document(
        &self,
        organization_id: i64,
        id: i64,
    ) -> StorageResult<Option<EmployeeDocument>>;

    // Inventory
    async fn get_inventory_item(
        &self,
        organization_id: i64,
        id: i64,
    ) -> StorageResult<Option<InventoryItem>>;
    async fn get_inventory_items(
        &self,
        organization_id: i64,
        employee_id: i64,
    ) -> StorageResult<Vec<InventoryItem>>;
    async fn get_inventory_items_by_department(
        &self,
        organization_id: i64,
        department_id: i64,
    ) -> StorageResult<Vec<InventoryItem>>;
    async fn create_inventory_item(&self, item: NewInventoryItem)
    -> StorageResult<InventoryItem>;
    async fn update_inventory_item(
        &self,
        organization_id: i64,
        id: i64,
        patch: UpdateInventoryItem,
    ) -> StorageResult<Option<InventoryItem>>;
    async fn delete_inventory_item(&self, organization_id: i64, id: i64) -> StorageResult<bool>;

    // Sessions
    async fn create_session(
        &self,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<Session>;
    /// Absent and expired sessions both come back as `Ok(None)`
    async fn get_session(&self, token: Uuid) -> StorageResult<Option<Session>>;
    async fn delete_session(&self, token: Uuid) -> StorageResult<bool>;
    /// Sweep expired rows; returns how many were removed
    async fn delete_expired_sessions(&self) -> StorageResult<u64>;

    // Statistics
    /// Employee and inventory counts per department, one pass over the
    /// organization's departments (small scale makes the O(departments ×
    /// entities) shape acceptable)
    async fn get_department_stats(
        &self,
        organization_id: i64,
    ) -> StorageResult<Vec<DepartmentStats>> {
        let departments = self.get_departments(organization_id).await?;
        let mut result = Vec::with_capacity(departments.len());

        for department in departments {
            let employees = self.get_employees(organization_id, Some(department.id)).await?;
            let inventory = self
                .get_inventory_items_by_department(organization_id, department.id)
                .await?;

            result.push(DepartmentStats {
                department_id: department.id,
                department_name: department.name,
                employee_count: employees.len() as i64,
                inventory_count: inventory.len() as i64,
            });
        }

        Ok(result)
    }
}
