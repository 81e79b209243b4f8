//! Domain models and request/response payloads

pub mod department;
pub mod document;
pub mod employee;
pub mod inventory;
pub mod organization;
pub mod session;
pub mod user;

// Re-export for convenience
pub use department::{CreateDepartmentRequest, Department, DepartmentStats, NewDepartment, UpdateDepartment};
pub use document::{EmployeeDocument, NewEmployeeDocument};
pub use employee::{
    CreateEmployeeRequest, Employee, MaterialLiabilityType, NewEmployee, UpdateEmployee,
};
pub use inventory::{
    CreateInventoryItemRequest, InventoryItem, NewInventoryItem, UpdateInventoryItem,
};
pub use organization::{NewOrganization, Organization};
pub use session::Session;
pub use user::{CreateUserRequest, NewUser, Permission, UpdateUser, User, UserResponse};
