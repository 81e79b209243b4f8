//! In-memory storage backend
//!
//! Map-backed implementation of [`Storage`] used by the test suite and by
//! ephemeral mode (no `DATABASE_URL`). All state lives behind one async
//! lock; identifiers come from per-entity monotonic counters starting at
//! 1, matching the serial columns of the PostgreSQL backend. Data does not
//! survive a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Storage, StorageError, StorageResult};
use crate::models::{
    Department, Employee, EmployeeDocument, InventoryItem, NewDepartment, NewEmployee,
    NewEmployeeDocument, NewInventoryItem, NewOrganization, NewUser, Organization, Session,
    UpdateDepartment, UpdateEmployee, UpdateInventoryItem, UpdateUser, User,
};

#[derive(Default)]
struct Inner {
    initialized: bool,

    organizations: HashMap<i64, Organization>,
    users: HashMap<i64, User>,
    departments: HashMap<i64, Department>,
    employees: HashMap<i64, Employee>,
    documents: HashMap<i64, EmployeeDocument>,
    inventory: HashMap<i64, InventoryItem>,
    sessions: HashMap<Uuid, Session>,

    next_organization_id: i64,
    next_user_id: i64,
    next_department_id: i64,
    next_employee_id: i64,
    next_document_id: i64,
    next_inventory_id: i64,
}

impl Inner {
    fn new() -> Self {
        Self {
            next_organization_id: 1,
            next_user_id: 1,
            next_department_id: 1,
            next_employee_id: 1,
            next_document_id: 1,
            next_inventory_id: 1,
            ..Self::default()
        }
    }

    fn create_organization(&mut self, organization: NewOrganization) -> Organization {
        let id = self.next_organization_id;
        self.next_organization_id += 1;

        let organization = Organization {
            id,
            name: organization.name,
            created_at: Utc::now(),
        };
        self.organizations.insert(id, organization.clone());
        organization
    }

    fn create_user(&mut self, user: NewUser) -> StorageResult<User> {
        if self.users.values().any(|u| u.username == user.username) {
            return Err(StorageError::Duplicate("username"));
        }

        let id = self.next_user_id;
        self.next_user_id += 1;

        let user = User {
            id,
            username: user.username,
            password: user.password,
            full_name: user.full_name,
            position: user.position,
            organization_id: user.organization_id,
            role: user.role,
            permissions: user.permissions,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }
}

/// In-memory implementation of [`Storage`]
pub struct MemStorage {
    inner: Mutex<Inner>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
        }
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted_by_id<T, F: Fn(&T) -> i64>(mut items: Vec<T>, id: F) -> Vec<T> {
    items.sort_by_key(|item| id(item));
    items
}

#[async_trait]
impl Storage for MemStorage {
    async fn is_initialized(&self) -> StorageResult<bool> {
        Ok(self.inner.lock().await.initialized)
    }

    async fn initialize(
        &self,
        organization: NewOrganization,
        admin: NewUser,
    ) -> StorageResult<(Organization, User)> {
        let mut inner = self.inner.lock().await;
        if inner.initialized {
            return Err(StorageError::AlreadyInitialized);
        }

        let organization = inner.create_organization(organization);
        let admin = inner.create_user(NewUser {
            organization_id: organization.id,
            ..admin
        })?;
        inner.initialized = true;

        Ok((organization, admin))
    }

    async fn get_organization(&self, id: i64) -> StorageResult<Option<Organization>> {
        Ok(self.inner.lock().await.organizations.get(&id).cloned())
    }

    async fn create_organization(
        &self,
        organization: NewOrganization,
    ) -> StorageResult<Organization> {
        Ok(self.inner.lock().await.create_organization(organization))
    }

    async fn get_user(&self, id: i64) -> StorageResult<Option<User>> {
        Ok(self.inner.lock().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        self.inner.lock().await.create_user(user)
    }

    async fn get_users(&self, organization_id: i64) -> StorageResult<Vec<User>> {
        let inner = self.inner.lock().await;
        let users = inner
            .users
            .values()
            .filter(|u| u.organization_id == organization_id)
            .cloned()
            .collect();
        Ok(sorted_by_id(users, |u: &User| u.id))
    }

    async fn update_user(
        &self,
        organization_id: i64,
        id: i64,
        patch: UpdateUser,
    ) -> StorageResult<Option<User>> {
        let mut inner = self.inner.lock().await;
        let Some(user) = inner
            .users
            .get_mut(&id)
            .filter(|u| u.organization_id == organization_id)
        else {
            return Ok(None);
        };

        if let Some(full_name) = patch.full_name {
            user.full_name = full_name;
        }
        if let Some(position) = patch.position {
            user.position = position;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(permissions) = patch.permissions {
            user.permissions = permissions;
        }

        Ok(Some(user.clone()))
    }

    async fn get_department(
        &self,
        organization_id: i64,
        id: i64,
    ) -> StorageResult<Option<Department>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .departments
            .get(&id)
            .filter(|d| d.organization_id == organization_id)
            .cloned())
    }

    async fn get_departments(&self, organization_id: i64) -> StorageResult<Vec<Department>> {
        let inner = self.inner.lock().await;
        let departments = inner
            .departments
            .values()
            .filter(|d| d.organization_id == organization_id)
            .cloned()
            .collect();
        Ok(sorted_by_id(departments, |d: &Department| d.id))
    }

    async fn create_department(&self, department: NewDepartment) -> StorageResult<Department> {
        let mut inner = self.inner.lock().await;
        let id = inner.next_department_id;
        inner.next_department_id += 1;

        let department = Department {
            id,
            name: department.name,
            organization_id: department.organization_id,
            created_at: Utc::now(),
        };
        inner.departments.insert(id, department.clone());
        Ok(department)
    }

    async fn update_department(
        &self,
        organization_id: i64,
        id: i64,
        patch: UpdateDepartment,
    ) -> StorageResult<Option<Department>> {
        let mut inner = self.inner.lock().await;
        let Some(department) = inner
            .departments
            .get_mut(&id)
            .filter(|d| d.organization_id == organization_id)
        else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            department.name = name;
        }

        Ok(Some(department.clone()))
    }

    async fn delete_department(&self, organization_id: i64, id: i64) -> StorageResult<bool> {
        let mut inner = self.inner.lock().await;
        let owned = inner
            .departments
            .get(&id)
            .is_some_and(|d| d.organization_id == organization_id);
        if !owned {
            return Ok(false);
        }
        Ok(inner.departments.remove(&id).is_some())
    }

    async fn get_employee(
        &self,
        organization_id: i64,
        id: i64,
    ) -> StorageResult<Option<Employee>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .employees
            .get(&id)
            .filter(|e| e.organization_id == organization_id)
            .cloned())
    }

    async fn get_employees(
        &self,
        organization_id: i64,
        department_id: Option<i64>,
    ) -> StorageResult<Vec<Employee>> {
        let inner = self.inner.lock().await;
        let employees = inner
            .employees
            .values()
            .filter(|e| {
                e.organization_id == organization_id
                    && department_id.is_none_or(|d| e.department_id == d)
            })
            .cloned()
            .collect();
        Ok(sorted_by_id(employees, |e: &Employee| e.id))
    }

    async fn create_employee(&self, employee: NewEmployee) -> StorageResult<Employee> {
        let mut inner = self.inner.lock().await;
        let id = inner.next_employee_id;
        inner.next_employee_id += 1;

        let employee = Employee {
            id,
            full_name: employee.full_name,
            department_id: employee.department_id,
            position: employee.position,
            hire_date: employee.hire_date,
            hire_order_number: employee.hire_order_number,
            passport: employee.passport,
            birth_date: employee.birth_date,
            address: employee.address,
            phone: employee.phone,
            photo: employee.photo,
            material_liability_type: employee.material_liability_type,
            material_liability_document: employee.material_liability_document,
            dismissed: false,
            dismissal_date: None,
            dismissal_order_number: None,
            organization_id: employee.organization_id,
            created_at: Utc::now(),
        };
        inner.employees.insert(id, employee.clone());
        Ok(employee)
    }

    async fn update_employee(
        &self,
        organization_id: i64,
        id: i64,
        patch: UpdateEmployee,
    ) -> StorageResult<Option<Employee>> {
        let mut inner = self.inner.lock().await;
        let Some(employee) = inner
            .employees
            .get_mut(&id)
            .filter(|e| e.organization_id == organization_id)
        else {
            return Ok(None);
        };

        if let Some(full_name) = patch.full_name {
            employee.full_name = full_name;
        }
        if let Some(department_id) = patch.department_id {
            employee.department_id = department_id;
        }
        if let Some(position) = patch.position {
            employee.position = position;
        }
        if let Some(hire_date) = patch.hire_date {
            employee.hire_date = hire_date;
        }
        if let Some(hire_order_number) = patch.hire_order_number {
            employee.hire_order_number = hire_order_number;
        }
        if let Some(passport) = patch.passport {
            employee.passport = passport;
        }
        if let Some(birth_date) = patch.birth_date {
            employee.birth_date = birth_date;
        }
        if let Some(address) = patch.address {
            employee.address = address;
        }
        if let Some(phone) = patch.phone {
            employee.phone = phone;
        }
        if let Some(photo) = patch.photo {
            employee.photo = Some(photo);
        }
        if let Some(liability) = patch.material_liability_type {
            employee.material_liability_type = liability;
        }
        if let Some(document) = patch.material_liability_document {
            employee.material_liability_document = Some(document);
        }

        Ok(Some(employee.clone()))
    }

    async fn dismiss_employee(
        &self,
        organization_id: i64,
        id: i64,
        dismissal_date: DateTime<Utc>,
        dismissal_order_number: &str,
    ) -> StorageResult<Option<Employee>> {
        let mut inner = self.inner.lock().await;
        let Some(employee) = inner
            .employees
            .get_mut(&id)
            .filter(|e| e.organization_id == organization_id)
        else {
            return Ok(None);
        };

        if employee.dismissed {
            return Err(StorageError::AlreadyDismissed);
        }

        employee.dismissed = true;
        employee.dismissal_date = Some(dismissal_date);
        employee.dismissal_order_number = Some(dismissal_order_number.to_string());

        Ok(Some(employee.clone()))
    }

    async fn get_employee_documents(
        &self,
        organization_id: i64,
        employee_id: i64,
    ) -> StorageResult<Vec<EmployeeDocument>> {
        let inner = self.inner.lock().await;
        let owned = inner
            .employees
            .get(&employee_id)
            .is_some_and(|e| e.organization_id == organization_id);
        if !owned {
            return Ok(Vec::new());
        }

        let documents = inner
            .documents
            .values()
            .filter(|d| d.employee_id == employee_id)
            .cloned()
            .collect();
        Ok(sorted_by_id(documents, |d: &EmployeeDocument| d.id))
    }

    async fn add_employee_document(
        &self,
        organization_id: i64,
        document: NewEmployeeDocument,
    ) -> StorageResult<Option<EmployeeDocument>> {
        let mut inner = self.inner.lock().await;
        let owned = inner
            .employees
            .get(&document.employee_id)
            .is_some_and(|e| e.organization_id == organization_id);
        if !owned {
            return Ok(None);
        }

        let id = inner.next_document_id;
        inner.next_document_id += 1;

        let document = EmployeeDocument {
            id,
            employee_id: document.employee_id,
            filename: document.filename,
            path: document.path,
            upload_date: Utc::now(),
        };
        inner.documents.insert(id, document.clone());
        Ok(Some(document))
    }

    async fn delete_employee_document(
        &self,
        organization_id: i64,
        id: i64,
    ) -> StorageResult<Option<EmployeeDocument>> {
        let mut inner = self.inner.lock().await;
        let owned = inner.documents.get(&id).is_some_and(|d| {
            inner
                .employees
                .get(&d.employee_id)
                .is_some_and(|e| e.organization_id == organization_id)
        });
        if !owned {
            return Ok(None);
        }
        Ok(inner.documents.remove(&id))
    }

    async fn get_inventory_item(
        &self,
        organization_id: i64,
        id: i64,
    ) -> StorageResult<Option<InventoryItem>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .inventory
            .get(&id)
            .filter(|i| i.organization_id == organization_id)
            .cloned())
    }

    async fn get_inventory_items(
        &self,
        organization_id: i64,
        employee_id: i64,
    ) -> StorageResult<Vec<InventoryItem>> {
        let inner = self.inner.lock().await;
        let items = inner
            .inventory
            .values()
            .filter(|i| i.organization_id == organization_id && i.employee_id == employee_id)
            .cloned()
            .collect();
        Ok(sorted_by_id(items, |i: &InventoryItem| i.id))
    }

    async fn get_inventory_items_by_department(
        &self,
        organization_id: i64,
        department_id: i64,
    ) -> StorageResult<Vec<InventoryItem>> {
        let inner = self.inner.lock().await;
        let items = inner
            .inventory
            .values()
            .filter(|i| i.organization_id == organization_id && i.department_id == department_id)
            .cloned()
            .collect();
        Ok(sorted_by_id(items, |i: &InventoryItem| i.id))
    }

    async fn create_inventory_item(
        &self,
        item: NewInventoryItem,
    ) -> StorageResult<InventoryItem> {
        let mut inner = self.inner.lock().await;
        if inner
            .inventory
            .values()
            .any(|i| i.inventory_number == item.inventory_number)
        {
            return Err(StorageError::Duplicate("inventory number"));
        }

        let id = inner.next_inventory_id;
        inner.next_inventory_id += 1;

        let item = InventoryItem {
            id,
            name: item.name,
            inventory_number: item.inventory_number,
            description: item.description,
            cost: item.cost,
            employee_id: item.employee_id,
            department_id: item.department_id,
            organization_id: item.organization_id,
            created_at: Utc::now(),
        };
        inner.inventory.insert(id, item.clone());
        Ok(item)
    }

    async fn update_inventory_item(
        &self,
        organization_id: i64,
        id: i64,
        patch: UpdateInventoryItem,
    ) -> StorageResult<Option<InventoryItem>> {
        let mut inner = self.inner.lock().await;

        if let Some(number) = &patch.inventory_number {
            if inner
                .inventory
                .values()
                .any(|i| i.id != id && &i.inventory_number == number)
            {
                return Err(StorageError::Duplicate("inventory number"));
            }
        }

        let Some(item) = inner
            .inventory
            .get_mut(&id)
            .filter(|i| i.organization_id == organization_id)
        else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(inventory_number) = patch.inventory_number {
            item.inventory_number = inventory_number;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(cost) = patch.cost {
            item.cost = cost;
        }
        if let Some(employee_id) = patch.employee_id {
            item.employee_id = employee_id;
        }
        if let Some(department_id) = patch.department_id {
            item.department_id = department_id;
        }

        Ok(Some(item.clone()))
    }

    async fn delete_inventory_item(&self, organization_id: i64, id: i64) -> StorageResult<bool> {
        let mut inner = self.inner.lock().await;
        let owned = inner
            .inventory
            .get(&id)
            .is_some_and(|i| i.organization_id == organization_id);
        if !owned {
            return Ok(false);
        }
        Ok(inner.inventory.remove(&id).is_some())
    }

    async fn create_session(
        &self,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<Session> {
        let mut inner = self.inner.lock().await;
        let session = Session {
            token: Uuid::new_v4(),
            user_id,
            expires_at,
            created_at: Utc::now(),
        };
        inner.sessions.insert(session.token, session.clone());
        Ok(session)
    }

    async fn get_session(&self, token: Uuid) -> StorageResult<Option<Session>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sessions
            .get(&token)
            .filter(|s| s.expires_at > Utc::now())
            .cloned())
    }

    async fn delete_session(&self, token: Uuid) -> StorageResult<bool> {
        Ok(self.inner.lock().await.sessions.remove(&token).is_some())
    }

    async fn delete_expired_sessions(&self) -> StorageResult<u64> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| s.expires_at > now);
        Ok((before - inner.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::models::{MaterialLiabilityType, Permission};

    fn new_admin(username: &str, organization_id: i64) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "hash".to_string(),
            full_name: "Admin".to_string(),
            position: "Director".to_string(),
            organization_id,
            role: "admin".to_string(),
            permissions: vec![Permission::FullAccess],
        }
    }

    fn new_employee(organization_id: i64, department_id: i64) -> NewEmployee {
        NewEmployee {
            full_name: "Ivanov Ivan".to_string(),
            department_id,
            position: "Engineer".to_string(),
            hire_date: Utc::now(),
            hire_order_number: "42-k".to_string(),
            passport: "4500 123456".to_string(),
            birth_date: Utc::now() - Duration::days(365 * 30),
            address: "Moscow".to_string(),
            phone: "+7 900 000-00-00".to_string(),
            photo: None,
            material_liability_type: MaterialLiabilityType::None,
            material_liability_document: None,
            organization_id,
        }
    }

    fn new_item(organization_id: i64, number: &str, employee_id: i64, department_id: i64) -> NewInventoryItem {
        NewInventoryItem {
            name: "Laptop".to_string(),
            inventory_number: number.to_string(),
            description: "Work laptop".to_string(),
            cost: 120_000,
            employee_id,
            department_id,
            organization_id,
        }
    }

    #[tokio::test]
    async fn initialize_assigns_first_ids_and_flips_the_sentinel() {
        let storage = MemStorage::new();
        assert!(!storage.is_initialized().await.unwrap());

        let (org, admin) = storage
            .initialize(
                NewOrganization {
                    name: "Acme".to_string(),
                },
                new_admin("admin", 0),
            )
            .await
            .unwrap();

        assert_eq!(org.id, 1);
        assert_eq!(admin.id, 1);
        assert_eq!(admin.organization_id, 1);
        assert!(storage.is_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn initialize_twice_is_rejected_and_creates_nothing() {
        let storage = MemStorage::new();
        storage
            .initialize(
                NewOrganization {
                    name: "Acme".to_string(),
                },
                new_admin("admin", 0),
            )
            .await
            .unwrap();

        let second = storage
            .initialize(
                NewOrganization {
                    name: "Globex".to_string(),
                },
                new_admin("admin2", 0),
            )
            .await;

        assert!(matches!(second, Err(StorageError::AlreadyInitialized)));
        assert!(storage.get_organization(2).await.unwrap().is_none());
        assert!(storage.get_user_by_username("admin2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let storage = MemStorage::new();
        let org = storage
            .create_organization(NewOrganization {
                name: "Acme".to_string(),
            })
            .await
            .unwrap();

        storage.create_user(new_admin("admin", org.id)).await.unwrap();
        let duplicate = storage.create_user(new_admin("admin", org.id)).await;

        assert!(matches!(duplicate, Err(StorageError::Duplicate("username"))));
    }

    #[tokio::test]
    async fn user_patch_can_regrant_permissions() {
        let storage = MemStorage::new();
        let org = storage
            .create_organization(NewOrganization {
                name: "Acme".to_string(),
            })
            .await
            .unwrap();
        let user = storage.create_user(new_admin("clerk", org.id)).await.unwrap();

        let updated = storage
            .update_user(
                org.id,
                user.id,
                UpdateUser {
                    position: Some("Senior clerk".to_string()),
                    permissions: Some(vec![Permission::ManageDepartments]),
                    ..UpdateUser::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.position, "Senior clerk");
        assert_eq!(updated.permissions, vec![Permission::ManageDepartments]);
        assert_eq!(updated.username, "clerk");

        // Wrong tenant sees nothing to update
        let foreign = storage
            .update_user(org.id + 1, user.id, UpdateUser::default())
            .await
            .unwrap();
        assert!(foreign.is_none());
    }

    #[tokio::test]
    async fn updates_merge_the_patch_and_report_missing_ids() {
        let storage = MemStorage::new();
        let department = storage
            .create_department(NewDepartment {
                name: "Sales".to_string(),
                organization_id: 1,
            })
            .await
            .unwrap();

        let updated = storage
            .update_department(
                1,
                department.id,
                UpdateDepartment {
                    name: Some("Marketing".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Marketing");

        let missing = storage
            .update_department(1, 999, UpdateDepartment::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn tenant_scoping_hides_other_organizations() {
        let storage = MemStorage::new();
        let department = storage
            .create_department(NewDepartment {
                name: "Sales".to_string(),
                organization_id: 1,
            })
            .await
            .unwrap();
        let employee = storage.create_employee(new_employee(1, department.id)).await.unwrap();

        assert!(storage.get_department(2, department.id).await.unwrap().is_none());
        assert!(storage.get_employee(2, employee.id).await.unwrap().is_none());
        assert!(storage.get_employees(2, None).await.unwrap().is_empty());
        assert!(!storage.delete_department(2, department.id).await.unwrap());

        let foreign_patch = storage
            .update_employee(2, employee.id, UpdateEmployee::default())
            .await
            .unwrap();
        assert!(foreign_patch.is_none());
    }

    #[tokio::test]
    async fn employees_can_be_filtered_by_department() {
        let storage = MemStorage::new();
        let sales = storage
            .create_department(NewDepartment {
                name: "Sales".to_string(),
                organization_id: 1,
            })
            .await
            .unwrap();
        let warehouse = storage
            .create_department(NewDepartment {
                name: "Warehouse".to_string(),
                organization_id: 1,
            })
            .await
            .unwrap();

        storage.create_employee(new_employee(1, sales.id)).await.unwrap();
        storage.create_employee(new_employee(1, sales.id)).await.unwrap();
        storage.create_employee(new_employee(1, warehouse.id)).await.unwrap();

        assert_eq!(storage.get_employees(1, None).await.unwrap().len(), 3);
        assert_eq!(storage.get_employees(1, Some(sales.id)).await.unwrap().len(), 2);
        assert_eq!(
            storage.get_employees(1, Some(warehouse.id)).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn dismissal_is_one_way() {
        let storage = MemStorage::new();
        let employee = storage.create_employee(new_employee(1, 1)).await.unwrap();
        assert!(!employee.dismissed);

        let when = Utc::now();
        let dismissed = storage
            .dismiss_employee(1, employee.id, when, "77-u")
            .await
            .unwrap()
            .unwrap();
        assert!(dismissed.dismissed);
        assert_eq!(dismissed.dismissal_date, Some(when));
        assert_eq!(dismissed.dismissal_order_number.as_deref(), Some("77-u"));

        let again = storage
            .dismiss_employee(1, employee.id, Utc::now(), "78-u")
            .await;
        assert!(matches!(again, Err(StorageError::AlreadyDismissed)));
    }

    #[tokio::test]
    async fn inventory_lookups_are_tenant_scoped() {
        let storage = MemStorage::new();
        let item = storage.create_inventory_item(new_item(1, "INV-1", 1, 1)).await.unwrap();

        let found = storage.get_inventory_item(1, item.id).await.unwrap().unwrap();
        assert_eq!(found.inventory_number, "INV-1");

        assert!(storage.get_inventory_item(2, item.id).await.unwrap().is_none());
        assert!(storage.get_inventory_item(1, 999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn inventory_numbers_are_unique_across_the_store() {
        let storage = MemStorage::new();
        storage.create_inventory_item(new_item(1, "INV-1", 1, 1)).await.unwrap();

        // Same number under a different organization still collides
        let duplicate = storage.create_inventory_item(new_item(2, "INV-1", 9, 9)).await;
        assert!(matches!(
            duplicate,
            Err(StorageError::Duplicate("inventory number"))
        ));

        let item = storage.create_inventory_item(new_item(1, "INV-2", 1, 1)).await.unwrap();
        let renumbered = storage
            .update_inventory_item(
                1,
                item.id,
                UpdateInventoryItem {
                    inventory_number: Some("INV-1".to_string()),
                    ..UpdateInventoryItem::default()
                },
            )
            .await;
        assert!(matches!(
            renumbered,
            Err(StorageError::Duplicate("inventory number"))
        ));
    }

    #[tokio::test]
    async fn department_stats_count_employees_and_inventory() {
        let storage = MemStorage::new();
        let sales = storage
            .create_department(NewDepartment {
                name: "Sales".to_string(),
                organization_id: 1,
            })
            .await
            .unwrap();

        let stats = storage.get_department_stats(1).await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].department_name, "Sales");
        assert_eq!(stats[0].employee_count, 0);
        assert_eq!(stats[0].inventory_count, 0);

        let employee = storage.create_employee(new_employee(1, sales.id)).await.unwrap();
        storage
            .create_inventory_item(new_item(1, "INV-1", employee.id, sales.id))
            .await
            .unwrap();
        storage
            .create_inventory_item(new_item(1, "INV-2", employee.id, sales.id))
            .await
            .unwrap();

        let stats = storage.get_department_stats(1).await.unwrap();
        assert_eq!(stats[0].employee_count, 1);
        assert_eq!(stats[0].inventory_count, 2);
    }

    #[tokio::test]
    async fn documents_are_scoped_through_the_owning_employee() {
        let storage = MemStorage::new();
        let employee = storage.create_employee(new_employee(1, 1)).await.unwrap();

        let document = storage
            .add_employee_document(
                1,
                NewEmployeeDocument {
                    employee_id: employee.id,
                    filename: "contract.pdf".to_string(),
                    path: "/uploads/documents/abc.pdf".to_string(),
                },
            )
            .await
            .unwrap()
            .unwrap();

        // Wrong tenant: invisible and undeletable
        assert!(storage.get_employee_documents(2, employee.id).await.unwrap().is_empty());
        assert!(storage.delete_employee_document(2, document.id).await.unwrap().is_none());

        // Unknown employee: rejected
        assert!(
            storage
                .add_employee_document(
                    1,
                    NewEmployeeDocument {
                        employee_id: 999,
                        filename: "x.pdf".to_string(),
                        path: "/uploads/documents/x.pdf".to_string(),
                    },
                )
                .await
                .unwrap()
                .is_none()
        );

        let deleted = storage
            .delete_employee_document(1, document.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(deleted.path, "/uploads/documents/abc.pdf");
        assert!(storage.get_employee_documents(1, employee.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_sessions_are_invisible_and_swept() {
        let storage = MemStorage::new();
        let live = storage
            .create_session(1, Utc::now() + Duration::hours(24))
            .await
            .unwrap();
        let expired = storage
            .create_session(1, Utc::now() - Duration::minutes(1))
            .await
            .unwrap();

        assert!(storage.get_session(live.token).await.unwrap().is_some());
        assert!(storage.get_session(expired.token).await.unwrap().is_none());

        assert_eq!(storage.delete_expired_sessions().await.unwrap(), 1);
        assert!(storage.delete_session(live.token).await.unwrap());
        assert!(storage.get_session(live.token).await.unwrap().is_none());
    }
}
