//! PostgreSQL storage backend
//!
//! Each entity maps to one table (see `migrations/`); operations are
//! parameterized equality-filtered queries. Uniqueness of usernames and
//! inventory numbers is enforced by schema constraints and surfaced as
//! [`StorageError::Duplicate`]. The setup sentinel is an explicit settings
//! row, not the existence of organization #1.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{Storage, StorageError, StorageResult};
use crate::models::{
    Department, Employee, EmployeeDocument, InventoryItem, MaterialLiabilityType, NewDepartment,
    NewEmployee, NewEmployeeDocument, NewInventoryItem, NewOrganization, NewUser, Organization,
    Permission, Session, UpdateDepartment, UpdateEmployee, UpdateInventoryItem, UpdateUser, User,
};

/// Embedded schema migrations for this backend
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Settings row that marks the one-time setup as done
const SETUP_SENTINEL: &str = "system.initialized";

/// PostgreSQL implementation of [`Storage`]
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a unique-constraint violation onto the typed duplicate error
fn duplicate(field: &'static str) -> impl FnOnce(sqlx::Error) -> StorageError {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Duplicate(field),
        _ => StorageError::Database(e),
    }
}

fn map_organization(row: &PgRow) -> Organization {
    Organization {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

fn map_user(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password: row.get("password"),
        full_name: row.get("full_name"),
        position: row.get("position"),
        organization_id: row.get("organization_id"),
        role: row.get("role"),
        permissions: row.get::<Json<Vec<Permission>>, _>("permissions").0,
        created_at: row.get("created_at"),
    }
}

fn map_department(row: &PgRow) -> Department {
    Department {
        id: row.get("id"),
        name: row.get("name"),
        organization_id: row.get("organization_id"),
        created_at: row.get("created_at"),
    }
}

fn map_employee(row: &PgRow) -> Employee {
    Employee {
        id: row.get("id"),
        full_name: row.get("full_name"),
        department_id: row.get("department_id"),
        position: row.get("position"),
        hire_date: row.get("hire_date"),
        hire_order_number: row.get("hire_order_number"),
        passport: row.get("passport"),
        birth_date: row.get("birth_date"),
        address: row.get("address"),
        phone: row.get("phone"),
        photo: row.get("photo"),
        material_liability_type: MaterialLiabilityType::parse(
            &row.get::<String, _>("material_liability_type"),
        ),
        material_liability_document: row.get("material_liability_document"),
        dismissed: row.get("dismissed"),
        dismissal_date: row.get("dismissal_date"),
        dismissal_order_number: row.get("dismissal_order_number"),
        organization_id: row.get("organization_id"),
        created_at: row.get("created_at"),
    }
}

fn map_document(row: &PgRow) -> EmployeeDocument {
    EmployeeDocument {
        id: row.get("id"),
        employee_id: row.get("employee_id"),
        filename: row.get("filename"),
        path: row.get("path"),
        upload_date: row.get("upload_date"),
    }
}

fn map_inventory_item(row: &PgRow) -> InventoryItem {
    InventoryItem {
        id: row.get("id"),
        name: row.get("name"),
        inventory_number: row.get("inventory_number"),
        description: row.get("description"),
        cost: row.get("cost"),
        employee_id: row.get("employee_id"),
        department_id: row.get("department_id"),
        organization_id: row.get("organization_id"),
        created_at: row.get("created_at"),
    }
}

fn map_session(row: &PgRow) -> Session {
    Session {
        token: row.get("token"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn is_initialized(&self) -> StorageResult<bool> {
        let initialized: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM settings WHERE name = $1)")
                .bind(SETUP_SENTINEL)
                .fetch_one(&self.pool)
                .await?;
        Ok(initialized)
    }

    async fn initialize(
        &self,
        organization: NewOrganization,
        admin: NewUser,
    ) -> StorageResult<(Organization, User)> {
        let mut tx = self.pool.begin().await?;

        let initialized: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM settings WHERE name = $1)")
                .bind(SETUP_SENTINEL)
                .fetch_one(&mut *tx)
                .await?;
        if initialized {
            return Err(StorageError::AlreadyInitialized);
        }

        let organization = sqlx::query(
            r#"
            INSERT INTO organizations (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(&organization.name)
        .fetch_one(&mut *tx)
        .await
        .map(|row| map_organization(&row))?;

        let admin = sqlx::query(
            r#"
            INSERT INTO users (username, password, full_name, position, organization_id, role, permissions)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, username, password, full_name, position, organization_id, role, permissions, created_at
            "#,
        )
        .bind(&admin.username)
        .bind(&admin.password)
        .bind(&admin.full_name)
        .bind(&admin.position)
        .bind(organization.id)
        .bind(&admin.role)
        .bind(Json(&admin.permissions))
        .fetch_one(&mut *tx)
        .await
        .map(|row| map_user(&row))
        .map_err(duplicate("username"))?;

        sqlx::query("INSERT INTO settings (name, value) VALUES ($1, 'true')")
            .bind(SETUP_SENTINEL)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((organization, admin))
    }

    async fn get_organization(&self, id: i64) -> StorageResult<Option<Organization>> {
        let row = sqlx::query("SELECT id, name, created_at FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| map_organization(&row)))
    }

    async fn create_organization(
        &self,
        organization: NewOrganization,
    ) -> StorageResult<Organization> {
        let row = sqlx::query(
            r#"
            INSERT INTO organizations (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(&organization.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_organization(&row))
    }

    async fn get_user(&self, id: i64) -> StorageResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password, full_name, position, organization_id, role, permissions, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| map_user(&row)))
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password, full_name, position, organization_id, role, permissions, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| map_user(&row)))
    }

    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, password, full_name, position, organization_id, role, permissions)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, username, password, full_name, position, organization_id, role, permissions, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.full_name)
        .bind(&user.position)
        .bind(user.organization_id)
        .bind(&user.role)
        .bind(Json(&user.permissions))
        .fetch_one(&self.pool)
        .await
        .map_err(duplicate("username"))?;
        Ok(map_user(&row))
    }

    async fn get_users(&self, organization_id: i64) -> StorageResult<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, username, password, full_name, position, organization_id, role, permissions, created_at
            FROM users
            WHERE organization_id = $1
            ORDER BY id
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_user).collect())
    }

    async fn update_user(
        &self,
        organization_id: i64,
        id: i64,
        patch: UpdateUser,
    ) -> StorageResult<Option<User>> {
        let row = sqlx::query(
            r#"
            UPDATE users
            SET full_name = COALESCE($3, full_name),
                position = COALESCE($4, position),
                role = COALESCE($5, role),
                permissions = COALESCE($6, permissions)
            WHERE id = $2 AND organization_id = $1
            RETURNING id, username, password, full_name, position, organization_id, role, permissions, created_at
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .bind(patch.full_name)
        .bind(patch.position)
        .bind(patch.role)
        .bind(patch.permissions.map(Json))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| map_user(&row)))
    }

    async fn get_department(
        &self,
        organization_id: i64,
        id: i64,
    ) -> StorageResult<Option<Department>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, organization_id, created_at
            FROM departments
            WHERE id = $2 AND organization_id = $1
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| map_department(&row)))
    }

    async fn get_departments(&self, organization_id: i64) -> StorageResult<Vec<Department>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, organization_id, created_at
            FROM departments
            WHERE organization_id = $1
            ORDER BY id
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_department).collect())
    }

    async fn create_department(&self, department: NewDepartment) -> StorageResult<Department> {
        let row = sqlx::query(
            r#"
            INSERT INTO departments (name, organization_id)
            VALUES ($1, $2)
            RETURNING id, name, organization_id, created_at
            "#,
        )
        .bind(&department.name)
        .bind(department.organization_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_department(&row))
    }

    async fn update_department(
        &self,
        organization_id: i64,
        id: i64,
        patch: UpdateDepartment,
    ) -> StorageResult<Option<Department>> {
        let row = sqlx::query(
            r#"
            UPDATE departments
            SET name = COALESCE($3, name)
            WHERE id = $2 AND organization_id = $1
            RETURNING id, name, organization_id, created_at
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .bind(patch.name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| map_department(&row)))
    }

    async fn delete_department(&self, organization_id: i64, id: i64) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $2 AND organization_id = $1")
            .bind(organization_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_employee(
        &self,
        organization_id: i64,
        id: i64,
    ) -> StorageResult<Option<Employee>> {
        let row = sqlx::query(
            r#"
            SELECT id, full_name, department_id, position, hire_date, hire_order_number,
                   passport, birth_date, address, phone, photo, material_liability_type,
                   material_liability_document, dismissed, dismissal_date,
                   dismissal_order_number, organization_id, created_at
            FROM employees
            WHERE id = $2 AND organization_id = $1
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| map_employee(&row)))
    }

    async fn get_employees(
        &self,
        organization_id: i64,
        department_id: Option<i64>,
    ) -> StorageResult<Vec<Employee>> {
        let rows = sqlx::query(
            r#"
            SELECT id, full_name, department_id, position, hire_date, hire_order_number,
                   passport, birth_date, address, phone, photo, material_liability_type,
                   material_liability_document, dismissed, dismissal_date,
                   dismissal_order_number, organization_id, created_at
            FROM employees
            WHERE organization_id = $1 AND ($2::BIGINT IS NULL OR department_id = $2)
            ORDER BY id
            "#,
        )
        .bind(organization_id)
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_employee).collect())
    }

    async fn create_employee(&self, employee: NewEmployee) -> StorageResult<Employee> {
        let row = sqlx::query(
            r#"
            INSERT INTO employees (full_name, department_id, position, hire_date,
                                   hire_order_number, passport, birth_date, address, phone,
                                   photo, material_liability_type, material_liability_document,
                                   organization_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, full_name, department_id, position, hire_date, hire_order_number,
                      passport, birth_date, address, phone, photo, material_liability_type,
                      material_liability_document, dismissed, dismissal_date,
                      dismissal_order_number, organization_id, created_at
            "#,
        )
        .bind(&employee.full_name)
        .bind(employee.department_id)
        .bind(&employee.position)
        .bind(employee.hire_date)
        .bind(&employee.hire_order_number)
        .bind(&employee.passport)
        .bind(employee.birth_date)
        .bind(&employee.address)
        .bind(&employee.phone)
        .bind(&employee.photo)
        .bind(employee.material_liability_type.as_str())
        .bind(&employee.material_liability_document)
        .bind(employee.organization_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_employee(&row))
    }

    async fn update_employee(
        &self,
        organization_id: i64,
        id: i64,
        patch: UpdateEmployee,
    ) -> StorageResult<Option<Employee>> {
        let row = sqlx::query(
            r#"
            UPDATE employees
            SET full_name = COALESCE($3, full_name),
                department_id = COALESCE($4, department_id),
                position = COALESCE($5, position),
                hire_date = COALESCE($6, hire_date),
                hire_order_number = COALESCE($7, hire_order_number),
                passport = COALESCE($8, passport),
                birth_date = COALESCE($9, birth_date),
                address = COALESCE($10, address),
                phone = COALESCE($11, phone),
                photo = COALESCE($12, photo),
                material_liability_type = COALESCE($13, material_liability_type),
                material_liability_document = COALESCE($14, material_liability_document)
            WHERE id = $2 AND organization_id = $1
            RETURNING id, full_name, department_id, position, hire_date, hire_order_number,
                      passport, birth_date, address, phone, photo, material_liability_type,
                      material_liability_document, dismissed, dismissal_date,
                      dismissal_order_number, organization_id, created_at
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .bind(patch.full_name)
        .bind(patch.department_id)
        .bind(patch.position)
        .bind(patch.hire_date)
        .bind(patch.hire_order_number)
        .bind(patch.passport)
        .bind(patch.birth_date)
        .bind(patch.address)
        .bind(patch.phone)
        .bind(patch.photo)
        .bind(patch.material_liability_type.map(|t| t.as_str()))
        .bind(patch.material_liability_document)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| map_employee(&row)))
    }

    async fn dismiss_employee(
        &self,
        organization_id: i64,
        id: i64,
        dismissal_date: DateTime<Utc>,
        dismissal_order_number: &str,
    ) -> StorageResult<Option<Employee>> {
        let Some(current) = self.get_employee(organization_id, id).await? else {
            return Ok(None);
        };
        if current.dismissed {
            return Err(StorageError::AlreadyDismissed);
        }

        // The dismissed = FALSE guard keeps a concurrent double dismissal
        // from overwriting the first one's date and order number.
        let row = sqlx::query(
            r#"
            UPDATE employees
            SET dismissed = TRUE, dismissal_date = $3, dismissal_order_number = $4
            WHERE id = $2 AND organization_id = $1 AND dismissed = FALSE
            RETURNING id, full_name, department_id, position, hire_date, hire_order_number,
                      passport, birth_date, address, phone, photo, material_liability_type,
                      material_liability_document, dismissed, dismissal_date,
                      dismissal_order_number, organization_id, created_at
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .bind(dismissal_date)
        .bind(dismissal_order_number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(map_employee(&row))),
            None => Err(StorageError::AlreadyDismissed),
        }
    }

    async fn get_employee_documents(
        &self,
        organization_id: i64,
        employee_id: i64,
    ) -> StorageResult<Vec<EmployeeDocument>> {
        let rows = sqlx::query(
            r#"
            SELECT d.id, d.employee_id, d.filename, d.path, d.upload_date
            FROM employee_documents d
            JOIN employees e ON e.id = d.employee_id
            WHERE d.employee_id = $2 AND e.organization_id = $1
            ORDER BY d.id
            "#,
        )
        .bind(organization_id)
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_document).collect())
    }

    async fn add_employee_document(
        &self,
        organization_id: i64,
        document: NewEmployeeDocument,
    ) -> StorageResult<Option<EmployeeDocument>> {
        let row = sqlx::query(
            r#"
            INSERT INTO employee_documents (employee_id, filename, path)
            SELECT $2, $3, $4
            WHERE EXISTS (SELECT 1 FROM employees WHERE id = $2 AND organization_id = $1)
            RETURNING id, employee_id, filename, path, upload_date
            "#,
        )
        .bind(organization_id)
        .bind(document.employee_id)
        .bind(&document.filename)
        .bind(&document.path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| map_document(&row)))
    }

    async fn delete_employee_document(
        &self,
        organization_id: i64,
        id: i64,
    ) -> StorageResult<Option<EmployeeDocument>> {
        let row = sqlx::query(
            r#"
            DELETE FROM employee_documents d
            USING employees e
            WHERE d.id = $2 AND e.id = d.employee_id AND e.organization_id = $1
            RETURNING d.id, d.employee_id, d.filename, d.path, d.upload_date
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| map_document(&row)))
    }

    async fn get_inventory_item(
        &self,
        organization_id: i64,
        id: i64,
    ) -> StorageResult<Option<InventoryItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, inventory_number, description, cost, employee_id, department_id,
                   organization_id, created_at
            FROM inventory_items
            WHERE id = $2 AND organization_id = $1
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| map_inventory_item(&row)))
    }

    async fn get_inventory_items(
        &self,
        organization_id: i64,
        employee_id: i64,
    ) -> StorageResult<Vec<InventoryItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, inventory_number, description, cost, employee_id, department_id,
                   organization_id, created_at
            FROM inventory_items
            WHERE organization_id = $1 AND employee_id = $2
            ORDER BY id
            "#,
        )
        .bind(organization_id)
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_inventory_item).collect())
    }

    async fn get_inventory_items_by_department(
        &self,
        organization_id: i64,
        department_id: i64,
    ) -> StorageResult<Vec<InventoryItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, inventory_number, description, cost, employee_id, department_id,
                   organization_id, created_at
            FROM inventory_items
            WHERE organization_id = $1 AND department_id = $2
            ORDER BY id
            "#,
        )
        .bind(organization_id)
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_inventory_item).collect())
    }

    async fn create_inventory_item(
        &self,
        item: NewInventoryItem,
    ) -> StorageResult<InventoryItem> {
        let row = sqlx::query(
            r#"
            INSERT INTO inventory_items (name, inventory_number, description, cost,
                                         employee_id, department_id, organization_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, inventory_number, description, cost, employee_id,
                      department_id, organization_id, created_at
            "#,
        )
        .bind(&item.name)
        .bind(&item.inventory_number)
        .bind(&item.description)
        .bind(item.cost)
        .bind(item.employee_id)
        .bind(item.department_id)
        .bind(item.organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(duplicate("inventory number"))?;
        Ok(map_inventory_item(&row))
    }

    async fn update_inventory_item(
        &self,
        organization_id: i64,
        id: i64,
        patch: UpdateInventoryItem,
    ) -> StorageResult<Option<InventoryItem>> {
        let row = sqlx::query(
            r#"
            UPDATE inventory_items
            SET name = COALESCE($3, name),
                inventory_number = COALESCE($4, inventory_number),
                description = COALESCE($5, description),
                cost = COALESCE($6, cost),
                employee_id = COALESCE($7, employee_id),
                department_id = COALESCE($8, department_id)
            WHERE id = $2 AND organization_id = $1
            RETURNING id, name, inventory_number, description, cost, employee_id,
                      department_id, organization_id, created_at
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .bind(patch.name)
        .bind(patch.inventory_number)
        .bind(patch.description)
        .bind(patch.cost)
        .bind(patch.employee_id)
        .bind(patch.department_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(duplicate("inventory number"))?;
        Ok(row.map(|row| map_inventory_item(&row)))
    }

    async fn delete_inventory_item(&self, organization_id: i64, id: i64) -> StorageResult<bool> {
        let result =
            sqlx::query("DELETE FROM inventory_items WHERE id = $2 AND organization_id = $1")
                .bind(organization_id)
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_session(
        &self,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<Session> {
        let row = sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING token, user_id, expires_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_session(&row))
    }

    async fn get_session(&self, token: Uuid) -> StorageResult<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT token, user_id, expires_at, created_at
            FROM sessions
            WHERE token = $1 AND expires_at > now()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| map_session(&row)))
    }

    async fn delete_session(&self, token: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired_sessions(&self) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
