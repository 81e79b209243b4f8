//! HTTP routes
//!
//! Everything under `/api` except setup, status and login sits behind the
//! session middleware. Handlers resolve the acting organization from the
//! session user and pass it into every storage call; request bodies never
//! choose the tenant.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
};

use crate::middleware::auth_middleware;
use crate::state::AppState;

pub mod departments;
pub mod employees;
pub mod inventory;
pub mod system;
pub mod transfer;
pub mod uploads;
pub mod users;

/// Upload and import bodies are capped at 10 MB
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let uploads = Router::new()
        .route("/api/upload/photo/:employee_id", post(uploads::upload_photo))
        .route(
            "/api/upload/document/:employee_id",
            post(uploads::upload_document),
        )
        .route("/api/import/employees", post(transfer::import_employees))
        .route("/api/import/inventory", post(transfer::import_inventory))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    let protected = Router::new()
        .route("/api/user", get(system::current_user))
        .route("/api/organizations/:id", get(system::get_organization))
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/departments",
            get(departments::list_departments).post(departments::create_department),
        )
        .route(
            "/api/departments/:id",
            put(departments::update_department).delete(departments::delete_department),
        )
        .route(
            "/api/employees",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route(
            "/api/employees/:id",
            get(employees::get_employee).put(employees::update_employee),
        )
        .route("/api/employees/:id/dismiss", post(employees::dismiss_employee))
        .route("/api/employees/:id/documents", get(employees::list_documents))
        .route(
            "/api/employees/documents/:id",
            delete(employees::delete_document),
        )
        .route(
            "/api/inventory",
            get(inventory::list_inventory).post(inventory::create_item),
        )
        .route(
            "/api/inventory/:id",
            put(inventory::update_item).delete(inventory::delete_item),
        )
        .route("/api/export/employees", get(transfer::export_employees))
        .route("/api/export/inventory", get(transfer::export_inventory))
        .route("/uploads/*path", get(uploads::serve_upload))
        .merge(uploads)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/api/health", get(system::health_check))
        .route("/api/system-status", get(system::system_status))
        .route("/api/setup", post(system::setup))
        .route("/api/login", post(system::login))
        .route("/api/logout", post(system::logout))
        .merge(protected)
        .with_state(state)
}
