//! Bulk spreadsheet import and export routes

use axum::{
    Extension, Json,
    extract::{Multipart, Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::{NewInventoryItem, Permission},
    routes::uploads,
    spreadsheet::{self, ImportReport, Sheet},
    state::AppState,
    storage::StorageError,
};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEmployeesQuery {
    pub department_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportInventoryQuery {
    pub employee_id: Option<i64>,
    pub department_id: Option<i64>,
}

fn xlsx_attachment(filename: &str, bytes: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
}

/// Import employees from an uploaded workbook
///
/// Rows are handled independently: a bad row is counted and described in
/// the report, the rest of the batch continues.
pub async fn import_employees(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    current.require(Permission::ManageEmployees)?;
    let organization_id = current.organization_id();

    let (_, _, data) = uploads::read_file_field(&mut multipart, "file").await?;
    let sheet = Sheet::from_bytes(&data).map_err(ApiError::BadRequest)?;

    let mut report = ImportReport::default();
    for (number, row) in sheet.rows() {
        match spreadsheet::map_employee_row(&row, organization_id) {
            Ok(employee) => match state.storage.create_employee(employee).await {
                Ok(_) => report.record_success(),
                Err(e @ StorageError::Database(_)) => return Err(e.into()),
                Err(e) => report.record_failure(number, e),
            },
            Err(reason) => report.record_failure(number, reason),
        }
    }

    info!(
        success = report.success,
        failed = report.failed,
        "employee import finished"
    );

    Ok(Json(report))
}

/// Import inventory items from an uploaded workbook
pub async fn import_inventory(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    current.require(Permission::ManageLiability)?;
    let organization_id = current.organization_id();

    let (_, _, data) = uploads::read_file_field(&mut multipart, "file").await?;
    let sheet = Sheet::from_bytes(&data).map_err(ApiError::BadRequest)?;

    let mut report = ImportReport::default();
    for (number, row) in sheet.rows() {
        let mapped = match spreadsheet::map_inventory_row(&row) {
            Ok(mapped) => mapped,
            Err(reason) => {
                report.record_failure(number, reason);
                continue;
            }
        };

        let (employee_id, department_id) = match mapped.employee_id {
            Some(employee_id) => {
                match state
                    .storage
                    .get_employee(organization_id, employee_id)
                    .await?
                {
                    Some(employee) => (
                        employee_id,
                        mapped.department_id.unwrap_or(employee.department_id),
                    ),
                    None => {
                        report.record_failure(number, "сотрудник не найден");
                        continue;
                    }
                }
            }
            // Department-only rows keep an unassigned employee attribution
            None => (0, mapped.department_id.unwrap_or(0)),
        };

        let item = NewInventoryItem {
            name: mapped.name,
            inventory_number: mapped.inventory_number,
            description: mapped.description,
            cost: mapped.cost,
            employee_id,
            department_id,
            organization_id,
        };

        match state.storage.create_inventory_item(item).await {
            Ok(_) => report.record_success(),
            Err(StorageError::Duplicate(_)) => {
                report.record_failure(number, "инвентарный номер уже используется");
            }
            Err(e @ StorageError::Database(_)) => return Err(e.into()),
            Err(e) => report.record_failure(number, e),
        }
    }

    info!(
        success = report.success,
        failed = report.failed,
        "inventory import finished"
    );

    Ok(Json(report))
}

/// Download the organization's employees as a workbook
pub async fn export_employees(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ExportEmployeesQuery>,
) -> ApiResult<impl IntoResponse> {
    let employees = state
        .storage
        .get_employees(current.organization_id(), query.department_id)
        .await?;

    let bytes = spreadsheet::employees_workbook(&employees).map_err(|e| {
        error!("failed to build employees workbook: {e}");
        ApiError::Internal
    })?;

    Ok(xlsx_attachment("employees.xlsx", bytes))
}

/// Download inventory as a workbook, filtered by employee or department
pub async fn export_inventory(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ExportInventoryQuery>,
) -> ApiResult<impl IntoResponse> {
    let organization_id = current.organization_id();

    let items = if let Some(employee_id) = query.employee_id {
        state
            .storage
            .get_inventory_items(organization_id, employee_id)
            .await?
    } else if let Some(department_id) = query.department_id {
        state
            .storage
            .get_inventory_items_by_department(organization_id, department_id)
            .await?
    } else {
        return Err(ApiError::BadRequest(
            "employeeId or departmentId query parameter is required".to_string(),
        ));
    };

    let bytes = spreadsheet::inventory_workbook(&items).map_err(|e| {
        error!("failed to build inventory workbook: {e}");
        ApiError::Internal
    })?;

    Ok(xlsx_attachment("inventory.xlsx", bytes))
}
