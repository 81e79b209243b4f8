//! Spreadsheet import and export
//!
//! Import reads the first sheet of an uploaded workbook, takes the first
//! row as headers and maps every following row to an entity. Column lookup
//! is bilingual: the English field name is tried first, then the Russian
//! label the export writes. Rows are independent: one malformed row is
//! reported and counted, the rest of the batch proceeds. Unparseable
//! dates do not fail a row either — the hire date falls back to "now" and
//! the birth date to 1980-01-01.
//!
//! Export projects entities into flat Russian-labeled columns, so a sheet
//! produced here feeds straight back into the importer.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xls, Xlsx};
use chrono::{DateTime, NaiveDate, Utc};
use rust_xlsxwriter::{Workbook, XlsxError};
use serde::Serialize;

use crate::models::{Employee, InventoryItem, MaterialLiabilityType, NewEmployee};

/// OLE Compound Document magic bytes (legacy .xls)
const OLE_MAGIC: [u8; 4] = [0xD0, 0xCF, 0x11, 0xE0];
/// ZIP archive magic bytes (.xlsx)
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Column labels of the employees export, aligned with the import fallbacks
const EMPLOYEE_HEADERS: [&str; 11] = [
    "ФИО",
    "Должность",
    "ID отдела",
    "Дата приема",
    "Номер приказа о приеме",
    "Паспорт",
    "Дата рождения",
    "Адрес",
    "Телефон",
    "Вид материальной ответственности",
    "Уволен",
];

/// Column labels of the inventory export
const INVENTORY_HEADERS: [&str; 6] = [
    "Наименование",
    "Инвентарный номер",
    "Описание",
    "Стоимость",
    "ID сотрудника",
    "ID отдела",
];

/// Outcome of a bulk import, reported to the client as-is
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl ImportReport {
    pub fn record_success(&mut self) {
        self.success += 1;
    }

    pub fn record_failure(&mut self, row_number: usize, reason: impl std::fmt::Display) {
        self.failed += 1;
        self.errors.push(format!("Строка {row_number}: {reason}"));
    }
}

/// First sheet of an uploaded workbook, split into headers and data rows
pub struct Sheet {
    headers: HashMap<String, usize>,
    rows: Vec<Vec<Data>>,
}

impl Sheet {
    /// Parse workbook bytes; the format is detected from magic bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        let range = if bytes.starts_with(&OLE_MAGIC) {
            let mut workbook: Xls<_> = Xls::new(Cursor::new(bytes))
                .map_err(|e| format!("failed to open XLS workbook: {e}"))?;
            let name = first_sheet_name(workbook.sheet_names())?;
            workbook
                .worksheet_range(&name)
                .map_err(|e| format!("failed to read sheet '{name}': {e}"))?
        } else if bytes.starts_with(&ZIP_MAGIC) {
            let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
                .map_err(|e| format!("failed to open XLSX workbook: {e}"))?;
            let name = first_sheet_name(workbook.sheet_names())?;
            workbook
                .worksheet_range(&name)
                .map_err(|e| format!("failed to read sheet '{name}': {e}"))?
        } else {
            return Err("unrecognized spreadsheet format".to_string());
        };

        let mut rows = range.rows();
        let headers = rows
            .next()
            .map(|header_row| {
                header_row
                    .iter()
                    .enumerate()
                    .filter_map(|(i, cell)| cell_text(cell).map(|name| (name, i)))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            headers,
            rows: rows.map(|cells| cells.to_vec()).collect(),
        })
    }

    /// Data rows with their 1-based row numbers as reported to the user
    pub fn rows(&self) -> impl Iterator<Item = (usize, Row<'_>)> {
        self.rows.iter().enumerate().map(|(i, cells)| {
            (
                i + 1,
                Row {
                    headers: &self.headers,
                    cells,
                },
            )
        })
    }
}

/// One data row with bilingual column access
pub struct Row<'a> {
    headers: &'a HashMap<String, usize>,
    cells: &'a [Data],
}

impl Row<'_> {
    fn cell(&self, english: &str, russian: &str) -> Option<&Data> {
        [english, russian]
            .iter()
            .filter_map(|key| self.headers.get(*key))
            .filter_map(|&i| self.cells.get(i))
            .find(|cell| !matches!(cell, Data::Empty))
    }

    fn text(&self, english: &str, russian: &str) -> Option<String> {
        self.cell(english, russian).and_then(cell_text)
    }

    fn integer(&self, english: &str, russian: &str) -> Option<i64> {
        self.cell(english, russian).and_then(cell_integer)
    }

    fn date(&self, english: &str, russian: &str) -> Option<DateTime<Utc>> {
        self.cell(english, russian).and_then(cell_date)
    }
}

fn first_sheet_name(names: Vec<String>) -> Result<String, String> {
    names
        .into_iter()
        .next()
        .ok_or_else(|| "workbook has no sheets".to_string())
}

fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::String(s) | Data::DateTimeIso(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn cell_integer(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(i) => Some(*i),
        Data::Float(f) if f.fract() == 0.0 => Some(*f as i64),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn cell_date(cell: &Data) -> Option<DateTime<Utc>> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|naive| naive.and_utc()),
        Data::String(s) | Data::DateTimeIso(s) => parse_date(s),
        _ => None,
    }
}

/// Parse the date formats that show up in real sheets: ISO timestamps,
/// ISO dates, and the day-first form Russian spreadsheets use
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

fn default_birth_date() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1980, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now)
}

/// Map one row of an employees sheet to a storage payload
///
/// Name, position and department id are required; everything else gets a
/// default so sparse sheets still import.
pub fn map_employee_row(row: &Row<'_>, organization_id: i64) -> Result<NewEmployee, String> {
    let full_name = row
        .text("fullName", "ФИО")
        .ok_or_else(|| "не указано ФИО".to_string())?;
    let position = row
        .text("position", "Должность")
        .ok_or_else(|| "не указана должность".to_string())?;
    let department_id = row
        .integer("departmentId", "ID отдела")
        .ok_or_else(|| "не указан ID отдела".to_string())?;

    let material_liability_type = row
        .text("materialLiabilityType", "Вид материальной ответственности")
        .map(|value| MaterialLiabilityType::parse(&value))
        .unwrap_or(MaterialLiabilityType::None);

    Ok(NewEmployee {
        full_name,
        department_id,
        position,
        hire_date: row.date("hireDate", "Дата приема").unwrap_or_else(Utc::now),
        hire_order_number: row
            .text("hireOrderNumber", "Номер приказа о приеме")
            .unwrap_or_default(),
        passport: row.text("passport", "Паспорт").unwrap_or_default(),
        birth_date: row
            .date("birthDate", "Дата рождения")
            .unwrap_or_else(default_birth_date),
        address: row.text("address", "Адрес").unwrap_or_default(),
        phone: row.text("phone", "Телефон").unwrap_or_default(),
        photo: None,
        material_liability_type,
        material_liability_document: None,
        organization_id,
    })
}

/// An inventory row before the missing half of its attribution is resolved
///
/// When only the employee id is present the route derives the department
/// from the employee record; the mapping itself stays synchronous.
#[derive(Debug)]
pub struct MappedInventoryRow {
    pub name: String,
    pub inventory_number: String,
    pub description: String,
    pub cost: i32,
    pub employee_id: Option<i64>,
    pub department_id: Option<i64>,
}

/// Map one row of an inventory sheet
///
/// The name and at least one of employee id / department id are required.
pub fn map_inventory_row(row: &Row<'_>) -> Result<MappedInventoryRow, String> {
    let name = row
        .text("name", "Наименование")
        .ok_or_else(|| "не указано наименование".to_string())?;

    let employee_id = row.integer("employeeId", "ID сотрудника");
    let department_id = row.integer("departmentId", "ID отдела");
    if employee_id.is_none() && department_id.is_none() {
        return Err("не указан сотрудник или отдел".to_string());
    }

    Ok(MappedInventoryRow {
        name,
        inventory_number: row
            .text("inventoryNumber", "Инвентарный номер")
            .unwrap_or_default(),
        description: row.text("description", "Описание").unwrap_or_default(),
        cost: row
            .integer("cost", "Стоимость")
            .and_then(|c| i32::try_from(c).ok())
            .unwrap_or(0),
        employee_id,
        department_id,
    })
}

/// Serialize employees into a downloadable workbook
pub fn employees_workbook(employees: &[Employee]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, header) in EMPLOYEE_HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }

    for (i, employee) in employees.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, employee.full_name.as_str())?;
        sheet.write_string(row, 1, employee.position.as_str())?;
        sheet.write_number(row, 2, employee.department_id as f64)?;
        sheet.write_string(row, 3, employee.hire_date.format("%Y-%m-%d").to_string())?;
        sheet.write_string(row, 4, employee.hire_order_number.as_str())?;
        sheet.write_string(row, 5, employee.passport.as_str())?;
        sheet.write_string(row, 6, employee.birth_date.format("%Y-%m-%d").to_string())?;
        sheet.write_string(row, 7, employee.address.as_str())?;
        sheet.write_string(row, 8, employee.phone.as_str())?;
        sheet.write_string(row, 9, employee.material_liability_type.as_str())?;
        sheet.write_string(row, 10, if employee.dismissed { "да" } else { "нет" })?;
    }

    workbook.save_to_buffer()
}

/// Serialize inventory items into a downloadable workbook
pub fn inventory_workbook(items: &[InventoryItem]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, header) in INVENTORY_HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }

    for (i, item) in items.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, item.name.as_str())?;
        sheet.write_string(row, 1, item.inventory_number.as_str())?;
        sheet.write_string(row, 2, item.description.as_str())?;
        sheet.write_number(row, 3, item.cost as f64)?;
        sheet.write_number(row, 4, item.employee_id as f64)?;
        sheet.write_number(row, 5, item.department_id as f64)?;
    }

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a single-sheet workbook from string cells
    fn sheet_from_strings(table: &[&[&str]]) -> Sheet {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in table.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                sheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
        let bytes = workbook.save_to_buffer().unwrap();
        Sheet::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn english_and_russian_headers_map_to_the_same_fields() {
        let english = sheet_from_strings(&[
            &["fullName", "position", "departmentId"],
            &["Петров Петр", "Бухгалтер", "2"],
        ]);
        let russian = sheet_from_strings(&[
            &["ФИО", "Должность", "ID отдела"],
            &["Петров Петр", "Бухгалтер", "2"],
        ]);

        for sheet in [english, russian] {
            let (_, row) = sheet.rows().next().unwrap();
            let employee = map_employee_row(&row, 1).unwrap();
            assert_eq!(employee.full_name, "Петров Петр");
            assert_eq!(employee.position, "Бухгалтер");
            assert_eq!(employee.department_id, 2);
            assert_eq!(employee.organization_id, 1);
        }
    }

    #[test]
    fn missing_full_name_fails_the_row_with_a_russian_message() {
        let sheet = sheet_from_strings(&[
            &["position", "departmentId"],
            &["Бухгалтер", "2"],
        ]);

        let (number, row) = sheet.rows().next().unwrap();
        let error = map_employee_row(&row, 1).unwrap_err();
        assert_eq!(number, 1);
        assert_eq!(error, "не указано ФИО");
    }

    #[test]
    fn malformed_dates_fall_back_instead_of_failing() {
        let sheet = sheet_from_strings(&[
            &["fullName", "position", "departmentId", "hireDate", "birthDate"],
            &["Сидоров", "Кладовщик", "1", "не дата", "тоже не дата"],
        ]);

        let (_, row) = sheet.rows().next().unwrap();
        let employee = map_employee_row(&row, 1).unwrap();

        assert!((Utc::now() - employee.hire_date).num_seconds() < 60);
        assert_eq!(employee.birth_date, default_birth_date());
    }

    #[test]
    fn dates_parse_from_iso_and_day_first_forms() {
        let sheet = sheet_from_strings(&[
            &["fullName", "position", "departmentId", "hireDate", "birthDate"],
            &["Сидоров", "Кладовщик", "1", "2023-04-01", "15.06.1985"],
        ]);

        let (_, row) = sheet.rows().next().unwrap();
        let employee = map_employee_row(&row, 1).unwrap();

        assert_eq!(employee.hire_date.format("%Y-%m-%d").to_string(), "2023-04-01");
        assert_eq!(employee.birth_date.format("%Y-%m-%d").to_string(), "1985-06-15");
    }

    #[test]
    fn inventory_rows_need_a_name_and_some_attribution() {
        let sheet = sheet_from_strings(&[
            &["name", "inventoryNumber", "cost", "employeeId"],
            &["Ноутбук", "INV-1", "120000", "3"],
        ]);
        let (_, row) = sheet.rows().next().unwrap();
        let item = map_inventory_row(&row).unwrap();
        assert_eq!(item.name, "Ноутбук");
        assert_eq!(item.inventory_number, "INV-1");
        assert_eq!(item.cost, 120_000);
        assert_eq!(item.employee_id, Some(3));
        assert_eq!(item.department_id, None);

        let orphan = sheet_from_strings(&[
            &["name"],
            &["Стол"],
        ]);
        let (_, row) = orphan.rows().next().unwrap();
        assert_eq!(
            map_inventory_row(&row).unwrap_err(),
            "не указан сотрудник или отдел"
        );
    }

    #[test]
    fn exported_employees_import_back_without_failures() {
        let employee = Employee {
            id: 1,
            full_name: "Иванова Анна".to_string(),
            department_id: 4,
            position: "Экономист".to_string(),
            hire_date: parse_date("2022-02-01").unwrap(),
            hire_order_number: "12-к".to_string(),
            passport: "4009 555666".to_string(),
            birth_date: parse_date("1990-09-09").unwrap(),
            address: "Тверь".to_string(),
            phone: "+7 900 111-22-33".to_string(),
            photo: None,
            material_liability_type: MaterialLiabilityType::Individual,
            material_liability_document: None,
            dismissed: false,
            dismissal_date: None,
            dismissal_order_number: None,
            organization_id: 1,
            created_at: Utc::now(),
        };

        let bytes = employees_workbook(std::slice::from_ref(&employee)).unwrap();
        let sheet = Sheet::from_bytes(&bytes).unwrap();
        let (_, row) = sheet.rows().next().unwrap();
        let imported = map_employee_row(&row, 1).unwrap();

        assert_eq!(imported.full_name, employee.full_name);
        assert_eq!(imported.position, employee.position);
        assert_eq!(imported.department_id, employee.department_id);
        assert_eq!(imported.hire_date, employee.hire_date);
        assert_eq!(imported.birth_date, employee.birth_date);
        assert_eq!(
            imported.material_liability_type,
            MaterialLiabilityType::Individual
        );
    }
}
