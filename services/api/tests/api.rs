//! End-to-end tests of the HTTP surface against the in-memory backend

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use api::config::ServerConfig;
use api::routes::create_router;
use api::state::AppState;
use api::storage::MemStorage;

fn test_app() -> Router {
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        upload_dir: test_upload_dir(),
        session_ttl_secs: 60 * 60 * 24,
    };
    let state = AppState::new(Arc::new(MemStorage::new()), config);
    create_router(state)
}

fn test_upload_dir() -> PathBuf {
    std::env::temp_dir().join(format!("bookkeeping-test-uploads-{}", uuid::Uuid::new_v4()))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_string);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, cookie, body)
}

async fn send_raw(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    request_json("POST", uri, cookie, body)
}

fn put_json(uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    request_json("PUT", uri, cookie, body)
}

fn request_json(method: &str, uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn multipart(uri: &str, cookie: &str, field: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "test-boundary-7MA4YWxkTrZu0gW";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Run the setup call and return the admin's session cookie
async fn setup(app: &Router) -> String {
    let (status, cookie, body) = send(
        app,
        post_json(
            "/api/setup",
            None,
            &json!({
                "organizationName": "Acme",
                "adminUsername": "admin",
                "adminPassword": "secret1",
                "adminFullName": "A B",
                "adminPosition": "Boss",
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "setup failed: {body}");
    cookie.expect("setup should establish a session")
}

fn employee_payload(department_id: i64) -> Value {
    json!({
        "fullName": "Иванов Иван Иванович",
        "departmentId": department_id,
        "position": "Инженер",
        "hireDate": "2023-01-10T00:00:00Z",
        "hireOrderNumber": "42-к",
        "passport": "4500 123456",
        "birthDate": "1990-01-01T00:00:00Z",
        "address": "Москва",
        "phone": "+7 900 000-00-00",
        "materialLiabilityType": "none",
    })
}

#[tokio::test]
async fn setup_bootstraps_the_tenant_once() {
    let app = test_app();

    let (_, _, body) = send(&app, get("/api/system-status", None)).await;
    assert_eq!(body, json!({ "isSetup": false }));

    let cookie = setup(&app).await;

    let (_, _, body) = send(&app, get("/api/system-status", None)).await;
    assert_eq!(body, json!({ "isSetup": true }));

    let (status, _, body) = send(&app, get("/api/user", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
    assert_eq!(body["organizationId"], 1);
    assert_eq!(body["permissions"], json!(["full_access"]));
    assert!(body.get("password").is_none());

    // Second setup is rejected and creates nothing
    let (status, _, _) = send(
        &app,
        post_json(
            "/api/setup",
            None,
            &json!({
                "organizationName": "Globex",
                "adminUsername": "admin2",
                "adminPassword": "secret2",
                "adminFullName": "C D",
                "adminPosition": "Boss",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, _) = send(
        &app,
        post_json(
            "/api/login",
            None,
            &json!({ "username": "admin2", "password": "secret2" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn setup_returns_organization_one_and_a_full_access_admin() {
    let app = test_app();

    let (status, _, body) = send(
        &app,
        post_json(
            "/api/setup",
            None,
            &json!({
                "organizationName": "Acme",
                "adminUsername": "admin",
                "adminPassword": "secret1",
                "adminFullName": "A B",
                "adminPosition": "Boss",
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["organization"]["id"], 1);
    assert_eq!(body["organization"]["name"], "Acme");
    assert_eq!(body["admin"]["permissions"], json!(["full_access"]));
    assert!(body["admin"].get("password").is_none());
}

#[tokio::test]
async fn setup_with_missing_fields_is_a_bad_request() {
    let app = test_app();

    let (status, _, _) = send(
        &app,
        post_json(
            "/api/setup",
            None,
            &json!({ "organizationName": "Acme", "adminUsername": "admin" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, _, body) = send(&app, get("/api/system-status", None)).await;
    assert_eq!(body, json!({ "isSetup": false }));
}

#[tokio::test]
async fn login_checks_credentials_and_issues_a_session() {
    let app = test_app();
    setup(&app).await;

    let (status, _, _) = send(
        &app,
        post_json(
            "/api/login",
            None,
            &json!({ "username": "admin", "password": "wrong" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, cookie, body) = send(
        &app,
        post_json(
            "/api/login",
            None,
            &json!({ "username": "admin", "password": "secret1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
    assert!(body.get("password").is_none());
    let cookie = cookie.unwrap();

    // The session works, then logout revokes it
    let (status, _, _) = send(&app, get("/api/user", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(
        &app,
        post_json("/api/logout", Some(&cookie), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, get("/api/user", Some(&cookie))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() {
    let app = test_app();
    setup(&app).await;

    for uri in ["/api/user", "/api/departments", "/api/employees"] {
        let (status, _, _) = send(&app, get(uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "expected 401 for {uri}");
    }
}

#[tokio::test]
async fn department_stats_start_at_zero() {
    let app = test_app();
    let cookie = setup(&app).await;

    let (status, _, body) = send(
        &app,
        post_json("/api/departments", Some(&cookie), &json!({ "name": "Sales" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 1);
    assert_eq!(body["organizationId"], 1);

    let (status, _, body) = send(&app, get("/api/departments?stats=true", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "departmentId": 1,
            "departmentName": "Sales",
            "employeeCount": 0,
            "inventoryCount": 0,
        }])
    );
}

#[tokio::test]
async fn department_crud_round_trip() {
    let app = test_app();
    let cookie = setup(&app).await;

    let (_, _, created) = send(
        &app,
        post_json("/api/departments", Some(&cookie), &json!({ "name": "Sales" })),
    )
    .await;

    let (status, _, updated) = send(
        &app,
        put_json(
            "/api/departments/1",
            Some(&cookie),
            &json!({ "name": "Marketing" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Marketing");
    assert_eq!(updated["id"], created["id"]);

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/departments/1")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send_raw(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = send(
        &app,
        put_json("/api/departments/1", Some(&cookie), &json!({ "name": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn permissions_gate_mutations_per_category() {
    let app = test_app();
    let admin_cookie = setup(&app).await;

    let (status, _, _) = send(
        &app,
        post_json(
            "/api/users",
            Some(&admin_cookie),
            &json!({
                "username": "clerk",
                "password": "secret2",
                "fullName": "Clerk",
                "position": "Clerk",
                "role": "manager",
                "permissions": ["manage_departments"],
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, cookie, _) = send(
        &app,
        post_json(
            "/api/login",
            None,
            &json!({ "username": "clerk", "password": "secret2" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let clerk_cookie = cookie.unwrap();

    // Granted category works
    let (status, _, _) = send(
        &app,
        post_json(
            "/api/departments",
            Some(&clerk_cookie),
            &json!({ "name": "Sales" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Everything else is forbidden
    let (status, _, _) = send(
        &app,
        post_json(
            "/api/employees",
            Some(&clerk_cookie),
            &employee_payload(1),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(&app, get("/api/users", Some(&clerk_cookie))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_permission_strings_are_rejected() {
    let app = test_app();
    let cookie = setup(&app).await;

    let (status, _, _) = send(
        &app,
        post_json(
            "/api/users",
            Some(&cookie),
            &json!({
                "username": "clerk",
                "password": "secret2",
                "fullName": "Clerk",
                "position": "Clerk",
                "role": "manager",
                "permissions": ["manage_everything"],
            }),
        ),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn employee_dismissal_is_validated_and_one_way() {
    let app = test_app();
    let cookie = setup(&app).await;

    send(
        &app,
        post_json("/api/departments", Some(&cookie), &json!({ "name": "Sales" })),
    )
    .await;

    let (status, _, employee) = send(
        &app,
        post_json("/api/employees", Some(&cookie), &employee_payload(1)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(employee["dismissed"], false);

    // Both fields are required
    let (status, _, _) = send(
        &app,
        post_json("/api/employees/1/dismiss", Some(&cookie), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let dismissal = json!({
        "dismissalDate": "2024-05-01T00:00:00Z",
        "dismissalOrderNumber": "77-у",
    });
    let (status, _, dismissed) = send(
        &app,
        post_json("/api/employees/1/dismiss", Some(&cookie), &dismissal),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dismissed["dismissed"], true);
    assert_eq!(dismissed["dismissalOrderNumber"], "77-у");

    let (status, _, _) = send(
        &app,
        post_json("/api/employees/1/dismiss", Some(&cookie), &dismissal),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn inventory_listing_requires_a_filter() {
    let app = test_app();
    let cookie = setup(&app).await;

    let (status, _, body) = send(&app, get("/api/inventory", Some(&cookie))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");

    send(
        &app,
        post_json("/api/departments", Some(&cookie), &json!({ "name": "Sales" })),
    )
    .await;
    send(
        &app,
        post_json("/api/employees", Some(&cookie), &employee_payload(1)),
    )
    .await;

    let item = json!({
        "name": "Ноутбук",
        "inventoryNumber": "INV-1",
        "description": "Рабочий ноутбук",
        "cost": 120000,
        "employeeId": 1,
        "departmentId": 1,
    });
    let (status, _, _) = send(&app, post_json("/api/inventory", Some(&cookie), &item)).await;
    assert_eq!(status, StatusCode::CREATED);

    // Unique inventory number
    let (status, _, _) = send(&app, post_json("/api/inventory", Some(&cookie), &item)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, body) = send(&app, get("/api/inventory?employeeId=1", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _, body) = send(&app, get("/api/inventory?departmentId=1", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn import_reports_row_failures_without_aborting() {
    let app = test_app();
    let cookie = setup(&app).await;
    send(
        &app,
        post_json("/api/departments", Some(&cookie), &json!({ "name": "Sales" })),
    )
    .await;

    // Row 1 misses the full name, row 2 is fine
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, headers) in ["ФИО", "Должность", "ID отдела"].iter().enumerate() {
        sheet.write_string(0, col as u16, *headers).unwrap();
    }
    sheet.write_string(1, 1, "Бухгалтер").unwrap();
    sheet.write_string(1, 2, "1").unwrap();
    sheet.write_string(2, 0, "Петров Петр").unwrap();
    sheet.write_string(2, 1, "Кладовщик").unwrap();
    sheet.write_string(2, 2, "1").unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let (status, _, body) = send(
        &app,
        multipart(
            "/api/import/employees",
            &cookie,
            "file",
            "import.xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            &bytes,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["success"], 1);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["errors"], json!(["Строка 1: не указано ФИО"]));

    let (_, _, employees) = send(&app, get("/api/employees", Some(&cookie))).await;
    assert_eq!(employees.as_array().unwrap().len(), 1);
    assert_eq!(employees[0]["fullName"], "Петров Петр");
}

#[tokio::test]
async fn exported_employees_can_be_imported_back() {
    let app = test_app();
    let cookie = setup(&app).await;
    send(
        &app,
        post_json("/api/departments", Some(&cookie), &json!({ "name": "Sales" })),
    )
    .await;
    send(
        &app,
        post_json("/api/employees", Some(&cookie), &employee_payload(1)),
    )
    .await;

    let (status, bytes) = send_raw(&app, get("/api/export/employees", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!bytes.is_empty());

    let (status, _, body) = send(
        &app,
        multipart(
            "/api/import/employees",
            &cookie,
            "file",
            "employees.xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            &bytes,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["success"], 1);
    assert_eq!(body["failed"], 0);

    let (_, _, employees) = send(&app, get("/api/employees", Some(&cookie))).await;
    assert_eq!(employees.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn inventory_export_requires_a_filter_too() {
    let app = test_app();
    let cookie = setup(&app).await;

    let (status, _) = send_raw(&app, get("/api/export/inventory", Some(&cookie))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_raw(
        &app,
        get("/api/export/inventory?departmentId=1", Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn photo_upload_updates_the_employee_and_is_served_behind_auth() {
    let app = test_app();
    let cookie = setup(&app).await;
    send(
        &app,
        post_json("/api/departments", Some(&cookie), &json!({ "name": "Sales" })),
    )
    .await;
    send(
        &app,
        post_json("/api/employees", Some(&cookie), &employee_payload(1)),
    )
    .await;

    let png = [0x89u8, b'P', b'N', b'G', 0, 1, 2, 3];
    let (status, _, body) = send(
        &app,
        multipart(
            "/api/upload/photo/1",
            &cookie,
            "photo",
            "face.png",
            "image/png",
            &png,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["success"], true);
    let photo_url = body["photoUrl"].as_str().unwrap().to_string();
    assert_eq!(body["employee"]["photo"], photo_url);

    // Served with a session, rejected without one
    let (status, served) = send_raw(&app, get(&photo_url, Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(served, png);

    let (status, _) = send_raw(&app, get(&photo_url, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Wrong declared content type is refused
    let (status, _, _) = send(
        &app,
        multipart(
            "/api/upload/photo/1",
            &cookie,
            "photo",
            "notes.txt",
            "text/plain",
            b"hello",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn document_upload_creates_a_deletable_record() {
    let app = test_app();
    let cookie = setup(&app).await;
    send(
        &app,
        post_json("/api/departments", Some(&cookie), &json!({ "name": "Sales" })),
    )
    .await;
    send(
        &app,
        post_json("/api/employees", Some(&cookie), &employee_payload(1)),
    )
    .await;

    let (status, _, body) = send(
        &app,
        multipart(
            "/api/upload/document/1",
            &cookie,
            "document",
            "contract.pdf",
            "application/pdf",
            b"%PDF-1.4 fake",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["document"]["filename"], "contract.pdf");
    let document_id = body["document"]["id"].as_i64().unwrap();

    let (_, _, documents) = send(&app, get("/api/employees/1/documents", Some(&cookie))).await;
    assert_eq!(documents.as_array().unwrap().len(), 1);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/employees/documents/{document_id}"))
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send_raw(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, documents) = send(&app, get("/api/employees/1/documents", Some(&cookie))).await;
    assert_eq!(documents.as_array().unwrap().len(), 0);

    // Unknown employee can't receive documents
    let (status, _, _) = send(
        &app,
        multipart(
            "/api/upload/document/99",
            &cookie,
            "document",
            "contract.pdf",
            "application/pdf",
            b"%PDF-1.4 fake",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn organization_lookup_is_tenant_scoped() {
    let app = test_app();
    let cookie = setup(&app).await;

    let (status, _, body) = send(&app, get("/api/organizations/1", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Acme");

    let (status, _, _) = send(&app, get("/api/organizations/2", Some(&cookie))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
