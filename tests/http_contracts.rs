use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use supportdesk_lib::commands::settings::{load_effective_settings, Settings};
use supportdesk_lib::ingest::extract::extract_candidates;
use supportdesk_lib::server::{create_router, AppState};
use tempfile::TempDir;
use tower::ServiceExt;
use zip::write::SimpleFileOptions;

const HEADERS: &[&str] = &[
    "Issue Number",
    "Subject",
    "Product",
    "Version",
    "Module",
    "Customer",
    "Project",
    "Reporter",
    "Handler",
    "Owner",
    "Category",
    "Status",
    "Severity",
    "Tag",
    "Issued date",
];

enum Cell {
    Text(&'static str),
    Number(f64),
    Blank,
}

fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    out.iter().rev().collect()
}

fn sheet_xml(rows: &[Vec<Cell>]) -> String {
    let mut body = String::new();
    for (r, row) in rows.iter().enumerate() {
        body.push_str(&format!("<row r=\"{}\">", r + 1));
        for (c, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_letter(c), r + 1);
            match cell {
                Cell::Text(text) => body.push_str(&format!(
                    "<c r=\"{reference}\" t=\"inlineStr\"><is><t>{text}</t></is></c>"
                )),
                Cell::Number(value) => {
                    body.push_str(&format!("<c r=\"{reference}\"><v>{value}</v></c>"))
                }
                Cell::Blank => {}
            }
        }
        body.push_str("</row>");
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
         <sheetData>{body}</sheetData></worksheet>"
    )
}

/// Minimal single-sheet `.xlsx` package with inline strings.
fn build_xlsx(rows: &[Vec<Cell>]) -> Vec<u8> {
    let parts: [(&str, String); 5] = [
        (
            "[Content_Types].xml",
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
             <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
             <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
             <Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
             <Override PartName=\"/xl/worksheets/sheet1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\
             </Types>"
                .to_string(),
        ),
        (
            "_rels/.rels",
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
             <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>\
             </Relationships>"
                .to_string(),
        ),
        (
            "xl/workbook.xml",
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
             xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
             <sheets><sheet name=\"IssueList\" sheetId=\"1\" r:id=\"rId1\"/></sheets></workbook>"
                .to_string(),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
             <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet1.xml\"/>\
             </Relationships>"
                .to_string(),
        ),
        ("xl/worksheets/sheet1.xml", sheet_xml(rows)),
    ];

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        writer
            .start_file(name, SimpleFileOptions::default())
            .expect("start zip entry");
        writer.write_all(content.as_bytes()).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

fn header_row() -> Vec<Cell> {
    HEADERS.iter().map(|h| Cell::Text(*h)).collect()
}

fn issue_row(number: &'static str, subject: &'static str, status: &'static str, severity: &'static str) -> Vec<Cell> {
    vec![
        Cell::Text(number),
        Cell::Text(subject),
        Cell::Text("JEUS"),
        Cell::Text("8.5"),
        Cell::Text("WebAdmin"),
        Cell::Text("ACME Bank"),
        Cell::Text("Core Migration"),
        Cell::Text("kim"),
        Cell::Text("park"),
        Cell::Text("lee"),
        Cell::Text("Defect"),
        Cell::Text(status),
        Cell::Text(severity),
        Cell::Text("hotfix"),
        Cell::Number(45000.0),
    ]
}

fn tracker_export() -> Vec<u8> {
    build_xlsx(&[
        vec![Cell::Text("IMS Issue List")],
        header_row(),
        issue_row("1001", "Session leak", "Open", "Critical"),
        vec![Cell::Blank, Cell::Text("row without a number")],
        issue_row("1002", "Slow deploy", "Assigned", "Major"),
        issue_row("1003", "Admin typo", "Closed", "Minor"),
    ])
}

fn write_aged(dir: &Path, name: &str, bytes: &[u8], age_secs: u64) {
    let path = dir.join(name);
    fs::write(&path, bytes).expect("write import file");
    let file = fs::File::options().write(true).open(&path).expect("open import file");
    file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .expect("set mtime");
}

fn create_app() -> (TempDir, Settings, Router) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let settings = load_effective_settings(temp_dir.path()).expect("load settings");
    fs::create_dir_all(&settings.import_dir).expect("create import dir");

    let state = AppState::open(settings.clone()).expect("open app state");
    let app = create_router(Arc::new(state));
    (temp_dir, settings, app)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn seed_member_and_project(app: &Router) -> (String, String) {
    let (status, member) = send(
        app,
        "POST",
        "/api/members",
        Some(json!({ "name": "Park Minsu", "email": "park.ms@company.co.jp" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let member_id = member["id"].as_str().expect("member id").to_string();

    let (status, project) = send(
        app,
        "POST",
        "/api/projects",
        Some(json!({
            "name": "Core Migration",
            "description": "Bank core migration",
            "startDate": "2025-01-01T00:00:00Z",
            "dueDate": "2025-12-31T00:00:00Z",
            "customer": "ACME Bank",
            "memberIds": [member_id],
            "currentMemberId": member_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = project["id"].as_str().expect("project id").to_string();

    (member_id, project_id)
}

#[tokio::test]
async fn files_endpoint_lists_workbooks_newest_first_with_owner_filter() {
    let (_tmp, settings, app) = create_app();
    write_aged(&settings.import_dir, "park.ms_issueList_202512100006.xlsx", b"aaaa", 600);
    write_aged(&settings.import_dir, "kim_issueList_202512110001.xls", b"bb", 60);
    write_aged(&settings.import_dir, "notes.txt", b"ignored", 0);

    let (status, body) = send(&app, "GET", "/files", None).await;
    assert_eq!(status, StatusCode::OK);
    let files = body["files"].as_array().expect("files array");
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["name"], json!("kim_issueList_202512110001.xls"));
    assert_eq!(files[1]["memberId"], json!("park.ms"));
    assert_eq!(files[1]["timestamp"], json!("202512100006"));
    assert_eq!(files[1]["size"], json!(4));
    assert!(files[1]["modifiedAt"].is_string());

    let (status, body) = send(&app, "GET", "/api/excel?memberId=park.ms", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn files_endpoint_returns_empty_list_when_directory_is_missing() {
    let (_tmp, settings, app) = create_app();
    fs::remove_dir_all(&settings.import_dir).expect("remove import dir");

    let (status, body) = send(&app, "GET", "/files", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "files": [] }));
}

#[tokio::test]
async fn parse_endpoint_maps_failures_to_status_codes() {
    let (_tmp, settings, app) = create_app();
    write_aged(&settings.import_dir, "broken.xlsx", b"definitely not a workbook", 0);
    fs::write(
        settings.import_dir.join("no_header.xlsx"),
        build_xlsx(&[vec![Cell::Text("banner")], vec![Cell::Text("Subject")]]),
    )
    .expect("write headerless workbook");

    let (status, body) = send(&app, "POST", "/parse", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, "POST", "/parse", Some(json!({ "fileName": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/parse", Some(json!({ "fileName": "absent.xlsx" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/parse", Some(json!({ "fileName": "../settings.json" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "POST", "/parse", Some(json!({ "fileName": "broken.xlsx" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Could not parse the spreadsheet file"));

    let (status, _) = send(&app, "POST", "/parse", Some(json!({ "fileName": "no_header.xlsx" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn parse_endpoint_returns_normalized_candidates() {
    let (_tmp, settings, app) = create_app();
    fs::write(settings.import_dir.join("park.ms_issueList_1.xlsx"), tracker_export())
        .expect("write export");

    let (status, body) = send(
        &app,
        "POST",
        "/api/excel/parse",
        Some(json!({ "fileName": "park.ms_issueList_1.xlsx" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["fileName"], json!("park.ms_issueList_1.xlsx"));
    assert_eq!(body["totalCount"], json!(3));

    let first = &body["issues"][0];
    assert_eq!(first["imsNumber"], json!("1001"));
    assert_eq!(first["title"], json!("Session leak"));
    assert_eq!(first["type"], json!("bug"));
    assert_eq!(first["status"], json!("new"));
    assert_eq!(first["priority"], json!("urgent"));
    assert_eq!(first["tags"], json!(["JEUS", "hotfix"]));
    assert_eq!(first["customer"], json!("ACME Bank"));
    assert_eq!(first["imsStatus"], json!("Open"));
    assert_eq!(first["issuedDate"], json!("2023-03-15T00:00:00Z"));
    assert!(first["trackerUrl"]
        .as_str()
        .expect("tracker url")
        .contains("issueId=1001&"));
    assert!(first["description"]
        .as_str()
        .expect("description")
        .starts_with("Product: JEUS\nVersion: 8.5\n"));

    assert_eq!(body["issues"][1]["status"], json!("in_progress"));
    assert_eq!(body["issues"][2]["priority"], json!("low"));
}

#[tokio::test]
async fn import_endpoint_skips_already_imported_issues_and_is_idempotent() {
    let (_tmp, settings, app) = create_app();
    fs::write(settings.import_dir.join("park.ms_issueList_1.xlsx"), tracker_export())
        .expect("write export");
    let (member_id, project_id) = seed_member_and_project(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/issues",
        Some(json!({
            "projectId": project_id,
            "title": "Tracked by hand",
            "reporterId": member_id,
            "imsNumber": "1002"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let request = json!({
        "projectId": project_id,
        "memberId": member_id,
        "fileName": "park.ms_issueList_1.xlsx"
    });
    let (status, body) = send(&app, "POST", "/import", Some(request.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("imported"));
    assert_eq!(body["created"], json!(2));
    assert_eq!(body["skippedExisting"], json!(["1002"]));
    let created = body["issues"].as_array().expect("issues");
    assert_eq!(created[0]["imsNumber"], json!("1001"));
    assert_eq!(created[0]["assigneeId"], json!(member_id));
    assert_eq!(created[0]["reporterId"], json!(member_id));
    assert_eq!(created[1]["imsNumber"], json!("1003"));

    let (status, body) = send(&app, "POST", "/import", Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], json!(0));
    assert_eq!(body["skippedExisting"], json!(["1001", "1002", "1003"]));

    let (_, issues) = send(&app, "GET", &format!("/api/issues?projectId={project_id}"), None).await;
    assert_eq!(issues.as_array().map(Vec::len), Some(3));

    let (_, activities) = send(
        &app,
        "GET",
        &format!("/api/activities?projectId={project_id}"),
        None,
    )
    .await;
    let issue_created = activities
        .as_array()
        .expect("activities")
        .iter()
        .filter(|a| a["type"] == json!("issue_created"))
        .count();
    assert_eq!(issue_created, 3);

    let (status, dashboard) = send(&app, "GET", "/api/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["totalIssues"], json!(3));
    assert_eq!(dashboard["issuesByStatus"]["completed"], json!(1));
}

#[tokio::test]
async fn import_endpoint_honors_selection_and_requires_a_project() {
    let (_tmp, _settings, app) = create_app();
    let (member_id, project_id) = seed_member_and_project(&app).await;
    let candidates = json!([
        { "imsNumber": "2001", "title": "A", "description": "", "type": "task", "status": "new",
          "priority": "medium", "tags": [], "customer": "", "product": "", "imsStatus": "" },
        { "imsNumber": "2002", "title": "B", "description": "", "type": "bug", "status": "review",
          "priority": "high", "tags": ["JEUS"], "customer": "", "product": "JEUS", "imsStatus": "Test" }
    ]);

    let (status, body) = send(
        &app,
        "POST",
        "/import",
        Some(json!({ "memberId": member_id, "issues": candidates })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("project_required"));
    assert_eq!(body["created"], json!(0));

    let (status, body) = send(
        &app,
        "POST",
        "/import",
        Some(json!({
            "projectId": project_id,
            "memberId": member_id,
            "issues": candidates,
            "selected": ["2002"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], json!(1));
    assert_eq!(body["deselected"], json!(1));
    assert_eq!(body["issues"][0]["imsNumber"], json!("2002"));

    let (status, _) = send(
        &app,
        "POST",
        "/import",
        Some(json!({ "projectId": project_id, "memberId": member_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[test]
fn extracting_the_same_workbook_twice_gives_identical_candidates() {
    let bytes = tracker_export();

    let first = extract_candidates(&bytes).expect("first extraction");
    let second = extract_candidates(&bytes).expect("second extraction");
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

#[tokio::test]
async fn import_endpoint_drops_candidates_without_tracker_id() {
    let (_tmp, _settings, app) = create_app();
    let (member_id, project_id) = seed_member_and_project(&app).await;
    let request = json!({
        "projectId": project_id,
        "memberId": member_id,
        "issues": [
            { "imsNumber": "", "title": "No id", "description": "", "type": "task", "status": "new",
              "priority": "medium", "tags": [], "customer": "", "product": "", "imsStatus": "" },
            { "imsNumber": "  ", "title": "Blank id", "description": "", "type": "task", "status": "new",
              "priority": "medium", "tags": [], "customer": "", "product": "", "imsStatus": "" }
        ]
    });

    for _ in 0..2 {
        let (status, body) = send(&app, "POST", "/import", Some(request.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["created"], json!(0));
        assert_eq!(body["skippedMissingId"], json!(2));
    }

    let (_, issues) = send(&app, "GET", &format!("/api/issues?projectId={project_id}"), None).await;
    assert_eq!(issues.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn import_failure_reports_partial_count_and_failing_issue() {
    let (_tmp, _settings, app) = create_app();
    let (member_id, project_id) = seed_member_and_project(&app).await;
    let request = json!({
        "projectId": project_id,
        "memberId": member_id,
        "issues": [
            { "imsNumber": "3001", "title": "First", "description": "", "type": "task", "status": "new",
              "priority": "medium", "tags": [], "customer": "", "product": "", "imsStatus": "" },
            { "imsNumber": "3002", "title": "", "description": "", "type": "task", "status": "new",
              "priority": "medium", "tags": [], "customer": "", "product": "", "imsStatus": "" },
            { "imsNumber": "3003", "title": "Third", "description": "", "type": "task", "status": "new",
              "priority": "medium", "tags": [], "customer": "", "product": "", "imsStatus": "" }
        ]
    });

    let (status, body) = send(&app, "POST", "/import", Some(request)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["created"], json!(1));
    assert_eq!(body["imsNumber"], json!("3002"));
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("title is required"));

    let (_, issues) = send(&app, "GET", &format!("/api/issues?projectId={project_id}"), None).await;
    let issues = issues.as_array().expect("issues");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["imsNumber"], json!("3001"));
}

#[tokio::test]
async fn issue_endpoints_support_crud_and_status_contract() {
    let (_tmp, _settings, app) = create_app();
    let (member_id, project_id) = seed_member_and_project(&app).await;

    let (status, body) = send(&app, "POST", "/api/issues", Some(json!({ "title": "No project" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("projectId, title, reporterId are required"));

    let (status, issue) = send(
        &app,
        "POST",
        "/api/issues",
        Some(json!({
            "projectId": project_id,
            "title": "Console crash",
            "type": "bug",
            "reporterId": member_id,
            "tags": ["WebAdmin"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(issue["status"], json!("new"));
    assert_eq!(issue["priority"], json!("medium"));
    assert_eq!(issue["tags"], json!(["WebAdmin"]));
    let issue_id = issue["id"].as_str().expect("issue id").to_string();

    let (status, _) = send(&app, "PATCH", &format!("/api/issues/{issue_id}"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, moved) = send(
        &app,
        "PATCH",
        &format!("/api/issues/{issue_id}"),
        Some(json!({ "status": "in_progress", "currentMemberId": member_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["status"], json!("in_progress"));

    let (_, feed) = send(&app, "GET", "/api/activities?limit=1", None).await;
    assert_eq!(feed[0]["type"], json!("status_changed"));

    let (_, filtered) = send(&app, "GET", "/api/issues?status=in_progress", None).await;
    assert_eq!(filtered.as_array().map(Vec::len), Some(1));
    let (status, _) = send(&app, "GET", "/api/issues?status=blocked", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "DELETE", &format!("/api/issues/{issue_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (status, _) = send(&app, "GET", &format!("/api/issues/{issue_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn project_and_member_endpoints_round_trip() {
    let (_tmp, _settings, app) = create_app();
    let (member_id, project_id) = seed_member_and_project(&app).await;

    let (status, project) = send(&app, "GET", &format!("/api/projects/{project_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project["status"], json!("backlog"));
    assert_eq!(project["memberIds"], json!([member_id]));

    let (_, activities) = send(&app, "GET", &format!("/api/activities?memberId={member_id}"), None).await;
    assert_eq!(activities[0]["type"], json!("project_created"));

    let (status, _) = send(&app, "POST", "/api/projects", Some(json!({ "name": "Half" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, member) = send(&app, "GET", &format!("/api/members/{member_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(member["role"], json!("member"));

    let (status, _) = send(&app, "DELETE", &format!("/api/projects/{project_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "DELETE", &format!("/api/projects/{project_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, members) = send(&app, "GET", "/api/members", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn settings_endpoints_round_trip_and_merge_partial_updates() {
    let (_tmp, _settings, app) = create_app();

    let (status, initial) = send(&app, "GET", "/api/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(initial["importDir"], json!("excels"));

    let (status, saved) = send(
        &app,
        "PUT",
        "/api/settings",
        Some(json!({ "activityFeedLimit": 5, "importExtensions": ["XLSX"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["activityFeedLimit"], json!(10));
    assert_eq!(saved["importExtensions"], json!(["xlsx"]));
    assert_eq!(saved["listenAddr"], json!("127.0.0.1:3000"));

    let (status, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], json!("healthy"));
}
