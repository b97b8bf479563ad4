mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{DEFAULT_API_KEY, admin, send_text, spawn_app};

const SHEET: &str = "Asset Tag,Device Name,Serial No.,Category,Owner,Cost
lt-1,ThinkPad T14,SN-1,Laptops,E100,\"1,299.00\"
lt-2,MacBook Air,SN-2,Laptops,nobody@example.com,999
,Missing tag,SN-3,,,
";

fn sheet_mapping() -> Value {
    json!({
        "Asset Tag": "asset_tag",
        "Device Name": "name",
        "Serial No.": "serial_number",
        "Category": "category",
        "Owner": "assigned_to",
        "Cost": "purchase_cost",
    })
}

async fn seed_owner(app: &axum::Router) {
    let (status, _) = admin(
        app,
        "POST",
        "/api/directory-users",
        Some(json!({
            "employee_id": "E100",
            "email": "jane@example.com",
            "display_name": "Jane Doe",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_preview_suggests_mapping() {
    let app = spawn_app().await;

    let (status, _, body) =
        send_text(&app, "POST", "/api/import/preview", DEFAULT_API_KEY, SHEET).await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_str(&body).unwrap();
    let preview = &body["data"];
    assert_eq!(preview["total_rows"], 3);
    assert_eq!(preview["delimiter"], ",");
    assert_eq!(preview["headers"].as_array().unwrap().len(), 6);
    assert_eq!(preview["sample_rows"][0][0], "lt-1");

    let suggestion = |column: &str| {
        preview["suggestions"]
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["column"] == column)
            .map(|s| s["field"].clone())
            .unwrap()
    };
    assert_eq!(suggestion("Asset Tag"), "asset_tag");
    assert_eq!(suggestion("Device Name"), "name");
    assert_eq!(suggestion("Serial No."), "serial_number");
    assert_eq!(suggestion("Owner"), "assigned_to");
    assert_eq!(suggestion("Cost"), "purchase_cost");
}

#[tokio::test]
async fn test_preview_rejects_empty_body() {
    let app = spawn_app().await;

    let (status, _, _) = send_text(&app, "POST", "/api/import/preview", DEFAULT_API_KEY, "  ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dry_run_changes_nothing() {
    let app = spawn_app().await;
    seed_owner(&app).await;

    let (status, body) = admin(
        &app,
        "POST",
        "/api/import/assets",
        Some(json!({
            "csv": SHEET,
            "mapping": sheet_mapping(),
            "dry_run": true,
            "create_missing_categories": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let report = &body["data"];
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["total"], 3);
    assert_eq!(report["succeeded"], 1);
    assert_eq!(report["failed"], 2);
    assert_eq!(report["categories_created"], json!(["Laptops"]));
    assert_eq!(report["rows"][0]["status"], "valid");
    assert_eq!(report["rows"][0]["line"], 2);
    assert!(report["rows"][0]["asset_id"].is_null());

    let (_, body) = admin(&app, "GET", "/api/assets", None).await;
    assert_eq!(body["data"]["total"], 0);
    let (_, body) = admin(&app, "GET", "/api/categories", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_import_stores_valid_rows_and_reports_bad_ones() {
    let app = spawn_app().await;
    seed_owner(&app).await;

    let (status, body) = admin(
        &app,
        "POST",
        "/api/import/assets",
        Some(json!({
            "csv": SHEET,
            "mapping": sheet_mapping(),
            "create_missing_categories": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let report = &body["data"];
    assert_eq!(report["succeeded"], 1);
    assert_eq!(report["failed"], 2);

    let rows = report["rows"].as_array().unwrap();
    assert_eq!(rows[0]["status"], "created");
    assert_eq!(rows[0]["asset_tag"], "LT-1");
    assert_eq!(rows[1]["status"], "error");
    assert!(rows[1]["errors"][0].as_str().unwrap().contains("nobody@example.com"));
    assert_eq!(rows[2]["line"], 4);
    assert!(rows[2]["errors"][0].as_str().unwrap().contains("asset_tag"));

    let asset_id = rows[0]["asset_id"].as_i64().unwrap();
    let (_, body) = admin(&app, "GET", &format!("/api/assets/{asset_id}"), None).await;
    let asset = &body["data"];
    assert_eq!(asset["purchase_cost"], 1299.0);
    assert_eq!(asset["status"], "assigned");
    assert!(asset["category_id"].is_number());

    let (_, body) = admin(&app, "GET", &format!("/api/assets/{asset_id}/history"), None).await;
    assert_eq!(body["data"][0]["action"], "import");

    // Same sheet again: the tag is taken now.
    let (_, body) = admin(
        &app,
        "POST",
        "/api/import/assets",
        Some(json!({ "csv": SHEET, "mapping": sheet_mapping() })),
    )
    .await;
    assert_eq!(body["data"]["succeeded"], 0);
    assert_eq!(body["data"]["rows"][0]["status"], "error");
}

#[tokio::test]
async fn test_unknown_category_without_creation_fails_row() {
    let app = spawn_app().await;
    seed_owner(&app).await;

    let (_, body) = admin(
        &app,
        "POST",
        "/api/import/assets",
        Some(json!({ "csv": SHEET, "mapping": sheet_mapping() })),
    )
    .await;

    assert_eq!(body["data"]["succeeded"], 0);
    assert!(
        body["data"]["rows"][0]["errors"][0]
            .as_str()
            .unwrap()
            .contains("Laptops")
    );
}

#[tokio::test]
async fn test_invalid_mapping_rejects_whole_request() {
    let app = spawn_app().await;

    let (status, body) = admin(
        &app,
        "POST",
        "/api/import/assets",
        Some(json!({
            "csv": SHEET,
            "mapping": { "Asset Tag": "asset_tag", "Nope": "name" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Nope"));
}

#[tokio::test]
async fn test_duplicate_tags_within_sheet() {
    let app = spawn_app().await;
    let csv = "tag,name\nA-1,First\na-1,Second\n";

    let (_, body) = admin(
        &app,
        "POST",
        "/api/import/assets",
        Some(json!({ "csv": csv, "mapping": { "tag": "asset_tag", "name": "name" } })),
    )
    .await;

    assert_eq!(body["data"]["succeeded"], 1);
    assert_eq!(body["data"]["rows"][1]["status"], "error");
}

#[tokio::test]
async fn test_template_lifecycle() {
    let app = spawn_app().await;

    let (status, body) = admin(
        &app,
        "POST",
        "/api/import/templates",
        Some(json!({ "name": "Minimal", "mappings": { "tag": "asset_tag", "name": "name" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = admin(
        &app,
        "POST",
        "/api/import/templates",
        Some(json!({ "name": "minimal", "mappings": { "tag": "asset_tag", "name": "name" } })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = admin(
        &app,
        "POST",
        "/api/import/templates",
        Some(json!({ "name": "Broken", "mappings": { "tag": "colour" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = admin(
        &app,
        "POST",
        "/api/import/assets",
        Some(json!({ "csv": "tag,name\nT-1,Thing\n", "template_id": id })),
    )
    .await;
    assert_eq!(body["data"]["succeeded"], 1);

    let (status, body) = admin(
        &app,
        "PUT",
        &format!("/api/import/templates/{id}"),
        Some(json!({ "name": "Minimal v2", "mappings": { "tag": "asset_tag", "title": "name" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["mappings"]["title"], "name");

    let (_, body) = admin(&app, "GET", "/api/import/templates", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = admin(&app, "DELETE", &format!("/api/import/templates/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = admin(
        &app,
        "POST",
        "/api/import/assets",
        Some(json!({ "csv": "tag,name\nT-2,Thing\n", "template_id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = admin(&app, "GET", "/api/audit?entity_type=import_template", None).await;
    assert_eq!(body["data"]["total"], 3);
}
