mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, FixedOffset};
use serde_json::{Value, json};

use common::{DEFAULT_ADMIN_EMAIL, DEFAULT_API_KEY, admin, send_text, spawn_app};

async fn create_asset(app: &axum::Router, body: Value) -> Value {
    let (status, body) = admin(app, "POST", "/api/assets", Some(body)).await;
    assert_eq!(status, StatusCode::OK, "create failed: {body}");
    body["data"].clone()
}

async fn create_person(app: &axum::Router, employee_id: &str, email: &str) -> i64 {
    let (status, body) = admin(
        app,
        "POST",
        "/api/directory-users",
        Some(json!({
            "employee_id": employee_id,
            "email": email,
            "display_name": "Test Person",
            "department": "IT",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create failed: {body}");
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_asset_crud_writes_audit_trail() {
    let app = spawn_app().await;

    let asset = create_asset(
        &app,
        json!({
            "asset_tag": " lt-100 ",
            "name": "ThinkPad X1",
            "serial_number": "PF-1234",
            "purchase_cost": 1499.0,
            "purchase_date": "2024-02-01",
        }),
    )
    .await;
    let id = asset["id"].as_i64().unwrap();
    assert_eq!(asset["asset_tag"], "LT-100");
    assert_eq!(asset["status"], "available");
    assert_eq!(asset["asset_type"], "hardware");

    let (status, body) = admin(
        &app,
        "PUT",
        &format!("/api/assets/{id}"),
        Some(json!({ "location": "HQ 2nd floor", "status": "maintenance" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["location"], "HQ 2nd floor");
    assert_eq!(body["data"]["serial_number"], "PF-1234");

    // Same values again: nothing changes, nothing is audited.
    let (status, _) = admin(
        &app,
        "PUT",
        &format!("/api/assets/{id}"),
        Some(json!({ "location": "HQ 2nd floor" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = admin(&app, "GET", &format!("/api/assets/{id}/history"), None).await;
    assert_eq!(status, StatusCode::OK);
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["action"], "update");
    assert_eq!(history[0]["actor"], DEFAULT_ADMIN_EMAIL);
    assert_eq!(history[0]["changes"]["status"]["old"], "available");
    assert_eq!(history[0]["changes"]["status"]["new"], "maintenance");
    assert!(history[0]["changes"].get("serial_number").is_none());
    assert_eq!(history[1]["action"], "create");
    assert!(history[1]["old_values"].is_null());

    let (status, _) = admin(&app, "DELETE", &format!("/api/assets/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = admin(&app, "GET", &format!("/api/assets/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // History outlives the record.
    let (_, body) = admin(&app, "GET", &format!("/api/assets/{id}/history"), None).await;
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0]["action"], "delete");
    assert_eq!(history[0]["old_values"]["asset_tag"], "LT-100");
}

#[tokio::test]
async fn test_duplicate_tag_conflicts() {
    let app = spawn_app().await;
    create_asset(&app, json!({ "asset_tag": "MON-1", "name": "Monitor" })).await;

    let (status, body) = admin(
        &app,
        "POST",
        "/api/assets",
        Some(json!({ "asset_tag": "mon-1", "name": "Other monitor" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let other = create_asset(&app, json!({ "asset_tag": "MON-2", "name": "Monitor" })).await;
    let (status, _) = admin(
        &app,
        "PUT",
        &format!("/api/assets/{}", other["id"]),
        Some(json!({ "asset_tag": "MON-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_asset_validation() {
    let app = spawn_app().await;

    let (status, _) = admin(
        &app,
        "POST",
        "/api/assets",
        Some(json!({ "asset_tag": "", "name": "Nameless" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = admin(
        &app,
        "POST",
        "/api/assets",
        Some(json!({ "asset_tag": "X-1", "name": "Bad date", "purchase_date": "last week" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = admin(
        &app,
        "POST",
        "/api/assets",
        Some(json!({ "asset_tag": "X-2", "name": "Orphan", "category_id": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = admin(&app, "GET", "/api/assets?status=melted", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = admin(&app, "GET", "/api/assets/0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_assign_and_unassign() {
    let app = spawn_app().await;
    let person = create_person(&app, "E100", "jane@example.com").await;
    let asset = create_asset(&app, json!({ "asset_tag": "LT-7", "name": "Laptop" })).await;
    let id = asset["id"].as_i64().unwrap();

    let (status, body) = admin(
        &app,
        "POST",
        &format!("/api/assets/{id}/assign"),
        Some(json!({ "directory_user_id": person })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["assigned_to"], person);
    assert_eq!(body["data"]["status"], "assigned");

    let (_, body) = admin(
        &app,
        "GET",
        &format!("/api/directory-users/{person}/assets"),
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = admin(&app, "GET", &format!("/api/assets?assigned_to={person}"), None).await;
    assert_eq!(body["data"]["total"], 1);

    // Owners holding assets cannot be removed.
    let (status, _) = admin(&app, "DELETE", &format!("/api/directory-users/{person}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = admin(
        &app,
        "POST",
        &format!("/api/assets/{id}/assign"),
        Some(json!({ "directory_user_id": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["assigned_to"].is_null());
    assert_eq!(body["data"]["status"], "available");

    let (_, body) = admin(&app, "GET", &format!("/api/assets/{id}/history"), None).await;
    let actions: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["unassign", "assign", "create"]);

    let (status, _) = admin(
        &app,
        "POST",
        &format!("/api/assets/{id}/assign"),
        Some(json!({ "directory_user_id": 4242 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_filters_and_pagination() {
    let app = spawn_app().await;
    for i in 1..=5 {
        create_asset(
            &app,
            json!({ "asset_tag": format!("HW-{i}"), "name": format!("Desk phone {i}") }),
        )
        .await;
    }
    create_asset(
        &app,
        json!({ "asset_tag": "SW-1", "name": "Office licence", "asset_type": "software" }),
    )
    .await;

    let (status, body) = admin(&app, "GET", "/api/assets?page=2&page_size=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 6);
    assert_eq!(body["data"]["page"], 2);
    assert_eq!(body["data"]["total_pages"], 3);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

    let (_, body) = admin(&app, "GET", "/api/assets?asset_type=software", None).await;
    assert_eq!(body["data"]["total"], 1);

    let (_, body) = admin(&app, "GET", "/api/assets?q=phone", None).await;
    assert_eq!(body["data"]["total"], 5);

    let (status, _) = admin(&app, "GET", "/api/assets?page_size=10000", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_csv() {
    let app = spawn_app().await;
    let person = create_person(&app, "E7", "owner@example.com").await;
    create_asset(
        &app,
        json!({ "asset_tag": "LT-1", "name": "Laptop, 14\"", "assigned_to": person }),
    )
    .await;

    let (status, content_type, body) =
        send_text(&app, "GET", "/api/assets/export", DEFAULT_API_KEY, "").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with(mime::TEXT_CSV.essence_str()));

    let mut lines = body.lines();
    assert!(lines.next().unwrap().starts_with("asset_tag,"));
    let row = lines.next().unwrap();
    assert!(row.starts_with("LT-1,\"Laptop, 14\"\"\""));
    assert!(row.contains("owner@example.com"));
}

#[tokio::test]
async fn test_category_tree_and_delete_rules() {
    let app = spawn_app().await;

    let (status, body) = admin(
        &app,
        "POST",
        "/api/categories",
        Some(json!({ "name": "Hardware" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let parent = body["data"]["id"].as_i64().unwrap();

    let (_, body) = admin(
        &app,
        "POST",
        "/api/categories",
        Some(json!({ "name": "Laptops", "parent_id": parent })),
    )
    .await;
    let child = body["data"]["id"].as_i64().unwrap();

    let (status, _) = admin(
        &app,
        "POST",
        "/api/categories",
        Some(json!({ "name": "laptops" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    create_asset(
        &app,
        json!({ "asset_tag": "LT-1", "name": "Laptop", "category_id": child }),
    )
    .await;

    let (_, body) = admin(&app, "GET", "/api/categories/tree", None).await;
    let roots = body["data"].as_array().unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["name"], "Hardware");
    assert_eq!(roots[0]["children"][0]["name"], "Laptops");
    assert_eq!(roots[0]["children"][0]["asset_count"], 1);

    // A category cannot become its own ancestor.
    let (status, _) = admin(
        &app,
        "PUT",
        &format!("/api/categories/{parent}"),
        Some(json!({ "parent_id": child })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = admin(&app, "DELETE", &format!("/api/categories/{parent}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = admin(&app, "DELETE", &format!("/api/categories/{child}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = admin(&app, "GET", "/api/audit?entity_type=category", None).await;
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn test_audit_filters_and_export() {
    let app = spawn_app().await;
    let asset = create_asset(&app, json!({ "asset_tag": "A-1", "name": "Router" })).await;
    admin(
        &app,
        "PUT",
        &format!("/api/assets/{}", asset["id"]),
        Some(json!({ "name": "Core router" })),
    )
    .await;

    let (_, body) = admin(&app, "GET", "/api/audit?action=update", None).await;
    assert_eq!(body["data"]["total"], 1);
    let entry_id = body["data"]["items"][0]["id"].as_i64().unwrap();

    let (status, body) = admin(&app, "GET", &format!("/api/audit/{entry_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["changes"]["name"]["new"], "Core router");
    let updated_at = body["data"]["created_at"].as_str().unwrap().to_string();

    let (_, body) = admin(&app, "GET", "/api/audit?actor=admin&from=2000-01-01", None).await;
    assert_eq!(body["data"]["total"], 2);

    let (_, body) = admin(&app, "GET", "/api/audit?to=2000-01-01", None).await;
    assert_eq!(body["data"]["total"], 0);

    // Half an hour before the writes, written with a +02:00 offset.
    let written: DateTime<FixedOffset> =
        DateTime::parse_from_rfc3339(&updated_at).unwrap();
    let before = (written - Duration::minutes(30))
        .with_timezone(&FixedOffset::east_opt(2 * 3600).unwrap())
        .to_rfc3339()
        .replace('+', "%2B");
    let (_, body) = admin(&app, "GET", &format!("/api/audit?to={before}"), None).await;
    assert_eq!(body["data"]["total"], 0);
    let (_, body) = admin(&app, "GET", &format!("/api/audit?from={before}"), None).await;
    assert_eq!(body["data"]["total"], 2);

    let (status, _) = admin(&app, "GET", "/api/audit?action=explode", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, content_type, csv) =
        send_text(&app, "GET", "/api/audit/export?format=csv", DEFAULT_API_KEY, "").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with(mime::TEXT_CSV.essence_str()));
    assert_eq!(csv.lines().count(), 3);

    let (status, content_type, json_body) =
        send_text(&app, "GET", "/api/audit/export", DEFAULT_API_KEY, "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, mime::APPLICATION_JSON.essence_str());
    let entries: Vec<Value> = serde_json::from_str(&json_body).unwrap();
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn test_dashboard_stats() {
    let app = spawn_app().await;
    let today = chrono::Utc::now().date_naive();
    let soon = (today + chrono::Duration::days(5)).format("%Y-%m-%d").to_string();
    let later = (today + chrono::Duration::days(400)).format("%Y-%m-%d").to_string();

    create_asset(
        &app,
        json!({ "asset_tag": "W-1", "name": "Soon", "warranty_expires": soon, "purchase_cost": 100.0 }),
    )
    .await;
    create_asset(
        &app,
        json!({ "asset_tag": "W-2", "name": "Later", "warranty_expires": later, "status": "maintenance", "purchase_cost": 50.5 }),
    )
    .await;

    let (status, body) = admin(&app, "GET", "/api/dashboard/stats", None).await;
    assert_eq!(status, StatusCode::OK);

    let stats = &body["data"];
    assert_eq!(stats["totals"]["assets"], 2);
    assert_eq!(stats["totals"]["audit_entries"], 2);
    assert_eq!(stats["totals"]["total_purchase_cost"], 150.5);
    assert_eq!(stats["expiring_warranties"].as_array().unwrap().len(), 1);
    assert_eq!(stats["expiring_warranties"][0]["asset_tag"], "W-1");
    assert_eq!(stats["recent_activity"].as_array().unwrap().len(), 2);

    let by_status = stats["by_status"].as_array().unwrap();
    assert!(by_status.iter().any(|r| r["label"] == "maintenance" && r["count"] == 1));
}
