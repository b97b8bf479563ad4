mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::json;
use tower::ServiceExt;

use assetdesk::config::SessionStoreKind;
use common::{
    DEFAULT_ADMIN_EMAIL, DEFAULT_API_KEY, admin, send, spawn_app, spawn_app_with, test_config,
    user_with_role,
};

#[tokio::test]
async fn test_auth_endpoints() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/system/status", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, "GET", "/api/system/status", Some("wrong-key"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = admin(&app, "GET", "/api/system/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], true);
    assert_eq!(body["data"]["directory_enabled"], false);
    assert_eq!(body["data"]["session_store"], "memory");
}

#[tokio::test]
async fn test_bearer_token_is_accepted() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header("Authorization", format!("Bearer {DEFAULT_API_KEY}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

async fn assert_session_round_trip(app: &Router) {
    let (status, _) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": DEFAULT_ADMIN_EMAIL, "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": "Admin@AssetDesk.local", "password": "password" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("login sets a session cookie")
        .to_string();

    let me = |cookie: String| {
        Request::builder()
            .uri("/api/auth/me")
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(me(cookie.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, cookie.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(me(cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_login_and_logout() {
    let app = spawn_app().await;
    assert_session_round_trip(&app).await;
}

#[tokio::test]
async fn test_database_session_store() {
    let mut config = test_config();
    config.server.session_store = SessionStoreKind::Database;
    let app = spawn_app_with(config).await;
    assert_session_round_trip(&app).await;
}

#[tokio::test]
async fn test_viewer_cannot_mutate() {
    let app = spawn_app().await;
    let viewer = user_with_role(&app, "viewer@example.com", "viewer").await;

    let (status, _) = send(&app, "GET", "/api/assets", Some(&viewer), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/api/assets",
        Some(&viewer),
        Some(json!({ "asset_tag": "LT-1", "name": "Laptop" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, "GET", "/api/users", Some(&viewer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/api/system/config", Some(&viewer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_manager_mutates_but_cannot_manage_users() {
    let app = spawn_app().await;
    let manager = user_with_role(&app, "manager@example.com", "manager").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/categories",
        Some(&manager),
        Some(json!({ "name": "Monitors" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "POST", "/api/directory/sync", Some(&manager), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "POST",
        "/api/users",
        Some(&manager),
        Some(json!({ "email": "x@example.com", "password": "longenough", "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_management() {
    let app = spawn_app().await;

    let (status, body) = admin(
        &app,
        "POST",
        "/api/users",
        Some(json!({ "email": "new@example.com", "password": "longenough" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "viewer");
    assert!(body["data"].get("api_key").is_none());
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = admin(
        &app,
        "POST",
        "/api/users",
        Some(json!({ "email": "NEW@example.com", "password": "longenough" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = admin(
        &app,
        "POST",
        "/api/users",
        Some(json!({ "email": "short@example.com", "password": "abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = admin(
        &app,
        "PUT",
        &format!("/api/users/{id}/role"),
        Some(json!({ "role": "manager" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "manager");

    // The seeded admin has id 1.
    let (status, _) = admin(&app, "DELETE", "/api/users/1", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = admin(&app, "DELETE", &format!("/api/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = admin(&app, "GET", "/api/audit?entity_type=user", None).await;
    let actions: Vec<&str> = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["delete", "update", "create"]);

    for entry in body["data"]["items"].as_array().unwrap() {
        let text = entry.to_string();
        assert!(!text.contains("password_hash"));
        assert!(!text.contains("api_key"));
    }
}

#[tokio::test]
async fn test_change_password_and_regenerate_key() {
    let app = spawn_app().await;
    let key = user_with_role(&app, "pw@example.com", "viewer").await;

    let (status, _) = send(
        &app,
        "PUT",
        "/api/auth/password",
        Some(&key),
        Some(json!({ "current_password": "nope", "new_password": "another-one" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PUT",
        "/api/auth/password",
        Some(&key),
        Some(json!({ "current_password": "correct-horse", "new_password": "another-one" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", "/api/auth/api-key/regenerate", Some(&key), None).await;
    assert_eq!(status, StatusCode::OK);
    let fresh = body["data"]["api_key"].as_str().unwrap().to_string();
    assert_ne!(fresh, key);

    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&key), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&fresh), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], true);
}

#[tokio::test]
async fn test_system_config_is_redacted() {
    let mut config = common::test_config();
    config.directory.bind_password = "hunter2".to_string();
    let app = common::spawn_app_with(config).await;

    let (status, body) = admin(&app, "GET", "/api/system/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["directory"]["bind_password"], "********");
    assert!(body["data"]["server"]["port"].is_number());
}

#[tokio::test]
async fn test_unknown_api_route_is_json_404() {
    let app = spawn_app().await;

    let (status, body) = admin(&app, "GET", "/api/nothing-here", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_ui_fallback_serves_index() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/assets").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with(mime::TEXT_HTML.essence_str()));
    assert_eq!(
        response.headers().get("x-frame-options").unwrap(),
        "DENY"
    );
    assert!(response.headers().contains_key("x-request-id"));
}
