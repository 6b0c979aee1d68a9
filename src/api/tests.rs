use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use super::create_router;
use crate::testutil::{test_state, test_state_with, test_state_with_clickup};

const BOUNDARY: &str = "release-notes-test-boundary";

async fn send_raw(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let (status, bytes) = send_raw(app, request).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register_and_login(app: &Router, username: &str, admin: bool) -> String {
    let mut body = json!({
        "email": format!("{username}@example.com"),
        "username": username,
        "password": "hunter2hunter2",
    });
    if admin {
        body["role"] = json!("admin");
        body["admin_code"] = json!("letmein");
    }
    let (status, _) = send(app, Method::POST, "/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({
            "email": format!("{username}@example.com"),
            "password": "hunter2hunter2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().unwrap().to_string()
}

fn release_body(title: &str, datetime: &str) -> Value {
    json!({
        "title": title,
        "description": "<p>Details</p>",
        "datetime": datetime,
        "category": "bugfix",
    })
}

async fn setup() -> (TempDir, Router, String, String) {
    let temp_dir = TempDir::new().unwrap();
    let app = create_router(test_state(&temp_dir));
    let admin = register_and_login(&app, "admin", true).await;
    let user = register_and_login(&app, "reader", false).await;
    (temp_dir, app, admin, user)
}

// ============================================================================
// Auth and role gating
// ============================================================================

#[tokio::test]
async fn test_requests_without_session_are_rejected() {
    let (_dir, app, _admin, _user) = setup().await;

    let (status, body) = send(&app, Method::GET, "/releases", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "fail");

    let (status, _) = send(&app, Method::GET, "/releases", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_readers_cannot_edit() {
    let (_dir, app, _admin, user) = setup().await;

    let (status, _) = send(&app, Method::GET, "/releases", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/releases",
        Some(&user),
        Some(release_body("Nope", "2024-03-19T15:30:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["data"]["message"], "Admin role required");

    let (status, _) = send(&app, Method::GET, "/users", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_registration_needs_code() {
    let (_dir, app, _admin, _user) = setup().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": "mallory@example.com",
            "username": "mallory",
            "password": "hunter2hunter2",
            "role": "admin",
            "admin_code": "guess",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": "other@example.com",
            "username": "Reader",
            "password": "hunter2hunter2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": "short@example.com",
            "username": "shorty",
            "password": "short",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_me_logout() {
    let (_dir, app, admin, _user) = setup().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "admin@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::GET, "/auth/me", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "admin");
    assert_eq!(body["data"]["role"], "admin");

    let (status, body) = send(&app, Method::POST, "/auth/logout", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["revoked"], true);

    let (status, _) = send(&app, Method::GET, "/auth/me", Some(&admin), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_change_applies_to_open_sessions() {
    let (_dir, app, admin, user) = setup().await;

    let (_, body) = send(&app, Method::GET, "/users", Some(&admin), None).await;
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    let admin_id = users[0]["id"].as_str().unwrap().to_string();
    let reader_id = users[1]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/users/{admin_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/users/{reader_id}/role"),
        Some(&admin),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "admin");

    // Same token, new role
    let (status, _) = send(
        &app,
        Method::POST,
        "/releases",
        Some(&user),
        Some(release_body("Promoted", "2024-03-19T15:30:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/users/{reader_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/releases", Some(&user), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn admin_registration(username: &str) -> Value {
    json!({
        "email": format!("{username}@example.com"),
        "username": username,
        "password": "hunter2hunter2",
        "role": "admin",
    })
}

#[tokio::test]
async fn test_first_admin_without_code_is_exclusive() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_router(test_state_with(&temp_dir, |config| {
        config.auth.admin_registration_code = None;
    }));

    let (alice, mallory) = tokio::join!(
        send(&app, Method::POST, "/auth/register", None, Some(admin_registration("alice"))),
        send(&app, Method::POST, "/auth/register", None, Some(admin_registration("mallory"))),
    );

    let mut statuses = vec![alice.0.as_u16(), mallory.0.as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![201, 403]);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(admin_registration("trudy")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": "bob@example.com",
            "username": "bob",
            "password": "hunter2hunter2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "user");
}

#[tokio::test]
async fn test_out_of_range_session_ttl_fails_login_cleanly() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_router(test_state_with(&temp_dir, |config| {
        config.auth.session_ttl_hours = i64::MAX;
    }));

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": "ada@example.com",
            "username": "ada",
            "password": "hunter2hunter2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
}

// ============================================================================
// Releases
// ============================================================================

#[tokio::test]
async fn test_create_and_fetch_release() {
    let (_dir, app, admin, user) = setup().await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/releases",
        Some(&admin),
        Some(release_body("Login fix", "2024-03-19T15:30:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/releases", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Login fix");
    assert_eq!(items[0]["category"], "bugfix");
    assert_eq!(items[0]["datetime"], "2024-03-19T15:30:00Z");
    assert_eq!(items[0]["tags"], json!([]));
    assert_eq!(items[0]["labels"], json!([]));
    assert_eq!(items[0]["media"], json!([]));

    let slug = items[0]["slug"].as_str().unwrap();
    assert_eq!(slug, format!("login-fix-{}", &id[..8]));

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/releases/{slug}"),
        Some(&user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());

    let (status, body) = send(&app, Method::GET, &format!("/releases/{id}"), Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["slug"], slug);
}

#[tokio::test]
async fn test_create_rejects_invalid_form() {
    let (_dir, app, admin, _user) = setup().await;

    let mut body = release_body("  ", "2024-03-19T15:30:00Z");
    let (status, _) = send(&app, Method::POST, "/releases", Some(&admin), Some(body.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    body["title"] = json!("Fine");
    body["category"] = json!("hotfix");
    let (status, _) = send(&app, Method::POST, "/releases", Some(&admin), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listed) = send(&app, Method::GET, "/releases", Some(&admin), None).await;
    assert_eq!(listed["data"]["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_update_release_with_tags() {
    let (_dir, app, admin, user) = setup().await;

    let (_, created) = send(
        &app,
        Method::POST,
        "/releases",
        Some(&admin),
        Some(release_body("Dark mode", "2024-03-19T15:30:00Z")),
    )
    .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let slug = created["data"]["slug"].as_str().unwrap().to_string();

    let mut update = release_body("Dark mode everywhere", "2024-03-20T09:00:00Z");
    update["category"] = json!("feature");
    update["tags"] = json!([
        { "id": "new-1", "name": "ui", "color": "#f59e0b" },
        { "name": "UI", "color": "#f59e0b" },
    ]);
    update["labels"] = json!([{ "name": "web", "color": "#10b981" }]);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/releases/{id}"),
        Some(&admin),
        Some(update),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Dark mode everywhere");
    assert_eq!(body["data"]["category"], "feature");
    assert_eq!(body["data"]["slug"], slug.as_str());
    assert_eq!(body["data"]["tags"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["tags"][0]["name"], "ui");
    assert_eq!(body["data"]["labels"][0]["name"], "web");

    let (status, tags) = send(&app, Method::GET, "/tags", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags["data"][0]["color"], "#f59e0b");

    let (_, labels) = send(&app, Method::GET, "/labels", Some(&user), None).await;
    assert_eq!(labels["data"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/releases/does-not-exist",
        Some(&admin),
        Some(release_body("Ghost", "2024-03-19T15:30:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_with_placeholder_id_does_not_create() {
    let (_dir, app, admin, _user) = setup().await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/releases/new-1",
        Some(&admin),
        Some(release_body("Sneaky insert", "2024-03-19T15:30:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = send(&app, Method::GET, "/releases", Some(&admin), None).await;
    assert_eq!(listed["data"]["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_delete_release() {
    let (_dir, app, admin, user) = setup().await;

    let (_, created) = send(
        &app,
        Method::POST,
        "/releases",
        Some(&admin),
        Some(release_body("Short lived", "2024-03-19T15:30:00Z")),
    )
    .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::DELETE, &format!("/releases/{id}"), Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) =
        send(&app, Method::DELETE, &format!("/releases/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["id"], id.as_str());

    let (status, body) =
        send(&app, Method::DELETE, &format!("/releases/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "fail");

    let (status, _) = send(&app, Method::GET, &format!("/releases/{id}"), Some(&user), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_listing_pages_and_filters() {
    let (_dir, app, admin, user) = setup().await;

    let (_, empty) = send(&app, Method::GET, "/releases", Some(&user), None).await;
    assert_eq!(empty["data"]["empty"], true);
    assert_eq!(empty["data"]["message"], "No releases found");
    assert_eq!(empty["data"]["pagination"]["total_pages"], 0);
    assert_eq!(empty["data"]["pagination"]["page"], 1);

    for (title, datetime) in [
        ("First", "2024-01-10T10:00:00Z"),
        ("Second", "2024-02-10T10:00:00Z"),
        ("Third", "2024-03-10T10:00:00Z"),
    ] {
        send(
            &app,
            Method::POST,
            "/releases",
            Some(&admin),
            Some(release_body(title, datetime)),
        )
        .await;
    }

    let (_, first) = send(&app, Method::GET, "/releases", Some(&user), None).await;
    assert_eq!(first["data"]["empty"], false);
    assert_eq!(first["data"]["items"][0]["title"], "Third");
    assert_eq!(first["data"]["pagination"]["total"], 3);
    assert_eq!(first["data"]["pagination"]["total_pages"], 2);

    let (_, clamped) = send(&app, Method::GET, "/releases?page=99", Some(&user), None).await;
    assert_eq!(clamped["data"]["pagination"]["page"], 2);
    assert_eq!(clamped["data"]["items"][0]["title"], "First");

    let (_, asc) = send(&app, Method::GET, "/releases?sort=asc", Some(&user), None).await;
    assert_eq!(asc["data"]["items"][0]["title"], "First");

    let (_, ranged) = send(
        &app,
        Method::GET,
        "/releases?from=2024-02-01T00:00:00Z&to=2024-02-29T23:59:59Z",
        Some(&user),
        None,
    )
    .await;
    assert_eq!(ranged["data"]["pagination"]["total"], 1);
    assert_eq!(ranged["data"]["items"][0]["title"], "Second");

    let (_, searched) = send(&app, Method::GET, "/releases?search=THIRD", Some(&user), None).await;
    assert_eq!(searched["data"]["pagination"]["total"], 1);

    let (status, _) = send(&app, Method::GET, "/releases?category=hotfix", Some(&user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/releases?page=-1", Some(&user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_csv() {
    let (_dir, app, admin, user) = setup().await;

    send(
        &app,
        Method::POST,
        "/releases",
        Some(&admin),
        Some(release_body("Login \"fix\"", "2024-03-19T15:30:00Z")),
    )
    .await;

    let (status, _) = send(&app, Method::GET, "/releases/export.csv", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = Request::builder()
        .uri("/releases/export.csv")
        .header(header::AUTHORIZATION, format!("Bearer {admin}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"release_notes_"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let mut lines = text.trim_start_matches('\u{feff}').lines();
    assert_eq!(lines.next(), Some("Title,Description,Category,Date,Tags,Labels"));
    assert_eq!(
        lines.next(),
        Some("\"Login \"\"fix\"\"\",\"Details\",\"bugfix\",\"2024-03-19 15:30:00 UTC\",\"\",\"\"")
    );
}

// ============================================================================
// Media
// ============================================================================

fn multipart_request(token: &str, file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/media")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_media_upload_and_cleanup() {
    let (_dir, app, admin, user) = setup().await;

    let (status, body) =
        send_raw(&app, multipart_request(&admin, "shot.png", "image/png", b"\x89PNG fake")).await;
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["data"]["type"], "image");
    let url = body["data"]["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/media/") && url.ends_with(".png"));

    let request = Request::builder().uri(&url).body(Body::empty()).unwrap();
    let (status, bytes) = send_raw(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"\x89PNG fake");

    let (status, _) =
        send_raw(&app, multipart_request(&admin, "notes.txt", "text/plain", b"hello")).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let (status, _) =
        send_raw(&app, multipart_request(&user, "shot.png", "image/png", b"data")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut release = release_body("With screenshot", "2024-03-19T15:30:00Z");
    release["media"] = json!([{ "type": "image", "url": url }]);
    let (_, created) = send(&app, Method::POST, "/releases", Some(&admin), Some(release)).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["media"][0]["url"], url.as_str());

    send(&app, Method::DELETE, &format!("/releases/{id}"), Some(&admin), None).await;

    let request = Request::builder().uri(&url).body(Body::empty()).unwrap();
    let (status, _) = send_raw(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// ClickUp import
// ============================================================================

#[tokio::test]
async fn test_clickup_fetch_and_import() {
    use wiremock::matchers::{header as header_matcher, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list/901/task"))
        .and(header_matcher("Authorization", "pk_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tasks": [{
                "id": "abc",
                "name": "Ship dark mode",
                "description": "Adds a theme toggle",
                "status": { "status": "complete" },
                "due_date": "1710862200000",
                "priority": null
            }],
            "last_page": true
        })))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let app = create_router(test_state_with_clickup(&temp_dir, &server.uri()));
    let admin = register_and_login(&app, "admin", true).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/integrations/clickup/tasks",
        Some(&admin),
        Some(json!({ "api_key": "", "list_id": "901" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, fetched) = send(
        &app,
        Method::POST,
        "/integrations/clickup/tasks",
        Some(&admin),
        Some(json!({ "api_key": "pk_test", "list_id": "901" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let task = fetched["data"]["tasks"][0].clone();
    assert_eq!(task["name"], "Ship dark mode");
    assert_eq!(task["priority"], "none");

    let (status, imported) = send(
        &app,
        Method::POST,
        "/integrations/clickup/import",
        Some(&admin),
        Some(json!({ "task": task })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(imported["data"]["title"], "Ship dark mode");
    assert_eq!(imported["data"]["category"], "feature");
    assert_eq!(imported["data"]["datetime"], "2024-03-19T15:30:00Z");

    let (status, _) = send(
        &app,
        Method::POST,
        "/integrations/clickup/tasks",
        Some(&admin),
        Some(json!({ "api_key": "pk_test", "list_id": "404" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

// ============================================================================
// Internal
// ============================================================================

#[tokio::test]
async fn test_health_and_purge() {
    let (_dir, app, admin, _user) = setup().await;

    let (status, body) = send(&app, Method::GET, "/_internal/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");

    send(
        &app,
        Method::POST,
        "/releases",
        Some(&admin),
        Some(release_body("Doomed", "2024-03-19T15:30:00Z")),
    )
    .await;

    let (status, body) = send(&app, Method::DELETE, "/admin/purge", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["releases_deleted"], 1);
    assert_eq!(body["data"]["users_deleted"], 2);
}
