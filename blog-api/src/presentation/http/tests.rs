use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use chrono::{DateTime, FixedOffset};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::application::post_service::TagResolution;
use crate::data::Repositories;
use crate::infrastructure::jwt::JwtService;
use crate::infrastructure::settings::Settings;
use crate::presentation::AppState;
use crate::server::build_app;

const SECRET: &str = "0123456789abcdef0123456789abcdef";
const PASSWORD: &str = "correct-horse-battery";

fn test_settings() -> Settings {
    Settings {
        database_url: None,
        db_max_connections: 1,
        jwt_secret: SECRET.to_string(),
        jwt_ttl_seconds: 3600,
        http_addr: "127.0.0.1:0".to_string(),
        cors_origins: vec!["*".to_string()],
        log_level: "info".to_string(),
        http_request_body_limit_bytes: 16 * 1024,
        http_concurrency_limit: 16,
        http_request_timeout_secs: 120,
        reject_unknown_tags: false,
    }
}

fn test_app() -> Router {
    let jwt = Arc::new(JwtService::new(SECRET, 3600));
    let state = AppState::new(Repositories::in_memory(), jwt, TagResolution::default());
    build_app(state, &test_settings()).expect("app must build")
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
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request must build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body must be readable");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

/// Registers a user and logs in, returning `(user id, token)`.
async fn sign_up(app: &Router, email: &str) -> (i64, String) {
    let (status, user) = send(
        app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({
            "firstName": "Test",
            "lastName": "User",
            "email": email,
            "password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{user}");

    let (status, auth) = send(
        app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{auth}");

    let id = user["id"].as_i64().expect("id");
    let token = auth["accessToken"].as_str().expect("token").to_string();
    (id, token)
}

async fn create_post(app: &Router, token: &str, body: Value) -> Value {
    let (status, post) = send(app, Method::POST, "/api/posts", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{post}");
    post
}

fn timestamp(value: &Value) -> DateTime<FixedOffset> {
    let raw = value.as_str().expect("timestamp is a string");
    DateTime::parse_from_rfc3339(raw).expect("timestamp is RFC 3339")
}

fn sample_post() -> Value {
    json!({
        "title": "Test Post",
        "content": "Test content for the post with more than 10 characters",
        "published": true,
    })
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/healthz", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn created_post_reads_back_unchanged() {
    let app = test_app();
    let (user_id, token) = sign_up(&app, "author@example.com").await;

    let mut body = sample_post();
    body["userId"] = json!(user_id);
    let created = create_post(&app, &token, body).await;

    assert!(created["id"].as_i64().is_some_and(|id| id > 0));
    assert_eq!(created["title"], "Test Post");
    assert_eq!(
        created["content"],
        "Test content for the post with more than 10 characters"
    );
    assert_eq!(created["published"], true);
    assert_eq!(created["userId"], user_id);

    let uri = format!("/api/posts/{}", created["id"]);
    let (status, fetched) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_as_someone_else_is_forbidden() {
    let app = test_app();
    let (_, token) = sign_up(&app, "author@example.com").await;
    let (other_id, _) = sign_up(&app, "other@example.com").await;

    let mut body = sample_post();
    body["userId"] = json!(other_id);
    let (status, _) = send(&app, Method::POST, "/api/posts", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn patch_merges_only_sent_fields() {
    let app = test_app();
    let (_, token) = sign_up(&app, "author@example.com").await;
    let (_, tag) = send(
        &app,
        Method::POST,
        "/api/tags",
        Some(&token),
        Some(json!({ "name": "rust" })),
    )
    .await;

    let mut body = sample_post();
    body["tagIds"] = json!([tag["id"]]);
    let post = create_post(&app, &token, body).await;
    let uri = format!("/api/posts/{}", post["id"]);

    let (status, patched) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({ "title": "Patched title" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["title"], "Patched title");
    assert_eq!(patched["content"], post["content"]);
    assert_eq!(patched["published"], post["published"]);
    assert_eq!(patched["tagIds"], json!([tag["id"]]));

    let (status, cleared) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({ "tagIds": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["tagIds"], json!([]));
    assert_eq!(cleared["title"], "Patched title");
}

#[tokio::test]
async fn patch_null_on_required_field_is_unprocessable() {
    let app = test_app();
    let (_, token) = sign_up(&app, "author@example.com").await;
    let post = create_post(&app, &token, sample_post()).await;
    let uri = format!("/api/posts/{}", post["id"]);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({ "content": null })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"]["content"], "must not be null");
}

#[tokio::test]
async fn other_user_cannot_modify_post() {
    let app = test_app();
    let (_, owner) = sign_up(&app, "owner@example.com").await;
    let (_, intruder) = sign_up(&app, "intruder@example.com").await;
    let post = create_post(&app, &owner, sample_post()).await;
    let uri = format!("/api/posts/{}", post["id"]);

    let replacement = json!({ "title": "Hijacked", "content": "Hijacked content!!" });
    let (status, _) = send(&app, Method::PUT, &uri, Some(&intruder), Some(replacement)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&intruder),
        Some(json!({ "title": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, current) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current, post);
}

#[tokio::test]
async fn anonymous_mutations_are_unauthorized() {
    let app = test_app();
    let (_, token) = sign_up(&app, "owner@example.com").await;
    let post = create_post(&app, &token, sample_post()).await;
    let uri = format!("/api/posts/{}", post["id"]);

    let replacement = json!({ "title": "Anonymous", "content": "Anonymous content" });
    let (status, _) = send(&app, Method::PUT, &uri, None, Some(replacement)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::DELETE, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_bearer_token_is_rejected_even_on_public_routes() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/posts", Some("not-a-jwt"), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "unauthorized" }));
}

#[tokio::test]
async fn deleting_missing_post_is_not_found() {
    let app = test_app();
    let (_, token) = sign_up(&app, "owner@example.com").await;

    let (status, body) = send(&app, Method::DELETE, "/api/posts/9999", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::DELETE, "/api/posts/9999", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = test_app();
    let (_, token) = sign_up(&app, "owner@example.com").await;
    let post = create_post(&app, &token, sample_post()).await;
    let uri = format!("/api/posts/{}", post["id"]);

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_representation_never_leaks_password() {
    let app = test_app();
    let (status, user) = send(
        &app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "password": PASSWORD,
            "birthday": "1815-12-10",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["birthday"], "1815-12-10");

    let keys: Vec<&str> = user
        .as_object()
        .expect("user is an object")
        .keys()
        .map(String::as_str)
        .collect();
    assert!(!keys.iter().any(|key| key.to_lowercase().contains("password")));
    assert!(!user.to_string().contains("argon2"));
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = test_app();
    sign_up(&app, "ada@example.com").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({
            "firstName": "Ada",
            "lastName": "Again",
            "email": "ADA@example.com",
            "password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn registration_validation_reports_fields() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({
            "firstName": " ",
            "lastName": "Lovelace",
            "email": "not-an-email",
            "password": "short",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"]["firstName"], "must not be blank");
    assert_eq!(body["fields"]["email"], "must be a valid email");
    assert_eq!(body["fields"]["password"], "must be 8..128 chars");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = test_app();
    sign_up(&app, "ada@example.com").await;

    for (email, password) in [
        ("ada@example.com", "wrong-password"),
        ("ghost@example.com", PASSWORD),
    ] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid credentials");
    }
}

#[tokio::test]
async fn users_can_only_edit_themselves() {
    let app = test_app();
    let (ada_id, ada) = sign_up(&app, "ada@example.com").await;
    let (_, eve) = sign_up(&app, "eve@example.com").await;
    let uri = format!("/api/users/{ada_id}");

    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&eve),
        Some(json!({ "lastName": "Hacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, patched) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&ada),
        Some(json!({ "lastName": "Byron" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["lastName"], "Byron");
    assert_eq!(patched["firstName"], "Test");

    let (status, _) = send(&app, Method::GET, "/api/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, users) = send(&app, Method::GET, "/api/users", Some(&eve), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn deleting_user_removes_their_posts() {
    let app = test_app();
    let (user_id, token) = sign_up(&app, "ada@example.com").await;
    let post = create_post(&app, &token, sample_post()).await;

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/users/{user_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/posts/{}", post["id"]),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_posts_pages_and_filters() {
    let app = test_app();
    let (_, token) = sign_up(&app, "ada@example.com").await;
    for title in ["First post", "Second post", "Third post"] {
        let mut body = sample_post();
        body["title"] = json!(title);
        create_post(&app, &token, body).await;
    }
    let mut draft = sample_post();
    draft["published"] = json!(false);
    create_post(&app, &token, draft).await;

    let (status, page) = send(
        &app,
        Method::GET,
        "/api/posts?page=1&size=2&sort=title,asc",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalElements"], 3);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["page"], 1);
    assert_eq!(page["size"], 2);
    assert_eq!(page["content"][0]["title"], "First post");
    assert_eq!(page["content"][1]["title"], "Second post");

    let (status, drafts) = send(&app, Method::GET, "/api/posts?published=false", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(drafts["totalElements"], 1);

    let (status, body) = send(&app, Method::GET, "/api/posts?size=500", None, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["size"].is_string());

    let (status, body) = send(&app, Method::GET, "/api/posts?sort=password", None, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["sort"].is_string());
}

#[tokio::test]
async fn tags_lifecycle() {
    let app = test_app();
    let (_, token) = sign_up(&app, "ada@example.com").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/tags",
        None,
        Some(json!({ "name": "rust" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, tag) = send(
        &app,
        Method::POST,
        "/api/tags",
        Some(&token),
        Some(json!({ "name": "rust" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/tags",
        Some(&token),
        Some(json!({ "name": "rust" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let mut body = sample_post();
    body["tagIds"] = json!([tag["id"], 12345]);
    let post = create_post(&app, &token, body).await;
    assert_eq!(post["tagIds"], json!([tag["id"]]));

    let tag_posts_uri = format!("/api/tags/{}/posts", tag["id"]);
    let (status, posts) = send(&app, Method::GET, &tag_posts_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(posts[0]["id"], post["id"]);

    let (status, found) = send(&app, Method::GET, "/api/tags?name=RU", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().map(Vec::len), Some(1));

    let tag_uri = format!("/api/tags/{}", tag["id"]);
    let (status, _) = send(&app, Method::DELETE, &tag_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let post_uri = format!("/api/posts/{}", post["id"]);
    let (_, post) = send(&app, Method::GET, &post_uri, None, None).await;
    assert_eq!(post["tagIds"], json!([]));
}

#[tokio::test]
async fn malformed_json_gets_a_json_error() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request must build");

    let response = app.oneshot(request).await.expect("router is infallible");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body must be readable");
    let body: Value = serde_json::from_slice(&bytes).expect("error body is JSON");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn non_numeric_id_is_a_bad_request() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/posts/abc", None, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = test_app();
    let huge = "x".repeat(32 * 1024);
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/tags",
        None,
        Some(json!({ "name": huge })),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let app = test_app();
    let (status, doc) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let paths = doc["paths"].as_object().expect("paths object");
    for path in [
        "/api/posts",
        "/api/posts/{id}",
        "/api/users/{id}",
        "/api/tags/{id}/posts",
        "/api/login",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }
    assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
}

#[tokio::test]
async fn non_positive_tag_ids_are_dropped() {
    let app = test_app();
    let (_, token) = sign_up(&app, "author@example.com").await;

    let mut body = sample_post();
    body["tagIds"] = json!([0, -5]);
    let post = create_post(&app, &token, body).await;
    assert_eq!(post["tagIds"], json!([]));

    let uri = format!("/api/posts/{}", post["id"]);
    let (status, patched) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({ "tagIds": [-1] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{patched}");
    assert_eq!(patched["tagIds"], json!([]));
}

#[tokio::test]
async fn patch_refreshes_post_updated_at() {
    let app = test_app();
    let (_, token) = sign_up(&app, "author@example.com").await;
    let post = create_post(&app, &token, sample_post()).await;
    let uri = format!("/api/posts/{}", post["id"]);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let (status, patched) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({ "published": false })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["createdAt"], post["createdAt"]);
    assert!(timestamp(&patched["updatedAt"]) > timestamp(&post["updatedAt"]));
}

#[tokio::test]
async fn patch_refreshes_user_updated_at() {
    let app = test_app();
    let (user_id, token) = sign_up(&app, "ada@example.com").await;
    let uri = format!("/api/users/{user_id}");
    let (_, before) = send(&app, Method::GET, &uri, None, None).await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    let (status, patched) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({ "birthday": "1815-12-10" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["createdAt"], before["createdAt"]);
    assert!(timestamp(&patched["updatedAt"]) > timestamp(&before["updatedAt"]));
}
