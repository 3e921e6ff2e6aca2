//! HTTP-level tests for the notes API.
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`, covering
//! registration, login, bearer authentication and owner-scoped note access.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use notes_core::{LocalStore, NotesConfig, NotesService, PasswordConfig};
use notes_service::{
    AppState,
    notes::{NoteListResponse, NoteResponse},
    router,
    users::{IdentityResponse, LoginResponse},
};
use serde_json::{Value, json};
use tower::ServiceExt;

// ============================================================================
// Helpers
// ============================================================================

fn app() -> Router {
    let config = NotesConfig {
        passwords: PasswordConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        },
        ..NotesConfig::default()
    };
    let service = NotesService::with_local_store(Arc::new(LocalStore::in_memory()), &config)
        .expect("Failed to build service");
    router(AppState::new(service))
}

struct TestResponse {
    status: StatusCode,
    headers: header::HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Response body is not the expected JSON")
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    send_request(app, request).await
}

async fn send_request(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Router failed");
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body")
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

async fn register_and_login(app: &Router, username: &str, password: &str) -> String {
    let response = send(
        app,
        Method::POST,
        "/api/register/",
        None,
        Some(json!({"username": username, "password": password, "email": format!("{}@example.com", username)})),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let response = send(
        app,
        Method::POST,
        "/api/login/",
        None,
        Some(json!({"username": username, "password": password})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    response.json::<LoginResponse>().token
}

async fn create_note(app: &Router, token: &str, title: &str, content: &str) -> NoteResponse {
    let response = send(
        app,
        Method::POST,
        "/api/notes/",
        Some(token),
        Some(json!({"title": title, "content": content})),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.json()
}

// ============================================================================
// Registration and login
// ============================================================================

#[tokio::test]
async fn test_register_success() {
    let app = app();
    let response = send(
        &app,
        Method::POST,
        "/api/register/",
        None,
        Some(json!({"username": "newuser", "password": "newpassword", "email": "newuser@example.com"})),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let identity: IdentityResponse = response.json();
    assert_eq!(identity.username, "newuser");
    assert_eq!(identity.email, "newuser@example.com");

    let raw: Value = response.json();
    assert!(raw.get("password").is_none());
    assert!(raw.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_invalid_data() {
    let app = app();
    let response = send(
        &app,
        Method::POST,
        "/api/register/",
        None,
        Some(json!({"username": "newuser", "password": ""})),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let errors: Value = response.json();
    assert!(errors.get("password").is_some());
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = app();
    register_and_login(&app, "alice", "pw1").await;

    let response = send(
        &app,
        Method::POST,
        "/api/register/",
        None,
        Some(json!({"username": "alice", "password": "other"})),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let errors: Value = response.json();
    assert!(errors.get("username").is_some());
}

#[tokio::test]
async fn test_login_returns_same_token_twice() {
    let app = app();
    let first = register_and_login(&app, "alice", "pw1").await;

    let response = send(
        &app,
        Method::POST,
        "/api/login/",
        None,
        Some(json!({"username": "alice", "password": "pw1"})),
    )
    .await;
    assert_eq!(response.json::<LoginResponse>().token, first);
}

#[tokio::test]
async fn test_login_failure_is_generic() {
    let app = app();
    register_and_login(&app, "testuser", "12345").await;

    let wrong_password = send(
        &app,
        Method::POST,
        "/api/login/",
        None,
        Some(json!({"username": "testuser", "password": "wrongpassword"})),
    )
    .await;
    let unknown_user = send(
        &app,
        Method::POST,
        "/api/login/",
        None,
        Some(json!({"username": "nobody", "password": "12345"})),
    )
    .await;

    assert_eq!(wrong_password.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown_user.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_password.body, unknown_user.body);
    assert!(wrong_password.json::<Value>().get("token").is_none());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/login/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = send_request(&app, request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>().get("detail").is_some());
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_missing_header_is_unauthorized() {
    let app = app();
    let response = send(&app, Method::GET, "/api/notes/", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers.get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
}

#[tokio::test]
async fn test_wrong_keyword_and_unknown_token_look_the_same() {
    let app = app();
    let token = register_and_login(&app, "alice", "pw1").await;

    let mut bodies = Vec::new();
    for value in [
        "Token abc".to_string(),
        format!("Token {}", token),
        "Bearer abc".to_string(),
        "Bearer".to_string(),
    ] {
        let request = Request::builder()
            .uri("/api/notes/")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap();
        let response = send_request(&app, request).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        bodies.push(response.body);
    }

    let no_header = send(&app, Method::GET, "/api/notes/", None, None).await;
    bodies.push(no_header.body);
    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = app();
    let token = register_and_login(&app, "alice", "pw1").await;

    let response = send(&app, Method::POST, "/api/logout/", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = send(&app, Method::GET, "/api/notes/", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delete_account_cascades() {
    let app = app();
    let token = register_and_login(&app, "alice", "pw1").await;
    create_note(&app, &token, "T", "C").await;

    let response = send(&app, Method::DELETE, "/api/account/", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = send(&app, Method::GET, "/api/notes/", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // The username is free again and the new account starts empty
    let token = register_and_login(&app, "alice", "pw1").await;
    let response = send(&app, Method::GET, "/api/notes/", Some(&token), None).await;
    assert_eq!(response.json::<NoteListResponse>().count, 0);
}

// ============================================================================
// Notes
// ============================================================================

#[tokio::test]
async fn test_create_and_list_notes() {
    let app = app();
    let token = register_and_login(&app, "testuser", "12345").await;
    for i in 1..=3 {
        create_note(&app, &token, &format!("Test Note{}", i), &format!("This is test note {}.", i)).await;
    }

    let response = send(&app, Method::GET, "/api/notes/", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    let list: NoteListResponse = response.json();
    assert_eq!(list.count, 3);
    assert_eq!(list.results.len(), 3);
}

#[tokio::test]
async fn test_search_notes() {
    let app = app();
    let token = register_and_login(&app, "testuser", "12345").await;
    for i in 1..=3 {
        create_note(&app, &token, &format!("Test Note{}", i), &format!("This is test note {}.", i)).await;
    }

    let response = send(&app, Method::GET, "/api/notes/?search=Note1", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    let list: NoteListResponse = response.json();
    assert_eq!(list.results.len(), 1);
    assert!(list.results[0].title.contains("Note1"));
}

#[tokio::test]
async fn test_create_ignores_client_supplied_owner() {
    let app = app();
    let alice = register_and_login(&app, "alice", "pw1").await;
    let bob = register_and_login(&app, "bob", "pw2").await;

    let bob_id = {
        let note = create_note(&app, &bob, "mine", "bob's").await;
        note.user
    };

    let response = send(
        &app,
        Method::POST,
        "/api/notes/",
        Some(&alice),
        Some(json!({"title": "Planted", "content": "for bob", "user": bob_id})),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let note: NoteResponse = response.json();
    assert_ne!(note.user, bob_id);

    let response = send(&app, Method::GET, "/api/notes/", Some(&bob), None).await;
    assert_eq!(response.json::<NoteListResponse>().count, 1);
}

#[tokio::test]
async fn test_create_requires_fields() {
    let app = app();
    let token = register_and_login(&app, "alice", "pw1").await;

    let response = send(&app, Method::POST, "/api/notes/", Some(&token), Some(json!({}))).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let errors: Value = response.json();
    assert!(errors.get("title").is_some());
    assert!(errors.get("content").is_some());
}

#[tokio::test]
async fn test_update_note() {
    let app = app();
    let token = register_and_login(&app, "testuser", "12345").await;
    let note = create_note(&app, &token, "Original Title", "Original content.").await;
    let uri = format!("/api/notes/{}/", note.id);

    let response = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({"title": "Updated Title", "content": "Updated content."})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    let updated: NoteResponse = response.json();
    assert_eq!(updated.title, "Updated Title");
    assert_eq!(updated.created, note.created);
    assert!(updated.updated >= note.updated);

    let response = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(response.json::<NoteResponse>().title, "Updated Title");
}

#[tokio::test]
async fn test_partial_update_note() {
    let app = app();
    let token = register_and_login(&app, "alice", "pw1").await;
    let note = create_note(&app, &token, "Keep me", "Old body").await;

    let response = send(
        &app,
        Method::PATCH,
        &format!("/api/notes/{}/", note.id),
        Some(&token),
        Some(json!({"content": "New body"})),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let patched: NoteResponse = response.json();
    assert_eq!(patched.title, "Keep me");
    assert_eq!(patched.content, "New body");
}

#[tokio::test]
async fn test_delete_note() {
    let app = app();
    let token = register_and_login(&app, "testuser", "12345").await;
    let note = create_note(&app, &token, "Note to be deleted", "Content of the note.").await;
    let uri = format!("/api/notes/{}/", note.id);

    let response = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_other_users_notes_are_not_found() {
    let app = app();
    let alice = register_and_login(&app, "alice", "pw1").await;
    let bob = register_and_login(&app, "bob", "pw2").await;
    let note = create_note(&app, &alice, "Secret", "alice only").await;
    let uri = format!("/api/notes/{}/", note.id);

    let missing = send(&app, Method::GET, "/api/notes/999999/", Some(&bob), None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let attempts = [
        send(&app, Method::GET, &uri, Some(&bob), None).await,
        send(
            &app,
            Method::PUT,
            &uri,
            Some(&bob),
            Some(json!({"title": "Hacked", "content": "bob was here"})),
        )
        .await,
        send(
            &app,
            Method::PATCH,
            &uri,
            Some(&bob),
            Some(json!({"title": "Hacked"})),
        )
        .await,
        send(&app, Method::DELETE, &uri, Some(&bob), None).await,
    ];
    for attempt in attempts {
        assert_eq!(attempt.status, StatusCode::NOT_FOUND);
        assert_eq!(attempt.body, missing.body);
    }

    let response = send(&app, Method::GET, &uri, Some(&alice), None).await;
    let unchanged: NoteResponse = response.json();
    assert_eq!(unchanged.title, "Secret");
    assert_eq!(unchanged.content, "alice only");

    let response = send(&app, Method::GET, "/api/notes/", Some(&bob), None).await;
    assert_eq!(response.json::<NoteListResponse>().count, 0);
}

#[tokio::test]
async fn test_non_numeric_id_is_not_found() {
    let app = app();
    let token = register_and_login(&app, "alice", "pw1").await;

    let response = send(&app, Method::GET, "/api/notes/abc/", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let response = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"ok");
}
