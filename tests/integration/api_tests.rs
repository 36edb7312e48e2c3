//! API integration tests
//!
//! Drive the full router in-process over the in-memory catalog and session
//! stores.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Local};
use serde_json::{json, Value};
use tower::ServiceExt;

use locallibrary_server::{
    api,
    config::AppConfig,
    models::{ActorClaims, Capability},
    repository::Repository,
    services::{authorization::TokenAuthorizer, sessions::MemorySessionStore, Services},
    AppState,
};

struct TestResponse {
    status: StatusCode,
    location: Option<String>,
    set_cookie: Option<String>,
    body: Value,
}

fn app() -> Router {
    let config = AppConfig::default();
    let services = Services::new(
        Repository::in_memory(),
        Arc::new(TokenAuthorizer),
        Arc::new(MemorySessionStore::default()),
        &config.loans,
    );
    api::router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

/// Bearer token for `user_id` holding `capabilities`
fn token(user_id: i32, capabilities: &[Capability]) -> String {
    let secret = AppConfig::default().auth.jwt_secret;
    ActorClaims::new(user_id, &format!("user{}", user_id), capabilities, Duration::hours(1))
        .create_token(&secret)
        .expect("Failed to create token")
}

fn librarian() -> String {
    token(
        1,
        &[
            Capability::MarkReturned,
            Capability::AddAuthor,
            Capability::DeleteAuthor,
            Capability::AddBook,
            Capability::AddGenre,
            Capability::AddLanguage,
            Capability::AddBookInstance,
            Capability::ChangeBookInstance,
        ],
    )
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    cookie: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("Request failed");
    let status = response.status();
    let header_value = |name: header::HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    };
    let location = header_value(header::LOCATION);
    let set_cookie = header_value(header::SET_COOKIE);

    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        location,
        set_cookie,
        body,
    }
}

async fn get(app: &Router, uri: &str, token: Option<&str>) -> TestResponse {
    send(app, "GET", uri, token, None, None).await
}

async fn post(app: &Router, uri: &str, token: &str, body: Value) -> TestResponse {
    send(app, "POST", uri, Some(token), None, Some(body)).await
}

/// Create a genre, a language and a book; return the book id
async fn seed_book(app: &Router, token: &str, isbn: &str, genre: &str, author_id: Option<i64>) -> i64 {
    let genres = get(app, "/catalog/genres/", None).await.body;
    let genre_id = match genres
        .as_array()
        .and_then(|all| all.iter().find(|g| g["name"] == genre))
    {
        Some(g) => g["id"].clone(),
        None => post(app, "/catalog/genre/create/", token, json!({ "name": genre })).await.body["id"].clone(),
    };

    let languages = get(app, "/catalog/languages/", None).await.body;
    let language_id = match languages.as_array().and_then(|all| all.first()) {
        Some(l) => l["id"].clone(),
        None => post(app, "/catalog/language/create/", token, json!({ "name": "English" })).await.body["id"].clone(),
    };

    let created = post(
        app,
        "/catalog/book/create/",
        token,
        json!({
            "title": format!("Book {}", isbn),
            "author_id": author_id,
            "isbn": isbn,
            "genre_ids": [genre_id],
            "language_ids": [language_id],
        }),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    created.body["id"].as_i64().expect("No book id")
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let response = get(&app, "/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");

    let response = get(&app, "/ready", None).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_root_redirects_to_catalog() {
    let app = app();
    let response = get(&app, "/", None).await;
    assert!(response.status.is_redirection());
    assert_eq!(response.location.as_deref(), Some("/catalog/"));
}

#[tokio::test]
async fn test_visit_counter_is_per_session() {
    let app = app();

    let first = get(&app, "/catalog/", None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["num_visits"], 1);
    assert_eq!(first.body["book_count"], 0);

    let cookie = first
        .set_cookie
        .as_deref()
        .and_then(|c| c.split(';').next())
        .expect("No session cookie")
        .to_string();
    assert!(cookie.starts_with("sessionid="));

    for expected in [2, 3] {
        let again = send(&app, "GET", "/catalog/", None, Some(&cookie), None).await;
        assert_eq!(again.body["num_visits"], expected);
        assert!(again.set_cookie.is_none());
    }

    let other = get(&app, "/catalog/", None).await;
    assert_eq!(other.body["num_visits"], 1);
}

#[tokio::test]
async fn test_page_far_beyond_the_end_is_empty() {
    let app = app();
    let staff = librarian();
    seed_book(&app, &staff, "9780000000801", "Poetry", None).await;

    for uri in ["/catalog/books/", "/catalog/authors/", "/catalog/allborrowed/"] {
        let response = get(&app, &format!("{}?page=9223372036854775807", uri), Some(&staff)).await;
        assert_eq!(response.status, StatusCode::OK, "{}", uri);
        assert_eq!(response.body["items"], json!([]), "{}", uri);
    }

    let response = get(&app, "/catalog/books/?page=9223372036854775807", None).await;
    assert_eq!(response.body["total"], 1);
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let app = app();
    let response = get(&app, "/catalog/mybooks/", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = get(&app, "/catalog/mybooks/", Some("not-a-token")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_genre_names_are_unique_ignoring_case() {
    let app = app();
    let token = librarian();

    let response = post(&app, "/catalog/genre/create/", &token, json!({ "name": "Fiction" })).await;
    assert_eq!(response.status, StatusCode::CREATED);

    let response = post(&app, "/catalog/genre/create/", &token, json!({ "name": "fiction" })).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "ConstraintViolation");
}

#[tokio::test]
async fn test_author_delete_flow() {
    let app = app();
    let token = librarian();

    let bob = post(
        &app,
        "/catalog/author/create/",
        &token,
        json!({ "first_name": "Bob", "last_name": "Big" }),
    )
    .await;
    assert_eq!(bob.status, StatusCode::CREATED);
    let bob_id = bob.body["id"].as_i64().unwrap();

    let details = get(&app, &format!("/catalog/author/{}", bob_id), None).await;
    assert_eq!(details.body["display_name"], "Big, Bob");

    let deleted = post(&app, &format!("/catalog/author/{}/delete/", bob_id), &token, json!({})).await;
    assert_eq!(deleted.status, StatusCode::SEE_OTHER);
    assert_eq!(deleted.location.as_deref(), Some("/catalog/authors/"));
    let gone = get(&app, &format!("/catalog/author/{}", bob_id), None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);

    let writer = post(
        &app,
        "/catalog/author/create/",
        &token,
        json!({ "first_name": "Walt", "last_name": "Whitman" }),
    )
    .await;
    let writer_id = writer.body["id"].as_i64().unwrap();
    seed_book(&app, &token, "9780000000501", "Poetry", Some(writer_id)).await;

    let blocked = post(&app, &format!("/catalog/author/{}/delete/", writer_id), &token, json!({})).await;
    assert_eq!(blocked.status, StatusCode::SEE_OTHER);
    assert_eq!(
        blocked.location,
        Some(format!("/catalog/author/{}/delete/", writer_id))
    );

    let confirmation = get(&app, &format!("/catalog/author/{}/delete/", writer_id), Some(&token)).await;
    assert_eq!(confirmation.body["can_delete"], false);
    let still_there = get(&app, &format!("/catalog/author/{}", writer_id), None).await;
    assert_eq!(still_there.status, StatusCode::OK);
}

#[tokio::test]
async fn test_summary_counts_fiction_books() {
    let app = app();
    let token = librarian();

    seed_book(&app, &token, "9780000000601", "Science Fiction", None).await;
    seed_book(&app, &token, "9780000000602", "Poetry", None).await;
    seed_book(&app, &token, "9780000000603", "Poetry", None).await;

    let summary = get(&app, "/catalog/", None).await.body;
    assert_eq!(summary["book_count"], 3);
    assert_eq!(summary["fiction_book_count"], 1);
    assert_eq!(summary["fiction_genre_count"], 1);
}

#[tokio::test]
async fn test_renewal_and_loan_lists() {
    let app = app();
    let staff = librarian();
    let today = Local::now().date_naive();

    let book_id = seed_book(&app, &staff, "9780000000701", "Poetry", None).await;
    let copy = post(
        &app,
        &format!("/catalog/book/{}/instances/", book_id),
        &staff,
        json!({ "imprint": "Penguin, 2001" }),
    )
    .await;
    assert_eq!(copy.status, StatusCode::CREATED);
    assert_eq!(copy.body["status"], "maintenance");
    let copy_id = copy.body["id"].as_str().unwrap().to_string();

    let lent = post(
        &app,
        &format!("/catalog/bookinstance/{}/", copy_id),
        &staff,
        json!({ "status": "on_loan", "borrower_id": 7, "due_back": today.to_string() }),
    )
    .await;
    assert_eq!(lent.status, StatusCode::OK);

    let form = get(&app, &format!("/catalog/book/{}/renew/", copy_id), Some(&staff)).await;
    assert_eq!(form.status, StatusCode::OK);
    assert_eq!(form.body["renewal_date"], (today + Duration::days(21)).to_string());

    let past = post(
        &app,
        &format!("/catalog/book/{}/renew/", copy_id),
        &staff,
        json!({ "renewal_date": (today - Duration::days(1)).to_string() }),
    )
    .await;
    assert_eq!(past.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(past.body["field"], "renewal_date");
    assert_eq!(past.body["message"], "Invalid date - renewal in past");

    let too_far = post(
        &app,
        &format!("/catalog/book/{}/renew/", copy_id),
        &staff,
        json!({ "renewal_date": (today + Duration::days(29)).to_string() }),
    )
    .await;
    assert_eq!(too_far.body["message"], "Invalid date - renewal more than 4 weeks ahead");

    let renewed = post(
        &app,
        &format!("/catalog/book/{}/renew/", copy_id),
        &staff,
        json!({ "renewal_date": (today + Duration::days(7)).to_string() }),
    )
    .await;
    assert_eq!(renewed.status, StatusCode::SEE_OTHER);
    assert_eq!(renewed.location.as_deref(), Some("/catalog/allborrowed/"));

    let borrower = token(7, &[]);
    let mine = get(&app, "/catalog/mybooks/", Some(&borrower)).await;
    assert_eq!(mine.body["total"], 1);
    assert_eq!(mine.body["items"][0]["due_back"], (today + Duration::days(7)).to_string());
    assert_eq!(mine.body["items"][0]["status"], "on_loan");
    assert_eq!(mine.body["items"][0]["is_overdue"], false);

    let someone_else = get(&app, "/catalog/mybooks/", Some(&token(8, &[]))).await;
    assert_eq!(someone_else.body["total"], 0);

    let forbidden = get(&app, "/catalog/allborrowed/", Some(&borrower)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let all = get(&app, "/catalog/allborrowed/", Some(&staff)).await;
    assert_eq!(all.body["total"], 1);
}

#[tokio::test]
async fn test_renewal_requires_mark_returned() {
    let app = app();
    let reader = token(3, &[]);
    let response = send(
        &app,
        "POST",
        &format!("/catalog/book/{}/renew/", uuid::Uuid::new_v4()),
        Some(&reader),
        None,
        Some(json!({ "renewal_date": Local::now().date_naive().to_string() })),
    )
    .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}
