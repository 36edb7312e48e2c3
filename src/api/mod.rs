//! API handlers for the Local Library REST endpoints

pub mod authors;
pub mod books;
pub mod genres;
pub mod health;
pub mod index;
pub mod instances;
pub mod languages;
pub mod loans;
pub mod openapi;

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::Redirect,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Actor, ActorClaims},
    AppState,
};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "sessionid";

/// Extractor for the authenticated actor from the JWT bearer token
pub struct AuthenticatedUser(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = ActorClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims.into()))
    }
}

/// Browser session, identified by the `sessionid` cookie.
///
/// A session is opened on the first request that carries no cookie; the
/// returned jar sets the cookie when included in the response.
pub struct Session {
    pub id: String,
    jar: CookieJar,
}

impl Session {
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        if let Some(id) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
            return Ok(Session { id, jar });
        }

        let id = Uuid::new_v4().to_string();
        tracing::debug!("Opening session {}", id);
        let jar = jar.add(
            Cookie::build((SESSION_COOKIE, id.clone()))
                .path("/")
                .http_only(true),
        );
        Ok(Session { id, jar })
    }
}

/// Routes under `/catalog`
fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/catalog/", get(index::index))
        .route("/catalog", get(|| async { Redirect::permanent("/catalog/") }))
        // Books
        .route("/catalog/books/", get(books::list_books))
        .route(
            "/catalog/book/create/",
            get(books::create_book_form).post(books::create_book),
        )
        .route("/catalog/book/:id", get(books::get_book))
        .route(
            "/catalog/book/:id/update/",
            get(books::update_book_form).post(books::update_book),
        )
        .route(
            "/catalog/book/:id/delete/",
            get(books::delete_book_confirmation).post(books::delete_book),
        )
        .route("/catalog/book/:id/instances/", post(instances::create_instance))
        .route(
            "/catalog/book/:id/renew/",
            get(loans::renewal_form).post(loans::renew_book),
        )
        // Authors
        .route("/catalog/authors/", get(authors::list_authors))
        .route(
            "/catalog/author/create/",
            get(authors::create_author_form).post(authors::create_author),
        )
        .route("/catalog/author/:id", get(authors::get_author))
        .route(
            "/catalog/author/:id/update/",
            get(authors::update_author_form).post(authors::update_author),
        )
        .route(
            "/catalog/author/:id/delete/",
            get(authors::delete_author_confirmation).post(authors::delete_author),
        )
        // Genres
        .route("/catalog/genres/", get(genres::list_genres))
        .route("/catalog/genre/create/", post(genres::create_genre))
        .route("/catalog/genre/:id", get(genres::get_genre))
        // Languages
        .route("/catalog/languages/", get(languages::list_languages))
        .route("/catalog/language/create/", post(languages::create_language))
        // Copies
        .route(
            "/catalog/bookinstance/:id/",
            get(instances::get_instance).post(instances::update_instance),
        )
        // Loans
        .route("/catalog/mybooks/", get(loans::my_books))
        .route("/catalog/allborrowed/", get(loans::all_borrowed))
}

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(|| async { Redirect::permanent("/catalog/") }))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .merge(catalog_routes())
        .with_state(state);

    app.merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
