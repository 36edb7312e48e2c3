//! Book copy endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{BookInstance, CreateBookInstance, UpdateBookInstance},
    AppState,
};

use super::AuthenticatedUser;

/// Register a copy of a book
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/instances/",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = CreateBookInstance,
    responses(
        (status = 201, description = "Copy created, in maintenance", body = BookInstance),
        (status = 403, description = "Missing catalog.add_bookinstance", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_instance(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(book_id): Path<i32>,
    Json(form): Json<CreateBookInstance>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    let instance = state.services.catalog.create_instance(&actor, book_id, form).await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

/// Get a copy
#[utoipa::path(
    get,
    path = "/catalog/bookinstance/{id}/",
    tag = "instances",
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    responses(
        (status = 200, description = "Copy", body = BookInstance),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_instance(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<BookInstance>> {
    let instance = state.services.catalog.get_instance(id).await?;
    Ok(Json(instance))
}

/// Change status, due date or borrower of a copy
#[utoipa::path(
    post,
    path = "/catalog/bookinstance/{id}/",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    request_body = UpdateBookInstance,
    responses(
        (status = 200, description = "Copy updated", body = BookInstance),
        (status = 403, description = "Missing catalog.change_bookinstance", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_instance(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(update): Json<UpdateBookInstance>,
) -> AppResult<Json<BookInstance>> {
    let instance = state.services.catalog.update_instance(&actor, id, update).await?;
    Ok(Json(instance))
}
