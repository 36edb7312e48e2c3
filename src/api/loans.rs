//! Loan endpoints: loan lists and renewal

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{LoanEntry, PageQuery, PaginatedResponse},
    services::loans::RenewalForm,
    AppState,
};

use super::AuthenticatedUser;

/// Renewal request
#[derive(Deserialize, ToSchema)]
pub struct RenewBookRequest {
    /// Enter a date between now and 4 weeks (default 3).
    pub renewal_date: NaiveDate,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Copies on loan to the current user
#[utoipa::path(
    get,
    path = "/catalog/mybooks/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Own loans, soonest due first", body = PaginatedResponse<LoanEntry>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn my_books(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<LoanEntry>>> {
    let loans = state.services.loans.loans_for_user(&actor, &query, today()).await?;
    Ok(Json(loans))
}

/// Every copy on loan
#[utoipa::path(
    get,
    path = "/catalog/allborrowed/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "All loans, soonest due first", body = PaginatedResponse<LoanEntry>),
        (status = 403, description = "Missing catalog.can_mark_returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn all_borrowed(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<LoanEntry>>> {
    let loans = state.services.loans.all_outstanding_loans(&actor, &query, today()).await?;
    Ok(Json(loans))
}

/// Renewal form with the proposed due date
#[utoipa::path(
    get,
    path = "/catalog/book/{id}/renew/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    responses(
        (status = 200, description = "Renewal form", body = RenewalForm),
        (status = 403, description = "Missing catalog.can_mark_returned", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn renewal_form(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalForm>> {
    let form = state.services.loans.renewal_form(&actor, id, today()).await?;
    Ok(Json(form))
}

/// Renew a loan
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/renew/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Copy ID")
    ),
    request_body = RenewBookRequest,
    responses(
        (status = 303, description = "Renewed, redirect to all borrowed books"),
        (status = 403, description = "Missing catalog.can_mark_returned", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Date in the past or more than 4 weeks ahead", body = crate::error::ErrorResponse)
    )
)]
pub async fn renew_book(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RenewBookRequest>,
) -> AppResult<Redirect> {
    state
        .services
        .loans
        .renew(&actor, id, request.renewal_date, today())
        .await?;
    Ok(Redirect::to("/catalog/allborrowed/"))
}
