//! Home page endpoint

use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::CatalogSummary, AppState};

use super::Session;

/// Home page: catalog counts and the visitor's running visit count
#[derive(Serialize, ToSchema)]
pub struct IndexResponse {
    #[serde(flatten)]
    pub summary: CatalogSummary,
    /// Visits of the home page in this session, this one included
    pub num_visits: i64,
}

/// Catalog home page
#[utoipa::path(
    get,
    path = "/catalog/",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog counts and visit counter", body = IndexResponse)
    )
)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<(CookieJar, Json<IndexResponse>)> {
    let summary = state.services.catalog.summary().await?;
    let num_visits = state.services.sessions.visit_counter(&session.id).await?;

    Ok((session.into_jar(), Json(IndexResponse { summary, num_visits })))
}
