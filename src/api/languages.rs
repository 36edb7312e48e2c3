//! Language endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{Language, LanguageForm},
    AppState,
};

use super::AuthenticatedUser;

/// List languages
#[utoipa::path(
    get,
    path = "/catalog/languages/",
    tag = "languages",
    responses(
        (status = 200, description = "All languages by name", body = Vec<Language>)
    )
)]
pub async fn list_languages(State(state): State<AppState>) -> AppResult<Json<Vec<Language>>> {
    let languages = state.services.catalog.list_languages().await?;
    Ok(Json(languages))
}

/// Create a language
#[utoipa::path(
    post,
    path = "/catalog/language/create/",
    tag = "languages",
    security(("bearer_auth" = [])),
    request_body = LanguageForm,
    responses(
        (status = 201, description = "Language created", body = Language),
        (status = 403, description = "Missing catalog.add_language", body = crate::error::ErrorResponse),
        (status = 409, description = "Language exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_language(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(form): Json<LanguageForm>,
) -> AppResult<(StatusCode, Json<Language>)> {
    let language = state.services.catalog.create_language(&actor, form).await?;
    Ok((StatusCode::CREATED, Json(language)))
}
