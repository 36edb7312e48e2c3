//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{authors, books, genres, health, index, instances, languages, loans};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Local Library API",
        version = "1.0.0",
        description = "Library catalog REST API: books, copies, authors and loans"
    ),
    modifiers(&BearerAuth),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Home
        index::index,
        // Books
        books::list_books,
        books::get_book,
        books::create_book_form,
        books::create_book,
        books::update_book_form,
        books::update_book,
        books::delete_book_confirmation,
        books::delete_book,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author_form,
        authors::create_author,
        authors::update_author_form,
        authors::update_author,
        authors::delete_author_confirmation,
        authors::delete_author,
        // Genres
        genres::list_genres,
        genres::get_genre,
        genres::create_genre,
        // Languages
        languages::list_languages,
        languages::create_language,
        // Copies
        instances::create_instance,
        instances::get_instance,
        instances::update_instance,
        // Loans
        loans::my_books,
        loans::all_borrowed,
        loans::renewal_form,
        loans::renew_book,
    ),
    components(
        schemas(
            // Home
            index::IndexResponse,
            crate::models::CatalogSummary,
            // Books
            crate::models::Book,
            crate::models::BookShort,
            crate::models::BookDetails,
            crate::models::BookForm,
            // Authors
            crate::models::Author,
            crate::models::AuthorDetails,
            crate::models::AuthorForm,
            // Genres and languages
            crate::models::Genre,
            crate::models::GenreForm,
            crate::models::Language,
            crate::models::LanguageForm,
            // Copies
            crate::models::BookInstance,
            crate::models::LoanStatus,
            crate::models::CreateBookInstance,
            crate::models::UpdateBookInstance,
            // Loans
            crate::models::LoanEntry,
            crate::services::loans::RenewalForm,
            loans::RenewBookRequest,
            // Deletes
            crate::services::DeleteConfirmation,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Catalog home page"),
        (name = "books", description = "Book management"),
        (name = "authors", description = "Author management"),
        (name = "genres", description = "Genres"),
        (name = "languages", description = "Languages"),
        (name = "instances", description = "Book copies"),
        (name = "loans", description = "Loans and renewals")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
