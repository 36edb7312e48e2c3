//! Business logic services

pub mod authorization;
pub mod authors;
pub mod books;
pub mod catalog;
pub mod loans;
pub mod renewal;
pub mod sessions;

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{config::LoansConfig, error::AppError, repository::Repository};

use authorization::Authorizer;
use sessions::SessionStore;

/// Result of a delete request.
///
/// A delete refused because other records still reference the target is
/// not a failure of the request: the caller is sent back to the
/// confirmation step with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Blocked { reason: String },
}

impl DeleteOutcome {
    /// Turn a restrict violation from the store into `Blocked`
    pub(crate) fn from_store(result: Result<(), AppError>) -> Result<Self, AppError> {
        match result {
            Ok(()) => Ok(DeleteOutcome::Deleted),
            Err(AppError::ConstraintViolation(reason)) => Ok(DeleteOutcome::Blocked { reason }),
            Err(e) => Err(e),
        }
    }
}

/// Delete confirmation page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeleteConfirmation {
    pub id: i32,
    /// Display name of the record to delete
    pub name: String,
    /// Records that must be deleted first
    pub blocked_by: Vec<String>,
    pub can_delete: bool,
}

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub authors: authors::AuthorsService,
    pub books: books::BooksService,
    pub loans: loans::LoansService,
    pub sessions: sessions::SessionService,
}

impl Services {
    /// Create all services over the given repository and collaborators
    pub fn new(
        repository: Repository,
        authorizer: Arc<dyn Authorizer>,
        session_store: Arc<dyn SessionStore>,
        loans_config: &LoansConfig,
    ) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone(), authorizer.clone()),
            authors: authors::AuthorsService::new(repository.clone(), authorizer.clone()),
            books: books::BooksService::new(repository.clone(), authorizer.clone()),
            loans: loans::LoansService::new(
                repository,
                authorizer,
                loans_config.renewal_policy(),
                loans_config.page_size,
            ),
            sessions: sessions::SessionService::new(session_store),
        }
    }
}
