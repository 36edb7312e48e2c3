//! Author maintenance: create, edit and delete

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::AppResult,
    models::{Actor, Author, AuthorForm, Capability},
    repository::Repository,
};

use super::{
    authorization::{require, Authorizer},
    DeleteConfirmation, DeleteOutcome,
};

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
    authorizer: Arc<dyn Authorizer>,
}

impl AuthorsService {
    pub fn new(repository: Repository, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            repository,
            authorizer,
        }
    }

    pub async fn create(&self, actor: &Actor, form: AuthorForm) -> AppResult<Author> {
        require(self.authorizer.as_ref(), actor, Capability::AddAuthor)?;
        form.validate()?;

        let author = self.repository.authors.create(&form).await?;
        tracing::info!("Author {} created by {}", author, actor.username);
        Ok(author)
    }

    /// Blank creation form
    pub fn create_form(&self, actor: &Actor) -> AppResult<AuthorForm> {
        require(self.authorizer.as_ref(), actor, Capability::AddAuthor)?;
        Ok(AuthorForm::default())
    }

    /// Edit form prefilled with the current values
    pub async fn edit_form(&self, actor: &Actor, id: i32) -> AppResult<AuthorForm> {
        require(self.authorizer.as_ref(), actor, Capability::ChangeAuthor)?;
        let author = self.repository.authors.get_by_id(id).await?;
        Ok(AuthorForm::from(&author))
    }

    pub async fn update(&self, actor: &Actor, id: i32, form: AuthorForm) -> AppResult<Author> {
        require(self.authorizer.as_ref(), actor, Capability::ChangeAuthor)?;
        form.validate()?;

        let author = self.repository.authors.update(id, &form).await?;
        tracing::info!("Author {} updated by {}", id, actor.username);
        Ok(author)
    }

    /// What deleting the author would involve; books still attributed to
    /// them prevent it
    pub async fn delete_confirmation(&self, actor: &Actor, id: i32) -> AppResult<DeleteConfirmation> {
        require(self.authorizer.as_ref(), actor, Capability::DeleteAuthor)?;

        let author = self.repository.authors.get_by_id(id).await?;
        let blocked_by: Vec<String> = self
            .repository
            .books
            .list_by_author(id)
            .await?
            .into_iter()
            .map(|b| b.title)
            .collect();

        Ok(DeleteConfirmation {
            id,
            name: author.display_name(),
            can_delete: blocked_by.is_empty(),
            blocked_by,
        })
    }

    pub async fn delete(&self, actor: &Actor, id: i32) -> AppResult<DeleteOutcome> {
        require(self.authorizer.as_ref(), actor, Capability::DeleteAuthor)?;

        let outcome = DeleteOutcome::from_store(self.repository.authors.delete(id).await)?;
        match &outcome {
            DeleteOutcome::Deleted => tracing::info!("Author {} deleted by {}", id, actor.username),
            DeleteOutcome::Blocked { reason } => {
                tracing::warn!("Author {} not deleted: {}", id, reason)
            }
        }
        Ok(outcome)
    }
}
