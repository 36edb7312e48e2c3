//! Book maintenance: create, edit and delete

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{Actor, Book, BookForm, Capability},
    repository::Repository,
};

use super::{
    authorization::{require, Authorizer},
    DeleteConfirmation, DeleteOutcome,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    authorizer: Arc<dyn Authorizer>,
}

impl BooksService {
    pub fn new(repository: Repository, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            repository,
            authorizer,
        }
    }

    /// Check the form fields and that every referenced record exists
    async fn check_form(&self, form: &BookForm) -> AppResult<()> {
        form.validate()?;

        if let Some(author_id) = form.author_id {
            match self.repository.authors.get_by_id(author_id).await {
                Ok(_) => {}
                Err(AppError::NotFound(_)) => {
                    return Err(AppError::validation(
                        "author_id",
                        format!("Unknown author {}", author_id),
                    ))
                }
                Err(e) => return Err(e),
            }
        }

        for id in &form.genre_ids {
            match self.repository.genres.get_by_id(*id).await {
                Ok(_) => {}
                Err(AppError::NotFound(_)) => {
                    return Err(AppError::validation("genre_ids", format!("Unknown genre {}", id)))
                }
                Err(e) => return Err(e),
            }
        }

        for id in &form.language_ids {
            match self.repository.languages.get_by_id(*id).await {
                Ok(_) => {}
                Err(AppError::NotFound(_)) => {
                    return Err(AppError::validation(
                        "language_ids",
                        format!("Unknown language {}", id),
                    ))
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    pub async fn create(&self, actor: &Actor, form: BookForm) -> AppResult<Book> {
        require(self.authorizer.as_ref(), actor, Capability::AddBook)?;
        self.check_form(&form).await?;

        let book = self.repository.books.create(&form).await?;
        tracing::info!("Book {} ({}) created by {}", book.title, book.isbn, actor.username);
        Ok(book)
    }

    /// Blank creation form
    pub fn create_form(&self, actor: &Actor) -> AppResult<BookForm> {
        require(self.authorizer.as_ref(), actor, Capability::AddBook)?;
        Ok(BookForm::default())
    }

    /// Edit form prefilled with the current values
    pub async fn edit_form(&self, actor: &Actor, id: i32) -> AppResult<BookForm> {
        require(self.authorizer.as_ref(), actor, Capability::ChangeBook)?;
        let book = self.repository.books.get_by_id(id).await?;
        Ok(BookForm::from(&book))
    }

    pub async fn update(&self, actor: &Actor, id: i32, form: BookForm) -> AppResult<Book> {
        require(self.authorizer.as_ref(), actor, Capability::ChangeBook)?;
        self.repository.books.get_by_id(id).await?;
        self.check_form(&form).await?;

        let book = self.repository.books.update(id, &form).await?;
        tracing::info!("Book {} updated by {}", id, actor.username);
        Ok(book)
    }

    /// What deleting the book would involve; its copies prevent it
    pub async fn delete_confirmation(&self, actor: &Actor, id: i32) -> AppResult<DeleteConfirmation> {
        require(self.authorizer.as_ref(), actor, Capability::DeleteBook)?;

        let book = self.repository.books.get_by_id(id).await?;
        let blocked_by: Vec<String> = self
            .repository
            .instances
            .list_for_book(id)
            .await?
            .iter()
            .map(|copy| copy.display_name(&book.title))
            .collect();

        Ok(DeleteConfirmation {
            id,
            name: book.title,
            can_delete: blocked_by.is_empty(),
            blocked_by,
        })
    }

    pub async fn delete(&self, actor: &Actor, id: i32) -> AppResult<DeleteOutcome> {
        require(self.authorizer.as_ref(), actor, Capability::DeleteBook)?;

        let outcome = DeleteOutcome::from_store(self.repository.books.delete(id).await)?;
        match &outcome {
            DeleteOutcome::Deleted => tracing::info!("Book {} deleted by {}", id, actor.username),
            DeleteOutcome::Blocked { reason } => {
                tracing::warn!("Book {} not deleted: {}", id, reason)
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{book::DEFAULT_SUMMARY, BookInstance, Genre, GenreForm, Language, LanguageForm},
        services::authorization::TokenAuthorizer,
    };

    fn librarian() -> Actor {
        Actor::new(
            1,
            "librarian",
            vec![Capability::AddBook, Capability::ChangeBook, Capability::DeleteBook],
        )
    }

    async fn setup() -> (BooksService, Repository, Genre, Language) {
        let repository = Repository::in_memory();
        let genre = repository
            .genres
            .create(&GenreForm { name: "Fantasy".to_string() })
            .await
            .unwrap();
        let language = repository
            .languages
            .create(&LanguageForm { name: "English".to_string() })
            .await
            .unwrap();
        let service = BooksService::new(repository.clone(), Arc::new(TokenAuthorizer));
        (service, repository, genre, language)
    }

    fn form(isbn: &str, genre: &Genre, language: &Language) -> BookForm {
        BookForm {
            title: "The Hobbit".to_string(),
            isbn: isbn.to_string(),
            genre_ids: vec![genre.id],
            language_ids: vec![language.id],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_book_with_defaults() {
        let (service, _, genre, language) = setup().await;
        let book = service
            .create(&librarian(), form("9780000000401", &genre, &language))
            .await
            .unwrap();

        assert_eq!(book.summary, DEFAULT_SUMMARY);
        assert_eq!(book.display_genre(), "Fantasy");
        assert_eq!(book.display_language(), "English");
        assert_eq!(book.absolute_url(), format!("/catalog/book/{}", book.id));
    }

    #[tokio::test]
    async fn test_create_requires_genre_and_language() {
        let (service, _, genre, language) = setup().await;

        let mut no_genre = form("9780000000402", &genre, &language);
        no_genre.genre_ids.clear();
        let err = service.create(&librarian(), no_genre).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "genre_ids"));

        let mut no_language = form("9780000000402", &genre, &language);
        no_language.language_ids.clear();
        let err = service.create(&librarian(), no_language).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "language_ids"));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_references() {
        let (service, _, genre, language) = setup().await;

        let mut bad_author = form("9780000000403", &genre, &language);
        bad_author.author_id = Some(999);
        let err = service.create(&librarian(), bad_author).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "author_id"));

        let mut bad_genre = form("9780000000403", &genre, &language);
        bad_genre.genre_ids.push(999);
        let err = service.create(&librarian(), bad_genre).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "genre_ids"));
    }

    #[tokio::test]
    async fn test_isbn_must_be_unique_and_thirteen_characters() {
        let (service, _, genre, language) = setup().await;
        service
            .create(&librarian(), form("9780000000404", &genre, &language))
            .await
            .unwrap();

        let err = service
            .create(&librarian(), form("9780000000404", &genre, &language))
            .await
            .unwrap_err();
        assert!(err.is_constraint_violation());

        let err = service
            .create(&librarian(), form("12345", &genre, &language))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "isbn"));
    }

    #[tokio::test]
    async fn test_update_keeps_own_isbn() {
        let (service, _, genre, language) = setup().await;
        let book = service
            .create(&librarian(), form("9780000000405", &genre, &language))
            .await
            .unwrap();

        let mut edit = service.edit_form(&librarian(), book.id).await.unwrap();
        edit.title = "The Hobbit, or There and Back Again".to_string();
        let updated = service.update(&librarian(), book.id, edit).await.unwrap();

        assert_eq!(updated.title, "The Hobbit, or There and Back Again");
        assert_eq!(updated.isbn, "9780000000405");
    }

    #[tokio::test]
    async fn test_delete_is_blocked_while_copies_exist() {
        let (service, repository, genre, language) = setup().await;
        let book = service
            .create(&librarian(), form("9780000000406", &genre, &language))
            .await
            .unwrap();
        let copy = repository
            .instances
            .create(&BookInstance::new(book.id, "Allen & Unwin, 1937"))
            .await
            .unwrap();

        let confirmation = service.delete_confirmation(&librarian(), book.id).await.unwrap();
        assert!(!confirmation.can_delete);
        assert_eq!(
            confirmation.blocked_by,
            vec![format!("{} (The Hobbit)", copy.id)]
        );

        let outcome = service.delete(&librarian(), book.id).await.unwrap();
        assert!(matches!(outcome, DeleteOutcome::Blocked { .. }));
        assert!(repository.books.get_by_id(book.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_book_without_copies() {
        let (service, repository, genre, language) = setup().await;
        let book = service
            .create(&librarian(), form("9780000000407", &genre, &language))
            .await
            .unwrap();

        assert_eq!(service.delete(&librarian(), book.id).await.unwrap(), DeleteOutcome::Deleted);
        assert!(matches!(
            repository.books.get_by_id(book.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
