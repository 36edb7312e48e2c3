//! Catalog service: home page counts, list and detail reads, and the
//! smaller records (genres, languages, copies)

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        Actor, Author, AuthorDetails, BookDetails, BookInstance, BookShort, Capability,
        CatalogSummary, CreateBookInstance, Genre, GenreForm, Language, LanguageForm, LoanStatus,
        PageQuery, PaginatedResponse, UpdateBookInstance,
    },
    repository::Repository,
};

use super::authorization::{require, Authorizer};

/// Genre name fragment counted on the home page
const FICTION: &str = "fiction";

/// Default page size of book and author lists
const LIST_PAGE_SIZE: i64 = 20;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    authorizer: Arc<dyn Authorizer>,
}

impl CatalogService {
    pub fn new(repository: Repository, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            repository,
            authorizer,
        }
    }

    /// Counts for the home page
    pub async fn summary(&self) -> AppResult<CatalogSummary> {
        Ok(CatalogSummary {
            book_count: self.repository.books.count().await?,
            instance_count: self.repository.instances.count().await?,
            available_instance_count: self
                .repository
                .instances
                .count_by_status(LoanStatus::Available)
                .await?,
            author_count: self.repository.authors.count().await?,
            fiction_genre_count: self.repository.genres.count_name_contains(FICTION).await?,
            fiction_book_count: self
                .repository
                .books
                .count_with_genre_matching(FICTION)
                .await?,
        })
    }

    pub async fn list_books(&self, query: &PageQuery) -> AppResult<PaginatedResponse<BookShort>> {
        let page = query.resolve(LIST_PAGE_SIZE);
        let (books, total) = self.repository.books.list(page).await?;

        let mut authors: HashMap<i32, Author> = HashMap::new();
        let mut items = Vec::with_capacity(books.len());
        for book in &books {
            if let Some(author_id) = book.author_id {
                if !authors.contains_key(&author_id) {
                    let author = self.repository.authors.get_by_id(author_id).await?;
                    authors.insert(author_id, author);
                }
            }
            let author = book.author_id.and_then(|id| authors.get(&id));
            items.push(BookShort::new(book, author));
        }

        Ok(PaginatedResponse::new(items, total, page))
    }

    /// Book with its author and copies
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;
        let author = match book.author_id {
            Some(author_id) => Some(self.repository.authors.get_by_id(author_id).await?),
            None => None,
        };
        let instances = self.repository.instances.list_for_book(id).await?;

        Ok(BookDetails {
            book,
            author,
            instances,
        })
    }

    pub async fn list_authors(&self, query: &PageQuery) -> AppResult<PaginatedResponse<Author>> {
        let page = query.resolve(LIST_PAGE_SIZE);
        let (authors, total) = self.repository.authors.list(page).await?;
        Ok(PaginatedResponse::new(authors, total, page))
    }

    /// Author with the books they wrote
    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetails> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self
            .repository
            .books
            .list_by_author(id)
            .await?
            .iter()
            .map(|b| BookShort::new(b, Some(&author)))
            .collect();

        Ok(AuthorDetails {
            display_name: author.display_name(),
            author,
            books,
        })
    }

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn get_genre(&self, id: i32) -> AppResult<Genre> {
        self.repository.genres.get_by_id(id).await
    }

    pub async fn create_genre(&self, actor: &Actor, form: GenreForm) -> AppResult<Genre> {
        require(self.authorizer.as_ref(), actor, Capability::AddGenre)?;
        form.validate()?;

        let genre = self.repository.genres.create(&form).await?;
        tracing::info!("Genre {} created by {}", genre.name, actor.username);
        Ok(genre)
    }

    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        self.repository.languages.list().await
    }

    pub async fn create_language(&self, actor: &Actor, form: LanguageForm) -> AppResult<Language> {
        require(self.authorizer.as_ref(), actor, Capability::AddLanguage)?;
        form.validate()?;

        let language = self.repository.languages.create(&form).await?;
        tracing::info!("Language {} created by {}", language.name, actor.username);
        Ok(language)
    }

    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.repository.instances.get_by_id(id).await
    }

    /// Register a new copy of a book, in maintenance until made available
    pub async fn create_instance(
        &self,
        actor: &Actor,
        book_id: i32,
        form: CreateBookInstance,
    ) -> AppResult<BookInstance> {
        require(self.authorizer.as_ref(), actor, Capability::AddBookInstance)?;
        form.validate()?;

        let book = self.repository.books.get_by_id(book_id).await?;
        let instance = self
            .repository
            .instances
            .create(&BookInstance::new(book.id, form.imprint))
            .await?;

        tracing::info!(
            "Copy {} registered by {}",
            instance.display_name(&book.title),
            actor.username
        );
        Ok(instance)
    }

    /// Set status, due date or borrower of a copy. Any status may follow any other.
    pub async fn update_instance(
        &self,
        actor: &Actor,
        id: Uuid,
        update: UpdateBookInstance,
    ) -> AppResult<BookInstance> {
        require(self.authorizer.as_ref(), actor, Capability::ChangeBookInstance)?;

        let mut instance = self.repository.instances.get_by_id(id).await?;
        let previous = instance.status;
        update.apply(&mut instance);

        let saved = self.repository.instances.save(&instance).await?;
        if previous != saved.status {
            tracing::info!(
                "Copy {} moved from {} to {} by {}",
                saved.id,
                previous,
                saved.status,
                actor.username
            );
        }
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        models::{AuthorForm, BookForm},
        services::authorization::TokenAuthorizer,
    };

    fn staff() -> Actor {
        Actor::new(
            1,
            "staff",
            vec![
                Capability::AddGenre,
                Capability::AddLanguage,
                Capability::AddBookInstance,
                Capability::ChangeBookInstance,
            ],
        )
    }

    fn service() -> (CatalogService, Repository) {
        let repository = Repository::in_memory();
        (
            CatalogService::new(repository.clone(), Arc::new(TokenAuthorizer)),
            repository,
        )
    }

    async fn add_book(service: &CatalogService, repository: &Repository, isbn: &str, genre: &Genre) -> i32 {
        let language = match repository.languages.list().await.unwrap().into_iter().next() {
            Some(l) => l,
            None => service
                .create_language(&staff(), LanguageForm { name: "English".to_string() })
                .await
                .unwrap(),
        };
        repository
            .books
            .create(&BookForm {
                title: format!("Title {}", isbn),
                isbn: isbn.to_string(),
                genre_ids: vec![genre.id],
                language_ids: vec![language.id],
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_summary_counts_fiction_once_per_book() {
        let (service, repository) = service();
        let sf = service
            .create_genre(&staff(), GenreForm { name: "Science Fiction".to_string() })
            .await
            .unwrap();
        let poetry = service
            .create_genre(&staff(), GenreForm { name: "Poetry".to_string() })
            .await
            .unwrap();

        let dune = add_book(&service, &repository, "9780000000201", &sf).await;
        add_book(&service, &repository, "9780000000202", &poetry).await;
        add_book(&service, &repository, "9780000000203", &poetry).await;

        let copy = service
            .create_instance(&staff(), dune, CreateBookInstance { imprint: "Ace, 1965".to_string() })
            .await
            .unwrap();
        service
            .update_instance(
                &staff(),
                copy.id,
                UpdateBookInstance {
                    status: Some(LoanStatus::Available),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        service
            .create_instance(&staff(), dune, CreateBookInstance { imprint: "Ace, 1990".to_string() })
            .await
            .unwrap();

        let summary = service.summary().await.unwrap();
        assert_eq!(
            summary,
            CatalogSummary {
                book_count: 3,
                instance_count: 2,
                available_instance_count: 1,
                author_count: 0,
                fiction_genre_count: 1,
                fiction_book_count: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_duplicate_genre_in_other_case_is_a_constraint_violation() {
        let (service, _) = service();
        service
            .create_genre(&staff(), GenreForm { name: "Fiction".to_string() })
            .await
            .unwrap();
        let err = service
            .create_genre(&staff(), GenreForm { name: "fiction".to_string() })
            .await
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[tokio::test]
    async fn test_create_genre_requires_capability() {
        let (service, _) = service();
        let reader = Actor::new(2, "reader", vec![]);
        let err = service
            .create_genre(&reader, GenreForm { name: "Poetry".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_new_copy_starts_in_maintenance_and_status_moves_freely() {
        let (service, repository) = service();
        let genre = service
            .create_genre(&staff(), GenreForm { name: "Drama".to_string() })
            .await
            .unwrap();
        let book = add_book(&service, &repository, "9780000000204", &genre).await;

        let copy = service
            .create_instance(&staff(), book, CreateBookInstance { imprint: "Folio".to_string() })
            .await
            .unwrap();
        assert_eq!(copy.status, LoanStatus::Maintenance);

        for status in [LoanStatus::Reserved, LoanStatus::Maintenance, LoanStatus::OnLoan] {
            let saved = service
                .update_instance(
                    &staff(),
                    copy.id,
                    UpdateBookInstance {
                        status: Some(status),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            assert_eq!(saved.status, status);
        }
    }

    #[tokio::test]
    async fn test_author_details_list_their_books() {
        let (service, repository) = service();
        let author = repository
            .authors
            .create(&AuthorForm {
                first_name: "Bob".to_string(),
                last_name: "Big".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let genre = service
            .create_genre(&staff(), GenreForm { name: "Humour".to_string() })
            .await
            .unwrap();
        let book_id = add_book(&service, &repository, "9780000000205", &genre).await;
        let mut form = BookForm::from(&repository.books.get_by_id(book_id).await.unwrap());
        form.author_id = Some(author.id);
        repository.books.update(book_id, &form).await.unwrap();

        let details = service.get_author(author.id).await.unwrap();
        assert_eq!(details.display_name, "Big, Bob");
        assert_eq!(details.books.len(), 1);
        assert_eq!(details.books[0].author.as_deref(), Some("Big, Bob"));

        let books = service.list_books(&PageQuery::default()).await.unwrap();
        assert_eq!(books.total, 1);
        assert_eq!(books.items[0].genre, "Humour");
    }
}
