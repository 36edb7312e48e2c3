//! Repository layer for catalog storage
//!
//! Each entity has its own repository trait. Two backends implement them:
//! PostgreSQL (`authors`, `books`, ... modules, one per table family) and an
//! in-memory store used by tests and by `storage.backend = "memory"`.
//! Both enforce the uniqueness and restrict-on-delete invariants and report
//! their violation as `AppError::ConstraintViolation`.

pub mod authors;
pub mod books;
pub mod genres;
pub mod instances;
pub mod languages;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Author, AuthorForm, Book, BookForm, BookInstance, Genre, GenreForm, Language,
        LanguageForm, LoanStatus, Page,
    },
};

#[async_trait]
pub trait GenreRepository: Send + Sync {
    /// All genres ordered by name
    async fn list(&self) -> AppResult<Vec<Genre>>;

    async fn get_by_id(&self, id: i32) -> AppResult<Genre>;

    /// Fails with `ConstraintViolation` if the name exists in any letter case
    async fn create(&self, form: &GenreForm) -> AppResult<Genre>;

    /// Number of genres whose name contains `needle`, ignoring case
    async fn count_name_contains(&self, needle: &str) -> AppResult<i64>;
}

#[async_trait]
pub trait LanguageRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Language>>;

    async fn get_by_id(&self, id: i32) -> AppResult<Language>;

    /// Fails with `ConstraintViolation` on an exact duplicate name
    async fn create(&self, form: &LanguageForm) -> AppResult<Language>;
}

#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Authors ordered by (last_name, first_name), with the total count
    async fn list(&self, page: Page) -> AppResult<(Vec<Author>, i64)>;

    async fn get_by_id(&self, id: i32) -> AppResult<Author>;

    async fn create(&self, form: &AuthorForm) -> AppResult<Author>;

    async fn update(&self, id: i32, form: &AuthorForm) -> AppResult<Author>;

    /// Fails with `ConstraintViolation` while any book references the author
    async fn delete(&self, id: i32) -> AppResult<()>;

    async fn count(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Books ordered by id, with the total count
    async fn list(&self, page: Page) -> AppResult<(Vec<Book>, i64)>;

    async fn get_by_id(&self, id: i32) -> AppResult<Book>;

    async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<Book>>;

    /// Fails with `ConstraintViolation` on a duplicate ISBN
    async fn create(&self, form: &BookForm) -> AppResult<Book>;

    async fn update(&self, id: i32, form: &BookForm) -> AppResult<Book>;

    /// Fails with `ConstraintViolation` while any copy references the book
    async fn delete(&self, id: i32) -> AppResult<()>;

    async fn count(&self) -> AppResult<i64>;

    /// Books having at least one genre whose name contains `needle`, ignoring case
    async fn count_with_genre_matching(&self, needle: &str) -> AppResult<i64>;
}

#[async_trait]
pub trait BookInstanceRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance>;

    /// Copies of a book ordered by due_back
    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>>;

    /// Fails with `ConstraintViolation` if the book does not exist
    async fn create(&self, instance: &BookInstance) -> AppResult<BookInstance>;

    /// Persist due_back, status and borrower of an existing copy
    async fn save(&self, instance: &BookInstance) -> AppResult<BookInstance>;

    async fn count(&self) -> AppResult<i64>;

    async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64>;

    /// Copies on loan, optionally restricted to one borrower, ordered by
    /// due_back, each with its book title, plus the total count
    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        page: Page,
    ) -> AppResult<(Vec<(BookInstance, Option<String>)>, i64)>;
}

/// Main repository struct holding one handle per entity
#[derive(Clone)]
pub struct Repository {
    pub genres: Arc<dyn GenreRepository>,
    pub languages: Arc<dyn LanguageRepository>,
    pub authors: Arc<dyn AuthorRepository>,
    pub books: Arc<dyn BookRepository>,
    pub instances: Arc<dyn BookInstanceRepository>,
}

impl Repository {
    /// Create a repository backed by the given PostgreSQL pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            genres: Arc::new(genres::GenresRepository::new(pool.clone())),
            languages: Arc::new(languages::LanguagesRepository::new(pool.clone())),
            authors: Arc::new(authors::AuthorsRepository::new(pool.clone())),
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            instances: Arc::new(instances::InstancesRepository::new(pool)),
        }
    }

    /// Create a repository backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self {
            genres: store.clone(),
            languages: store.clone(),
            authors: store.clone(),
            books: store.clone(),
            instances: store,
        }
    }
}
