//! In-memory catalog store
//!
//! Mirrors the PostgreSQL schema constraints in code: case-insensitive genre
//! names, unique language names and ISBNs, foreign keys on every reference
//! and RESTRICT on author and book deletion. All operations run under one
//! async mutex, which gives each of them the atomicity of a transaction.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        genre::name_matches, Author, AuthorForm, Book, BookForm, BookInstance, Genre, GenreForm,
        Language, LanguageForm, LoanStatus, Page,
    },
};

use super::{
    AuthorRepository, BookInstanceRepository, BookRepository, GenreRepository, LanguageRepository,
};

#[derive(Debug, Clone)]
struct BookRecord {
    id: i32,
    title: String,
    author_id: Option<i32>,
    summary: String,
    isbn: String,
    genre_ids: Vec<i32>,
    language_ids: Vec<i32>,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i32,
    genres: BTreeMap<i32, Genre>,
    languages: BTreeMap<i32, Language>,
    authors: BTreeMap<i32, Author>,
    books: BTreeMap<i32, BookRecord>,
    instances: HashMap<Uuid, BookInstance>,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn resolve(&self, record: &BookRecord) -> Book {
        Book {
            id: record.id,
            title: record.title.clone(),
            author_id: record.author_id,
            summary: record.summary.clone(),
            isbn: record.isbn.clone(),
            genres: record
                .genre_ids
                .iter()
                .filter_map(|id| self.genres.get(id).cloned())
                .collect(),
            languages: record
                .language_ids
                .iter()
                .filter_map(|id| self.languages.get(id).cloned())
                .collect(),
        }
    }

    /// Check the foreign keys and the ISBN uniqueness of a book form
    fn check_book(&self, form: &BookForm, book_id: Option<i32>) -> AppResult<()> {
        if let Some(author_id) = form.author_id {
            if !self.authors.contains_key(&author_id) {
                return Err(AppError::ConstraintViolation(format!(
                    "Author {} does not exist",
                    author_id
                )));
            }
        }
        if let Some(id) = form.genre_ids.iter().find(|id| !self.genres.contains_key(id)) {
            return Err(AppError::ConstraintViolation(format!("Genre {} does not exist", id)));
        }
        if let Some(id) = form.language_ids.iter().find(|id| !self.languages.contains_key(id)) {
            return Err(AppError::ConstraintViolation(format!("Language {} does not exist", id)));
        }
        if self
            .books
            .values()
            .any(|b| b.isbn == form.isbn && Some(b.id) != book_id)
        {
            return Err(AppError::ConstraintViolation(format!(
                "A book with ISBN {} already exists",
                form.isbn
            )));
        }
        Ok(())
    }

    fn record_from_form(id: i32, form: &BookForm) -> BookRecord {
        BookRecord {
            id,
            title: form.title.clone(),
            author_id: form.author_id,
            summary: form.summary.clone(),
            isbn: form.isbn.clone(),
            genre_ids: dedup(&form.genre_ids),
            language_ids: dedup(&form.language_ids),
        }
    }
}

fn dedup(ids: &[i32]) -> Vec<i32> {
    let mut out: Vec<i32> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out.sort_unstable();
    out
}

/// due_back ascending with undated copies last, then id
fn by_due_back(a: &BookInstance, b: &BookInstance) -> Ordering {
    match (a.due_back, b.due_back) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[async_trait]
impl GenreRepository for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Genre>> {
        let state = self.state.lock().await;
        let mut genres: Vec<Genre> = state.genres.values().cloned().collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(genres)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Genre> {
        let state = self.state.lock().await;
        state
            .genres
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Genre with id {} not found", id)))
    }

    async fn create(&self, form: &GenreForm) -> AppResult<Genre> {
        let mut state = self.state.lock().await;
        let lowered = form.name.to_lowercase();
        if state.genres.values().any(|g| g.name.to_lowercase() == lowered) {
            return Err(AppError::ConstraintViolation(format!(
                "A genre named {} already exists (case-insensitive match)",
                form.name
            )));
        }

        let genre = Genre {
            id: state.next_id(),
            name: form.name.clone(),
        };
        state.genres.insert(genre.id, genre.clone());
        Ok(genre)
    }

    async fn count_name_contains(&self, needle: &str) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state.genres.values().filter(|g| name_matches(&g.name, needle)).count() as i64)
    }
}

#[async_trait]
impl LanguageRepository for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Language>> {
        let state = self.state.lock().await;
        let mut languages: Vec<Language> = state.languages.values().cloned().collect();
        languages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(languages)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Language> {
        let state = self.state.lock().await;
        state
            .languages
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Language with id {} not found", id)))
    }

    async fn create(&self, form: &LanguageForm) -> AppResult<Language> {
        let mut state = self.state.lock().await;
        if state.languages.values().any(|l| l.name == form.name) {
            return Err(AppError::ConstraintViolation(format!(
                "A language named {} already exists",
                form.name
            )));
        }

        let language = Language {
            id: state.next_id(),
            name: form.name.clone(),
        };
        state.languages.insert(language.id, language.clone());
        Ok(language)
    }
}

#[async_trait]
impl AuthorRepository for MemoryStore {
    async fn list(&self, page: Page) -> AppResult<(Vec<Author>, i64)> {
        let state = self.state.lock().await;
        let mut authors: Vec<Author> = state.authors.values().cloned().collect();
        authors.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()).then(a.id.cmp(&b.id)));
        Ok((page.slice(&authors), authors.len() as i64))
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        let state = self.state.lock().await;
        state
            .authors
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    async fn create(&self, form: &AuthorForm) -> AppResult<Author> {
        let mut state = self.state.lock().await;
        let author = Author {
            id: state.next_id(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            date_of_birth: form.date_of_birth,
            date_of_death: form.date_of_death,
        };
        state.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn update(&self, id: i32, form: &AuthorForm) -> AppResult<Author> {
        let mut state = self.state.lock().await;
        let author = state
            .authors
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))?;

        author.first_name = form.first_name.clone();
        author.last_name = form.last_name.clone();
        author.date_of_birth = form.date_of_birth;
        author.date_of_death = form.date_of_death;
        Ok(author.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if !state.authors.contains_key(&id) {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }
        let referencing = state.books.values().filter(|b| b.author_id == Some(id)).count();
        if referencing > 0 {
            return Err(AppError::ConstraintViolation(format!(
                "Author {} is referenced by {} book(s)",
                id, referencing
            )));
        }
        state.authors.remove(&id);
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.state.lock().await.authors.len() as i64)
    }
}

#[async_trait]
impl BookRepository for MemoryStore {
    async fn list(&self, page: Page) -> AppResult<(Vec<Book>, i64)> {
        let state = self.state.lock().await;
        let books: Vec<Book> = state.books.values().map(|r| state.resolve(r)).collect();
        Ok((page.slice(&books), books.len() as i64))
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let state = self.state.lock().await;
        state
            .books
            .get(&id)
            .map(|r| state.resolve(r))
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<Book>> {
        let state = self.state.lock().await;
        Ok(state
            .books
            .values()
            .filter(|b| b.author_id == Some(author_id))
            .map(|r| state.resolve(r))
            .collect())
    }

    async fn create(&self, form: &BookForm) -> AppResult<Book> {
        let mut state = self.state.lock().await;
        state.check_book(form, None)?;

        let id = state.next_id();
        let record = MemoryState::record_from_form(id, form);
        let book = state.resolve(&record);
        state.books.insert(id, record);
        Ok(book)
    }

    async fn update(&self, id: i32, form: &BookForm) -> AppResult<Book> {
        let mut state = self.state.lock().await;
        if !state.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        state.check_book(form, Some(id))?;

        let record = MemoryState::record_from_form(id, form);
        let book = state.resolve(&record);
        state.books.insert(id, record);
        Ok(book)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if !state.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        let referencing = state
            .instances
            .values()
            .filter(|i| i.book_id == Some(id))
            .count();
        if referencing > 0 {
            return Err(AppError::ConstraintViolation(format!(
                "Book {} is referenced by {} book instance(s)",
                id, referencing
            )));
        }
        state.books.remove(&id);
        Ok(())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.state.lock().await.books.len() as i64)
    }

    async fn count_with_genre_matching(&self, needle: &str) -> AppResult<i64> {
        let state = self.state.lock().await;
        let count = state
            .books
            .values()
            .filter(|b| {
                b.genre_ids
                    .iter()
                    .filter_map(|id| state.genres.get(id))
                    .any(|g| name_matches(&g.name, needle))
            })
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl BookInstanceRepository for MemoryStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        let state = self.state.lock().await;
        state
            .instances
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let state = self.state.lock().await;
        let mut copies: Vec<BookInstance> = state
            .instances
            .values()
            .filter(|i| i.book_id == Some(book_id))
            .cloned()
            .collect();
        copies.sort_by(by_due_back);
        Ok(copies)
    }

    async fn create(&self, instance: &BookInstance) -> AppResult<BookInstance> {
        let mut state = self.state.lock().await;
        if let Some(book_id) = instance.book_id {
            if !state.books.contains_key(&book_id) {
                return Err(AppError::ConstraintViolation(format!(
                    "Book {} does not exist",
                    book_id
                )));
            }
        }
        if state.instances.contains_key(&instance.id) {
            return Err(AppError::ConstraintViolation(format!(
                "Book instance {} already exists",
                instance.id
            )));
        }
        state.instances.insert(instance.id, instance.clone());
        Ok(instance.clone())
    }

    async fn save(&self, instance: &BookInstance) -> AppResult<BookInstance> {
        let mut state = self.state.lock().await;
        let stored = state
            .instances
            .get_mut(&instance.id)
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", instance.id)))?;

        stored.due_back = instance.due_back;
        stored.status = instance.status;
        stored.borrower_id = instance.borrower_id;
        Ok(stored.clone())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.state.lock().await.instances.len() as i64)
    }

    async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state.instances.values().filter(|i| i.status == status).count() as i64)
    }

    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        page: Page,
    ) -> AppResult<(Vec<(BookInstance, Option<String>)>, i64)> {
        let state = self.state.lock().await;
        let mut loans: Vec<BookInstance> = state
            .instances
            .values()
            .filter(|i| i.status == LoanStatus::OnLoan)
            .filter(|i| borrower_id.is_none() || i.borrower_id == borrower_id)
            .cloned()
            .collect();
        loans.sort_by(by_due_back);

        let total = loans.len() as i64;
        let entries = page
            .slice(&loans)
            .into_iter()
            .map(|i| {
                let title = i
                    .book_id
                    .and_then(|id| state.books.get(&id))
                    .map(|b| b.title.clone());
                (i, title)
            })
            .collect();

        Ok((entries, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn page() -> Page {
        Page::new(1, 10)
    }

    async fn seed_book(store: &MemoryStore, isbn: &str, genre: &str) -> Book {
        let genre = match GenreRepository::create(store, &GenreForm { name: genre.to_string() }).await {
            Ok(g) => g,
            Err(_) => GenreRepository::list(store)
                .await
                .unwrap()
                .into_iter()
                .find(|g| g.name.eq_ignore_ascii_case(genre))
                .unwrap(),
        };
        let form = BookForm {
            title: format!("Book {}", isbn),
            isbn: isbn.to_string(),
            genre_ids: vec![genre.id],
            ..Default::default()
        };
        BookRepository::create(store, &form).await.unwrap()
    }

    #[tokio::test]
    async fn test_genre_names_are_unique_ignoring_case() {
        let store = MemoryStore::default();
        GenreRepository::create(&store, &GenreForm { name: "Fiction".to_string() })
            .await
            .unwrap();

        let err = GenreRepository::create(&store, &GenreForm { name: "fiction".to_string() })
            .await
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[tokio::test]
    async fn test_language_names_are_unique() {
        let store = MemoryStore::default();
        let form = LanguageForm { name: "English".to_string() };
        LanguageRepository::create(&store, &form).await.unwrap();
        assert!(LanguageRepository::create(&store, &form)
            .await
            .unwrap_err()
            .is_constraint_violation());
    }

    #[tokio::test]
    async fn test_isbn_is_unique() {
        let store = MemoryStore::default();
        let book = seed_book(&store, "9780000000001", "Poetry").await;

        let mut form = BookForm::from(&book);
        let err = BookRepository::create(&store, &form).await.unwrap_err();
        assert!(err.is_constraint_violation());

        // Saving a book with its own ISBN is fine
        form.title = "Renamed".to_string();
        let updated = BookRepository::update(&store, book.id, &form).await.unwrap();
        assert_eq!(updated.title, "Renamed");
    }

    #[tokio::test]
    async fn test_author_delete_is_restricted_by_books() {
        let store = MemoryStore::default();
        let author = AuthorRepository::create(
            &store,
            &AuthorForm {
                first_name: "Ursula".to_string(),
                last_name: "Le Guin".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let book = seed_book(&store, "9780000000002", "Fantasy").await;
        let mut form = BookForm::from(&book);
        form.author_id = Some(author.id);
        BookRepository::update(&store, book.id, &form).await.unwrap();

        let err = AuthorRepository::delete(&store, author.id).await.unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(AuthorRepository::get_by_id(&store, author.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_book_delete_is_restricted_by_copies() {
        let store = MemoryStore::default();
        let book = seed_book(&store, "9780000000003", "Poetry").await;
        BookInstanceRepository::create(&store, &BookInstance::new(book.id, "First edition"))
            .await
            .unwrap();

        let err = BookRepository::delete(&store, book.id).await.unwrap_err();
        assert!(err.is_constraint_violation());
        assert_eq!(BookRepository::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_copy_requires_existing_book() {
        let store = MemoryStore::default();
        let err = BookInstanceRepository::create(&store, &BookInstance::new(42, "Ghost"))
            .await
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[tokio::test]
    async fn test_loans_are_ordered_by_due_back() {
        let store = MemoryStore::default();
        let book = seed_book(&store, "9780000000004", "Poetry").await;

        for (day, borrower) in [(20, 1), (5, 1), (12, 2)] {
            let mut copy = BookInstance::new(book.id, "Reprint");
            copy.status = LoanStatus::OnLoan;
            copy.borrower_id = Some(borrower);
            copy.due_back = NaiveDate::from_ymd_opt(2024, 2, day);
            BookInstanceRepository::create(&store, &copy).await.unwrap();
        }
        // Available copies never show up in loan lists
        BookInstanceRepository::create(&store, &BookInstance::new(book.id, "Spare"))
            .await
            .unwrap();

        let (all, total) = store.list_on_loan(None, page()).await.unwrap();
        assert_eq!(total, 3);
        let days: Vec<_> = all.iter().map(|(i, _)| i.due_back.unwrap()).collect();
        assert!(days.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(all[0].1.as_deref(), Some("Book 9780000000004"));

        let (mine, total) = store.list_on_loan(Some(1), page()).await.unwrap();
        assert_eq!(total, 2);
        assert!(mine.iter().all(|(i, _)| i.borrower_id == Some(1)));
    }

    #[tokio::test]
    async fn test_fiction_books_counted_once() {
        let store = MemoryStore::default();
        let sf = GenreRepository::create(&store, &GenreForm { name: "Science Fiction".to_string() })
            .await
            .unwrap();
        let hf = GenreRepository::create(&store, &GenreForm { name: "Historical fiction".to_string() })
            .await
            .unwrap();

        let form = BookForm {
            title: "Both".to_string(),
            isbn: "9780000000005".to_string(),
            genre_ids: vec![sf.id, hf.id],
            ..Default::default()
        };
        BookRepository::create(&store, &form).await.unwrap();

        assert_eq!(store.count_name_contains("FICTION").await.unwrap(), 2);
        assert_eq!(store.count_with_genre_matching("fiction").await.unwrap(), 1);
    }
}
