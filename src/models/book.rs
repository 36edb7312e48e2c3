//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{author::Author, book_instance::BookInstance, genre::Genre, language::Language};

pub const DEFAULT_SUMMARY: &str = "No summary available";
pub const DEFAULT_ISBN: &str = "0000000000000";

/// A catalog book (not a specific copy of it)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    pub summary: String,
    /// 13 character ISBN
    pub isbn: String,
    pub genres: Vec<Genre>,
    pub languages: Vec<Language>,
}

/// Book row without its many-to-many links
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    pub summary: String,
    pub isbn: String,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            author_id: row.author_id,
            summary: row.summary,
            isbn: row.isbn,
            genres: Vec::new(),
            languages: Vec::new(),
        }
    }
}

impl Book {
    pub fn absolute_url(&self) -> String {
        format!("/catalog/book/{}", self.id)
    }

    /// First three genre names, comma separated
    pub fn display_genre(&self) -> String {
        self.genres
            .iter()
            .take(3)
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn display_language(&self) -> String {
        self.languages
            .iter()
            .map(|l| l.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn is_fiction(&self) -> bool {
        self.genres.iter().any(Genre::is_fiction)
    }
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Book as shown in lists
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub genre: String,
    pub language: String,
    pub url: String,
}

impl BookShort {
    pub fn new(book: &Book, author: Option<&Author>) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: author.map(Author::display_name),
            genre: book.display_genre(),
            language: book.display_language(),
            url: book.absolute_url(),
        }
    }
}

/// Book detail page: the book, its author and its copies
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub author: Option<Author>,
    pub instances: Vec<BookInstance>,
}

fn default_summary() -> String {
    DEFAULT_SUMMARY.to_string()
}

fn default_isbn() -> String {
    DEFAULT_ISBN.to_string()
}

/// Create/update book form
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub author_id: Option<i32>,
    /// Enter a brief description of the book
    #[serde(default = "default_summary")]
    #[validate(length(max = 1000, message = "Summary must be at most 1000 characters"))]
    pub summary: String,
    /// 13 Character ISBN number
    #[serde(default = "default_isbn")]
    #[validate(length(equal = 13, message = "ISBN must be exactly 13 characters"))]
    pub isbn: String,
    /// Select a genre for this book
    #[serde(default)]
    #[validate(length(min = 1, message = "Select at least one genre"))]
    pub genre_ids: Vec<i32>,
    /// Select languages for this book
    #[serde(default)]
    #[validate(length(min = 1, message = "Select at least one language"))]
    pub language_ids: Vec<i32>,
}

impl Default for BookForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            author_id: None,
            summary: default_summary(),
            isbn: default_isbn(),
            genre_ids: Vec::new(),
            language_ids: Vec::new(),
        }
    }
}

impl From<&Book> for BookForm {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author_id: book.author_id,
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            genre_ids: book.genres.iter().map(|g| g.id).collect(),
            language_ids: book.languages.iter().map(|l| l.id).collect(),
        }
    }
}
