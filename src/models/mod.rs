//! Data models for the Local Library catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod catalog;
pub mod genre;
pub mod language;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorDetails, AuthorForm};
pub use book::{Book, BookDetails, BookForm, BookShort};
pub use book_instance::{BookInstance, CreateBookInstance, LoanEntry, LoanStatus, UpdateBookInstance};
pub use catalog::{CatalogSummary, Page, PageQuery, PaginatedResponse};
pub use genre::{Genre, GenreForm};
pub use language::{Language, LanguageForm};
pub use user::{Actor, ActorClaims, Capability};
