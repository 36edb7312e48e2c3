//! Language model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Natural language a book is written in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Language {
    pub id: i32,
    pub name: String,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Create language form
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LanguageForm {
    /// Enter the book's natural language (e.g. English, French, Japanese etc.)
    #[validate(length(min = 1, max = 200, message = "Language name must be between 1 and 200 characters"))]
    pub name: String,
}
