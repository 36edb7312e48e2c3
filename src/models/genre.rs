//! Genre model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book genre (e.g. Science Fiction, French Poetry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

impl Genre {
    pub fn absolute_url(&self) -> String {
        format!("/catalog/genre/{}", self.id)
    }

    /// Whether the genre counts towards the fiction totals of the home page
    pub fn is_fiction(&self) -> bool {
        name_matches(&self.name, "fiction")
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Case-insensitive substring match used by genre filters
pub fn name_matches(name: &str, needle: &str) -> bool {
    name.to_lowercase().contains(&needle.to_lowercase())
}

/// Create genre form
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GenreForm {
    /// Enter a book genre (e.g. Science Fiction, French Poetry etc.)
    #[validate(length(min = 1, max = 200, message = "Genre name must be between 1 and 200 characters"))]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fiction_match_is_case_insensitive() {
        let sf = Genre { id: 1, name: "Science FICTION".to_string() };
        let poetry = Genre { id: 2, name: "Poetry".to_string() };
        assert!(sf.is_fiction());
        assert!(!poetry.is_fiction());
        assert_eq!(sf.to_string(), "Science FICTION");
        assert_eq!(sf.absolute_url(), "/catalog/genre/1");
    }
}
