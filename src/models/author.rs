//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::BookShort;

/// Author model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    /// Died
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// "<last_name>, <first_name>"
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    pub fn absolute_url(&self) -> String {
        format!("/catalog/author/{}", self.id)
    }

    /// Default ordering key
    pub fn sort_key(&self) -> (&str, &str) {
        (&self.last_name, &self.first_name)
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.last_name, self.first_name)
    }
}

/// Author detail page: the author and the books they wrote
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetails {
    #[serde(flatten)]
    pub author: Author,
    pub display_name: String,
    pub books: Vec<BookShort>,
}

/// Create/update author form
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct AuthorForm {
    #[validate(length(min = 1, max = 100, message = "First name must be between 1 and 100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be between 1 and 100 characters"))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl From<&Author> for AuthorForm {
    fn from(author: &Author) -> Self {
        Self {
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
            date_of_birth: author.date_of_birth,
            date_of_death: author.date_of_death,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bob_big() -> Author {
        Author {
            id: 1,
            first_name: "Bob".to_string(),
            last_name: "Big".to_string(),
            date_of_birth: None,
            date_of_death: None,
        }
    }

    #[test]
    fn test_display_name_is_last_comma_first() {
        let author = bob_big();
        assert_eq!(author.display_name(), "Big, Bob");
        assert_eq!(author.to_string(), "Big, Bob");
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(bob_big().absolute_url(), "/catalog/author/1");
    }

    #[test]
    fn test_form_rejects_long_names() {
        let form = AuthorForm {
            first_name: "x".repeat(101),
            last_name: "Big".to_string(),
            ..Default::default()
        };
        assert!(form.validate().is_err());

        let form = AuthorForm::from(&bob_big());
        assert!(form.validate().is_ok());
    }
}
