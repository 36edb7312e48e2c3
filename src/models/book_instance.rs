//! Book instance (tracked physical copy) model and loan status

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Availability of a copy.
///
/// Any status may be assigned from any other; no transition table is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    /// Single character stored in the `status` column
    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "m" => Some(LoanStatus::Maintenance),
            "o" => Some(LoanStatus::OnLoan),
            "a" => Some(LoanStatus::Available),
            "r" => Some(LoanStatus::Reserved),
            _ => None,
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        };
        write!(f, "{}", label)
    }
}

/// Specific copy of a book that can be borrowed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookInstance {
    /// Unique ID for this particular book across whole library
    pub id: Uuid,
    pub book_id: Option<i32>,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    /// User id of the borrower, as issued by the identity provider
    pub borrower_id: Option<i32>,
}

impl BookInstance {
    /// New copy of `book_id`: fresh UUID, status Maintenance, not lent
    pub fn new(book_id: i32, imprint: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_id: Some(book_id),
            imprint: imprint.into(),
            due_back: None,
            status: LoanStatus::default(),
            borrower_id: None,
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_back.map(|d| d < today).unwrap_or(false)
    }

    /// "<uuid> (<book title>)"
    pub fn display_name(&self, book_title: &str) -> String {
        format!("{} ({})", self.id, book_title)
    }
}

/// Row as stored, with the status as its column code
#[derive(Debug, Clone, FromRow)]
pub struct BookInstanceRow {
    pub id: Uuid,
    pub book_id: Option<i32>,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: String,
    pub borrower_id: Option<i32>,
}

impl From<BookInstanceRow> for BookInstance {
    fn from(row: BookInstanceRow) -> Self {
        Self {
            id: row.id,
            book_id: row.book_id,
            imprint: row.imprint,
            due_back: row.due_back,
            status: LoanStatus::from_code(&row.status).unwrap_or_default(),
            borrower_id: row.borrower_id,
        }
    }
}

/// Loan list entry
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanEntry {
    #[serde(flatten)]
    pub instance: BookInstance,
    pub book_title: Option<String>,
    pub is_overdue: bool,
}

/// Create copy form
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBookInstance {
    #[validate(length(min = 1, max = 200, message = "Imprint must be between 1 and 200 characters"))]
    pub imprint: String,
}

/// Availability update form. Absent fields keep their value; `null` clears
/// `due_back` or `borrower_id`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateBookInstance {
    pub status: Option<LoanStatus>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub due_back: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub borrower_id: Option<Option<i32>>,
}

impl UpdateBookInstance {
    pub fn apply(&self, instance: &mut BookInstance) {
        if let Some(status) = self.status {
            instance.status = status;
        }
        if let Some(due_back) = self.due_back {
            instance.due_back = due_back;
        }
        if let Some(borrower_id) = self.borrower_id {
            instance.borrower_id = borrower_id;
        }
    }
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
