//! Catalog-wide aggregates and list wrappers

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Counts shown on the home page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CatalogSummary {
    pub book_count: i64,
    pub instance_count: i64,
    /// Copies with status Available
    pub available_instance_count: i64,
    pub author_count: i64,
    /// Genres whose name contains "fiction"
    pub fiction_genre_count: i64,
    /// Books with at least one fiction genre
    pub fiction_book_count: i64,
}

/// Paging parameters for list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    /// Page number, starting at 1
    pub page: Option<i64>,
    /// Entries per page
    pub per_page: Option<i64>,
}

/// Resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub size: i64,
}

impl Page {
    pub fn new(number: i64, size: i64) -> Self {
        Self {
            number: number.max(1),
            size: size.clamp(1, 100),
        }
    }

    /// Rows to skip; saturates so far-out pages are simply empty
    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.size)
    }

    /// Slice an already ordered list
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(usize::try_from(self.offset()).unwrap_or(usize::MAX))
            .take(self.size as usize)
            .cloned()
            .collect()
    }
}

impl PageQuery {
    pub fn resolve(&self, default_size: i64) -> Page {
        Page::new(self.page.unwrap_or(1), self.per_page.unwrap_or(default_size))
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        Self {
            items,
            total,
            page: page.number,
            per_page: page.size,
        }
    }
}
