//! Book instances repository for database operations

use async_trait::async_trait;
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{book_instance::BookInstanceRow, BookInstance, LoanStatus, Page},
};

use super::BookInstanceRepository;

const INSTANCE_COLUMNS: &str = "id, book_id, imprint, due_back, status, borrower_id";

#[derive(FromRow)]
struct LoanRow {
    #[sqlx(flatten)]
    instance: BookInstanceRow,
    title: Option<String>,
}

#[derive(Clone)]
pub struct InstancesRepository {
    pool: Pool<Postgres>,
}

impl InstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookInstanceRepository for InstancesRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        let query = format!("SELECT {} FROM book_instances WHERE id = $1", INSTANCE_COLUMNS);
        sqlx::query_as::<_, BookInstanceRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(BookInstance::from)
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let query = format!(
            "SELECT {} FROM book_instances WHERE book_id = $1 ORDER BY due_back, id",
            INSTANCE_COLUMNS
        );
        let rows = sqlx::query_as::<_, BookInstanceRow>(&query)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(BookInstance::from).collect())
    }

    async fn create(&self, instance: &BookInstance) -> AppResult<BookInstance> {
        let query = format!(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, status, borrower_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            INSTANCE_COLUMNS
        );
        let row = sqlx::query_as::<_, BookInstanceRow>(&query)
            .bind(instance.id)
            .bind(instance.book_id)
            .bind(&instance.imprint)
            .bind(instance.due_back)
            .bind(instance.status.code())
            .bind(instance.borrower_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn save(&self, instance: &BookInstance) -> AppResult<BookInstance> {
        let query = format!(
            r#"
            UPDATE book_instances
            SET due_back = $2, status = $3, borrower_id = $4
            WHERE id = $1
            RETURNING {}
            "#,
            INSTANCE_COLUMNS
        );
        sqlx::query_as::<_, BookInstanceRow>(&query)
            .bind(instance.id)
            .bind(instance.due_back)
            .bind(instance.status.code())
            .bind(instance.borrower_id)
            .fetch_optional(&self.pool)
            .await?
            .map(BookInstance::from)
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", instance.id)))
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
            .bind(status.code())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        page: Page,
    ) -> AppResult<(Vec<(BookInstance, Option<String>)>, i64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM book_instances
            WHERE status = $1 AND ($2::int IS NULL OR borrower_id = $2)
            "#,
        )
        .bind(LoanStatus::OnLoan.code())
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, LoanRow>(
            r#"
            SELECT bi.id, bi.book_id, bi.imprint, bi.due_back, bi.status, bi.borrower_id,
                   b.title
            FROM book_instances bi
            LEFT JOIN books b ON b.id = bi.book_id
            WHERE bi.status = $1 AND ($2::int IS NULL OR bi.borrower_id = $2)
            ORDER BY bi.due_back, bi.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(LoanStatus::OnLoan.code())
        .bind(borrower_id)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let loans = rows
            .into_iter()
            .map(|row| (BookInstance::from(row.instance), row.title))
            .collect();

        Ok((loans, total))
    }
}
