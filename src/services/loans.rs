//! Loan management service: renewal and loan lists

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Actor, BookInstance, Capability, LoanEntry, PageQuery, PaginatedResponse},
    repository::Repository,
};

use super::{
    authorization::{require, Authorizer},
    renewal::{RenewalPolicy, RENEWAL_HELP_TEXT},
};

/// Renewal form as first shown to the librarian
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalForm {
    pub book_instance: BookInstance,
    pub book_title: Option<String>,
    /// Proposed new due date
    pub renewal_date: NaiveDate,
    pub help_text: String,
}

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    authorizer: Arc<dyn Authorizer>,
    policy: RenewalPolicy,
    page_size: i64,
}

impl LoansService {
    pub fn new(
        repository: Repository,
        authorizer: Arc<dyn Authorizer>,
        policy: RenewalPolicy,
        page_size: i64,
    ) -> Self {
        Self {
            repository,
            authorizer,
            policy,
            page_size,
        }
    }

    async fn book_title(&self, instance: &BookInstance) -> AppResult<Option<String>> {
        match instance.book_id {
            Some(book_id) => Ok(Some(self.repository.books.get_by_id(book_id).await?.title)),
            None => Ok(None),
        }
    }

    /// Initial renewal form: the copy and a due date three weeks out
    pub async fn renewal_form(&self, actor: &Actor, id: Uuid, today: NaiveDate) -> AppResult<RenewalForm> {
        require(self.authorizer.as_ref(), actor, Capability::MarkReturned)?;

        let book_instance = self.repository.instances.get_by_id(id).await?;
        let book_title = self.book_title(&book_instance).await?;

        Ok(RenewalForm {
            book_instance,
            book_title,
            renewal_date: self.policy.suggested_date(today),
            help_text: RENEWAL_HELP_TEXT.to_string(),
        })
    }

    /// Move the due date of a copy. Status and borrower are left as they are.
    pub async fn renew(
        &self,
        actor: &Actor,
        id: Uuid,
        proposed: NaiveDate,
        today: NaiveDate,
    ) -> AppResult<BookInstance> {
        require(self.authorizer.as_ref(), actor, Capability::MarkReturned)?;

        let mut instance = self.repository.instances.get_by_id(id).await?;
        instance.due_back = Some(self.policy.validate(proposed, today)?);

        let saved = self.repository.instances.save(&instance).await?;
        tracing::info!(
            "Copy {} renewed until {} by {}",
            saved.id,
            proposed,
            actor.username
        );
        Ok(saved)
    }

    /// Copies on loan to `actor`, soonest due first
    pub async fn loans_for_user(
        &self,
        actor: &Actor,
        query: &PageQuery,
        today: NaiveDate,
    ) -> AppResult<PaginatedResponse<LoanEntry>> {
        self.list_on_loan(Some(actor.user_id), query, today).await
    }

    /// Every copy on loan, soonest due first
    pub async fn all_outstanding_loans(
        &self,
        actor: &Actor,
        query: &PageQuery,
        today: NaiveDate,
    ) -> AppResult<PaginatedResponse<LoanEntry>> {
        require(self.authorizer.as_ref(), actor, Capability::MarkReturned)?;
        self.list_on_loan(None, query, today).await
    }

    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        query: &PageQuery,
        today: NaiveDate,
    ) -> AppResult<PaginatedResponse<LoanEntry>> {
        let page = query.resolve(self.page_size);
        let (loans, total) = self.repository.instances.list_on_loan(borrower_id, page).await?;

        let entries = loans
            .into_iter()
            .map(|(instance, book_title)| LoanEntry {
                is_overdue: instance.is_overdue(today),
                instance,
                book_title,
            })
            .collect();

        Ok(PaginatedResponse::new(entries, total, page))
    }
}
