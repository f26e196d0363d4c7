//! Loan management service

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        loan::{CreateLoan, Loan, LoanFilter, LoanStatus, LoanStatusHistory},
        user::User,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Request a new loan for a member
    pub async fn request_loan(&self, member_id: Uuid, loan: CreateLoan) -> AppResult<Loan> {
        // Verify the member exists before touching inventory
        self.repository.users.get_by_id(member_id).await?;
        self.repository.loans.create(member_id, &loan).await
    }

    /// Change a loan's status on behalf of an actor
    pub async fn change_status(
        &self,
        loan_id: Uuid,
        new_status: LoanStatus,
        actor: &User,
        notes: Option<&str>,
    ) -> AppResult<Loan> {
        self.repository
            .loans
            .transition_status(loan_id, new_status, actor, notes)
            .await
    }

    /// Get a single loan
    pub async fn get_loan(&self, loan_id: Uuid) -> AppResult<Loan> {
        self.repository.loans.get_by_id(loan_id).await
    }

    /// Status history for a loan, oldest first
    pub async fn get_history(&self, loan_id: Uuid) -> AppResult<Vec<LoanStatusHistory>> {
        self.repository.loans.get_history(loan_id).await
    }

    /// List loans; the filter must already be narrowed by the caller
    pub async fn list_loans(
        &self,
        filter: &LoanFilter,
        page: i64,
        size: i64,
        sort_by: &str,
        sort_order: &str,
    ) -> AppResult<(Vec<Loan>, i64)> {
        self.repository
            .loans
            .list(filter, page, size, sort_by, sort_order)
            .await
    }

    /// Run one overdue sweep pass. Also callable outside the scheduler.
    pub async fn run_overdue_sweep(&self) -> AppResult<u64> {
        self.repository.loans.mark_overdue_loans().await
    }
}
