//! Loans repository: the loan lifecycle engine.
//!
//! Every status mutation runs inside a single transaction that locks the
//! loan row and, when copies are affected, the book row (`FOR UPDATE`), so
//! the status check, transition, copy-count update and history append are
//! atomic. The overdue sweep commits all-or-nothing per invocation.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    clock::SharedClock,
    error::{AppError, AppResult},
    models::{
        loan::{CreateLoan, Loan, LoanFilter, LoanStatus, LoanStatusHistory},
        user::{User, UserRole},
    },
};

pub const DEFAULT_LOAN_DAYS: i64 = 14;
pub const MAX_ACTIVE_LOANS: i64 = 5;

/// Late fee accrued per whole day past due, in currency units.
pub fn late_fee_per_day() -> Decimal {
    Decimal::new(50, 2) // 0.50
}

/// Late fee for a loan due at `due_date` and effectively ended at
/// `end_date` (return date, loss date, or the sweep's "now").
///
/// Whole elapsed days are truncated, not rounded: a loan returned 5 days
/// and 23 hours late owes 5 days of fees. The sweep's running estimate and
/// the final RETURNED/LOST fee both go through this function.
pub fn calculate_late_fee(due_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Decimal {
    if end_date <= due_date {
        return Decimal::ZERO;
    }
    let overdue_days = (end_date - due_date).num_days();
    (Decimal::from(overdue_days) * late_fee_per_day()).round_dp(2)
}

/// Role authorization for a requested status change. Checked before
/// transition legality so that a member always gets Forbidden, never a
/// state error, for transitions they may not perform at all.
pub fn authorize_transition(actor: &User, loan: &Loan, new_status: LoanStatus) -> AppResult<()> {
    match actor.role {
        UserRole::Member => {
            if loan.member_id != actor.id {
                return Err(AppError::Forbidden(
                    "You can only modify your own loans".to_string(),
                ));
            }
            if !matches!(new_status, LoanStatus::Requested | LoanStatus::Canceled) {
                return Err(AppError::Forbidden(format!(
                    "Members cannot set status to '{}'",
                    new_status
                )));
            }
            // Members may only withdraw a pending request; canceling an
            // approved loan is a librarian/admin action.
            if new_status == LoanStatus::Canceled && loan.status != LoanStatus::Requested {
                return Err(AppError::Forbidden(
                    "Members can only cancel a loan that is in 'requested' status".to_string(),
                ));
            }
        }
        UserRole::Librarian => {
            if !matches!(
                new_status,
                LoanStatus::Approved
                    | LoanStatus::Borrowed
                    | LoanStatus::Returned
                    | LoanStatus::Lost
                    | LoanStatus::Canceled
            ) {
                return Err(AppError::Forbidden(format!(
                    "Librarians cannot set status to '{}'",
                    new_status
                )));
            }
        }
        UserRole::Admin => {}
    }
    Ok(())
}

/// Maps Postgres serialization failures to the retryable conflict kind.
fn tx_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if matches!(db.code().as_deref(), Some("40001") | Some("40P01")) {
            return AppError::ConcurrencyConflict(
                "Transaction could not complete atomically, retry".to_string(),
            );
        }
    }
    AppError::Database(e)
}

fn order_clause(sort_by: &str, sort_order: &str) -> String {
    // Unknown sort fields fall back to creation time rather than erroring.
    let column = match sort_by {
        "borrow_date" | "due_date" | "status" | "created_at" => sort_by,
        _ => "created_at",
    };
    let direction = if sort_order.eq_ignore_ascii_case("asc") {
        "ASC"
    } else {
        "DESC"
    };
    format!("ORDER BY {} {}", column, direction)
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
    clock: SharedClock,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>, clock: SharedClock) -> Self {
        Self { pool, clock }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {}", id)))
    }

    /// Status history for a loan, oldest first
    pub async fn get_history(&self, loan_id: Uuid) -> AppResult<Vec<LoanStatusHistory>> {
        let rows = sqlx::query_as::<_, LoanStatusHistory>(
            "SELECT * FROM loan_status_history WHERE loan_id = $1 ORDER BY changed_at",
        )
        .bind(loan_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Create a new loan request.
    ///
    /// Reserves a copy immediately: `available_copies` is decremented while
    /// the book row is locked, so two simultaneous last-copy requests
    /// cannot both succeed.
    pub async fn create(&self, member_id: Uuid, loan: &CreateLoan) -> AppResult<Loan> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(tx_error)?;

        let active_count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM loans
            WHERE member_id = $1
              AND status IN ('requested', 'approved', 'borrowed', 'overdue')
            "#,
        )
        .bind(member_id)
        .fetch_one(&mut *tx)
        .await?;

        if active_count >= MAX_ACTIVE_LOANS {
            return Err(AppError::CapacityExceeded(MAX_ACTIVE_LOANS as u32));
        }

        let book = sqlx::query_as::<_, (i32, Uuid)>(
            "SELECT available_copies, branch_id FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(loan.book_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {}", loan.book_id)))?;

        let (available_copies, branch_id) = book;
        if available_copies <= 0 {
            return Err(AppError::Unavailable);
        }
        if branch_id != loan.branch_id {
            return Err(AppError::BranchMismatch);
        }

        let updated = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1, updated_at = $2
            WHERE id = $1 AND available_copies > 0
            "#,
        )
        .bind(loan.book_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::ConcurrencyConflict(
                "Book availability changed during loan creation".to_string(),
            ));
        }

        let created = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans
                (id, member_id, book_id, branch_id, borrow_date, due_date,
                 status, late_fee, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'requested', 0.00, $7, $5, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(member_id)
        .bind(loan.book_id)
        .bind(loan.branch_id)
        .bind(now)
        .bind(now + Duration::days(DEFAULT_LOAN_DAYS))
        .bind(&loan.notes)
        .fetch_one(&mut *tx)
        .await?;

        self.append_history(
            &mut tx,
            created.id,
            None,
            LoanStatus::Requested,
            Some(member_id),
            Some("Loan requested"),
            now,
        )
        .await?;

        tx.commit().await.map_err(tx_error)?;

        tracing::info!(
            loan_id = %created.id,
            member_id = %member_id,
            book_id = %loan.book_id,
            "loan created"
        );
        Ok(created)
    }

    /// Transition a loan to a new status on behalf of `actor`.
    ///
    /// Authorization is checked first, then graph legality against the
    /// transition table; side effects (copy counts, return date, late fee)
    /// and the history append commit atomically with the status write.
    pub async fn transition_status(
        &self,
        loan_id: Uuid,
        new_status: LoanStatus,
        actor: &User,
        notes: Option<&str>,
    ) -> AppResult<Loan> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(tx_error)?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {}", loan_id)))?;

        authorize_transition(actor, &loan, new_status)?;

        if !loan.status.can_transition_to(new_status) {
            return Err(AppError::InvalidTransition {
                from: loan.status,
                to: new_status,
            });
        }

        let old_status = loan.status;
        let mut return_date = loan.return_date;
        let mut late_fee = loan.late_fee;

        match new_status {
            LoanStatus::Returned => {
                return_date = Some(now);
                late_fee = calculate_late_fee(loan.due_date, now);
                self.release_copy(&mut tx, loan.book_id, now).await?;
            }
            LoanStatus::Lost => {
                // The copy stays checked out of inventory.
                late_fee = calculate_late_fee(loan.due_date, now);
            }
            LoanStatus::Canceled
                if matches!(old_status, LoanStatus::Requested | LoanStatus::Approved) =>
            {
                self.release_copy(&mut tx, loan.book_id, now).await?;
            }
            _ => {}
        }

        let updated = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = $2, return_date = $3, late_fee = $4, updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(new_status)
        .bind(return_date)
        .bind(late_fee)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        self.append_history(
            &mut tx,
            loan_id,
            Some(old_status),
            new_status,
            Some(actor.id),
            notes,
            now,
        )
        .await?;

        tx.commit().await.map_err(tx_error)?;

        tracing::info!(
            loan_id = %loan_id,
            from = %old_status,
            to = %new_status,
            actor_id = %actor.id,
            "loan status changed"
        );
        Ok(updated)
    }

    /// Mark every BORROWED loan past its due date as OVERDUE.
    ///
    /// System action: history rows carry `changed_by = NULL`. The fee set
    /// here is a running estimate, recomputed at actual return or loss.
    /// All loans swept in one tick commit as a single transaction.
    pub async fn mark_overdue_loans(&self) -> AppResult<u64> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(tx_error)?;

        let overdue = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE status = 'borrowed' AND due_date < $1 FOR UPDATE",
        )
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        let mut count: u64 = 0;
        for loan in overdue {
            let overdue_days = (now - loan.due_date).num_days();
            let late_fee = calculate_late_fee(loan.due_date, now);

            sqlx::query(
                "UPDATE loans SET status = 'overdue', late_fee = $2, updated_at = $3 WHERE id = $1",
            )
            .bind(loan.id)
            .bind(late_fee)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            let note = format!(
                "Automatically marked overdue ({} days past due)",
                overdue_days
            );
            self.append_history(
                &mut tx,
                loan.id,
                Some(LoanStatus::Borrowed),
                LoanStatus::Overdue,
                None,
                Some(&note),
                now,
            )
            .await?;
            count += 1;

            tracing::info!(
                loan_id = %loan.id,
                member_id = %loan.member_id,
                days_overdue = overdue_days,
                late_fee = %late_fee,
                "loan marked overdue"
            );
        }

        tx.commit().await.map_err(tx_error)?;
        Ok(count)
    }

    /// List loans with filtering, sorting and pagination.
    ///
    /// Permission-agnostic: callers narrow the filter set before invoking.
    pub async fn list(
        &self,
        filter: &LoanFilter,
        page: i64,
        size: i64,
        sort_by: &str,
        sort_order: &str,
    ) -> AppResult<(Vec<Loan>, i64)> {
        let page = page.max(1);
        let size = size.clamp(1, 100);
        let offset = (page - 1) * size;

        let mut conditions: Vec<String> = Vec::new();
        let mut idx = 0;
        if filter.member_id.is_some() {
            idx += 1;
            conditions.push(format!("member_id = ${}", idx));
        }
        if filter.branch_id.is_some() {
            idx += 1;
            conditions.push(format!("branch_id = ${}", idx));
        }
        if filter.status.is_some() {
            idx += 1;
            conditions.push(format!("status = ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM loans {}", where_clause);
        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(member_id) = filter.member_id {
            count = count.bind(member_id);
        }
        if let Some(branch_id) = filter.branch_id {
            count = count.bind(branch_id);
        }
        if let Some(status) = filter.status {
            count = count.bind(status);
        }
        let total = count.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT * FROM loans {} {} LIMIT {} OFFSET {}",
            where_clause,
            order_clause(sort_by, sort_order),
            size,
            offset
        );
        let mut query = sqlx::query_as::<_, Loan>(&select_query);
        if let Some(member_id) = filter.member_id {
            query = query.bind(member_id);
        }
        if let Some(branch_id) = filter.branch_id {
            query = query.bind(branch_id);
        }
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        let loans = query.fetch_all(&self.pool).await?;

        Ok((loans, total))
    }

    /// Put a reserved or borrowed copy back into circulation.
    async fn release_copy(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        book_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies + 1, updated_at = $2
            WHERE id = $1 AND available_copies < total_copies
            "#,
        )
        .bind(book_id)
        .bind(now)
        .execute(&mut **tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::ConcurrencyConflict(format!(
                "Copy count for book {} is out of sync",
                book_id
            )));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn append_history(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        loan_id: Uuid,
        previous_status: Option<LoanStatus>,
        new_status: LoanStatus,
        changed_by: Option<Uuid>,
        notes: Option<&str>,
        changed_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO loan_status_history
                (id, loan_id, previous_status, new_status, changed_by, notes, changed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(loan_id)
        .bind(previous_status)
        .bind(new_status)
        .bind(changed_by)
        .bind(notes)
        .bind(changed_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dt(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn user(role: UserRole, id: Uuid) -> User {
        User {
            id,
            email: "u@library.com".to_string(),
            hashed_password: String::new(),
            full_name: "U".to_string(),
            role,
            is_active: true,
            is_built_in: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn loan(member_id: Uuid, status: LoanStatus) -> Loan {
        let now = Utc::now();
        Loan {
            id: Uuid::new_v4(),
            member_id,
            book_id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            borrow_date: now,
            due_date: now + Duration::days(DEFAULT_LOAN_DAYS),
            return_date: None,
            status,
            late_fee: Decimal::ZERO,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn late_fee_is_zero_on_or_before_due_date() {
        let due = dt(2024, 6, 15, 12);
        assert_eq!(calculate_late_fee(due, due), Decimal::ZERO);
        assert_eq!(calculate_late_fee(due, due - Duration::days(3)), Decimal::ZERO);
    }

    #[test]
    fn late_fee_truncates_partial_days() {
        let due = dt(2024, 6, 15, 12);
        // 5 days and 23 hours late still bills 5 days
        let end = due + Duration::days(5) + Duration::hours(23);
        assert_eq!(calculate_late_fee(due, end), Decimal::new(250, 2));
        // Under one full day late bills nothing
        let end = due + Duration::hours(23);
        assert_eq!(calculate_late_fee(due, end), Decimal::ZERO);
    }

    #[test]
    fn late_fee_increases_by_rate_per_whole_day() {
        let due = dt(2024, 6, 15, 12);
        for days in 1..30 {
            let fee = calculate_late_fee(due, due + Duration::days(days));
            assert_eq!(fee, Decimal::from(days) * late_fee_per_day());
        }
    }

    #[test]
    fn five_days_overdue_costs_two_fifty() {
        let due = dt(2024, 6, 10, 0);
        let now = dt(2024, 6, 15, 0);
        assert_eq!(calculate_late_fee(due, now), Decimal::new(250, 2));
    }

    #[test]
    fn member_cannot_touch_another_members_loan() {
        let actor = user(UserRole::Member, Uuid::new_v4());
        let other = loan(Uuid::new_v4(), LoanStatus::Requested);
        let err = authorize_transition(&actor, &other, LoanStatus::Canceled).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn member_can_cancel_own_requested_loan() {
        let id = Uuid::new_v4();
        let actor = user(UserRole::Member, id);
        let own = loan(id, LoanStatus::Requested);
        assert!(authorize_transition(&actor, &own, LoanStatus::Canceled).is_ok());
    }

    #[test]
    fn member_cannot_cancel_approved_loan() {
        let id = Uuid::new_v4();
        let actor = user(UserRole::Member, id);
        let own = loan(id, LoanStatus::Approved);
        let err = authorize_transition(&actor, &own, LoanStatus::Canceled).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn member_gets_forbidden_not_state_error_for_staff_statuses() {
        let id = Uuid::new_v4();
        let actor = user(UserRole::Member, id);
        let own = loan(id, LoanStatus::Requested);
        for status in [
            LoanStatus::Approved,
            LoanStatus::Borrowed,
            LoanStatus::Returned,
            LoanStatus::Lost,
            LoanStatus::Overdue,
        ] {
            let err = authorize_transition(&actor, &own, status).unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)), "{status}");
        }
    }

    #[test]
    fn librarian_cannot_set_overdue_or_requested() {
        let actor = user(UserRole::Librarian, Uuid::new_v4());
        let l = loan(Uuid::new_v4(), LoanStatus::Borrowed);
        for status in [LoanStatus::Overdue, LoanStatus::Requested] {
            let err = authorize_transition(&actor, &l, status).unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)), "{status}");
        }
    }

    #[test]
    fn librarian_can_work_the_loan_desk_on_any_loan() {
        let actor = user(UserRole::Librarian, Uuid::new_v4());
        let l = loan(Uuid::new_v4(), LoanStatus::Requested);
        for status in [
            LoanStatus::Approved,
            LoanStatus::Borrowed,
            LoanStatus::Returned,
            LoanStatus::Lost,
            LoanStatus::Canceled,
        ] {
            assert!(authorize_transition(&actor, &l, status).is_ok(), "{status}");
        }
    }

    #[test]
    fn admin_is_unrestricted() {
        let actor = user(UserRole::Admin, Uuid::new_v4());
        let l = loan(Uuid::new_v4(), LoanStatus::Borrowed);
        for status in [
            LoanStatus::Requested,
            LoanStatus::Approved,
            LoanStatus::Borrowed,
            LoanStatus::Overdue,
            LoanStatus::Returned,
            LoanStatus::Canceled,
            LoanStatus::Lost,
        ] {
            assert!(authorize_transition(&actor, &l, status).is_ok(), "{status}");
        }
    }

    #[test]
    fn unknown_sort_field_falls_back_to_created_at() {
        assert_eq!(order_clause("due_date", "asc"), "ORDER BY due_date ASC");
        assert_eq!(
            order_clause("late_fee; DROP TABLE loans", "desc"),
            "ORDER BY created_at DESC"
        );
        assert_eq!(order_clause("nonsense", "sideways"), "ORDER BY created_at DESC");
    }
}
