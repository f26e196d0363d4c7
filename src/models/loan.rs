//! Loan model, status state machine data, and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Loan lifecycle status.
///
/// Stored as the Postgres enum `loan_status`. The legal transitions form a
/// directed acyclic graph encoded in [`LoanStatus::allowed_transitions`];
/// `returned`, `canceled` and `lost` are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "loan_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Requested,
    Canceled,
    Approved,
    Borrowed,
    Overdue,
    Returned,
    Lost,
}

impl LoanStatus {
    /// Statuses a loan may move to from `self`. Treated as data: the rest
    /// of the engine consults this table, it never hard-codes edges.
    pub fn allowed_transitions(self) -> &'static [LoanStatus] {
        use LoanStatus::*;
        match self {
            Requested => &[Canceled, Approved],
            Approved => &[Borrowed, Canceled],
            Borrowed => &[Returned, Lost, Overdue],
            Overdue => &[Returned, Lost],
            Returned | Canceled | Lost => &[],
        }
    }

    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Terminal statuses have no outgoing edges.
    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Statuses counting toward a member's active-loan ceiling.
    pub const ACTIVE: [LoanStatus; 4] = [
        LoanStatus::Requested,
        LoanStatus::Approved,
        LoanStatus::Borrowed,
        LoanStatus::Overdue,
    ];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoanStatus::Requested => "requested",
            LoanStatus::Canceled => "canceled",
            LoanStatus::Approved => "approved",
            LoanStatus::Borrowed => "borrowed",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Returned => "returned",
            LoanStatus::Lost => "lost",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: Uuid,
    pub member_id: Uuid,
    pub book_id: Uuid,
    pub branch_id: Uuid,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    #[schema(value_type = f64)]
    pub late_fee: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only status change record. Written once per loan creation and per
/// transition, never updated or deleted. `changed_by` is null for actions
/// taken by the overdue sweep.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanStatusHistory {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub previous_status: Option<LoanStatus>,
    pub new_status: LoanStatus,
    pub changed_by: Option<Uuid>,
    pub notes: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Create loan request payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLoan {
    pub book_id: Uuid,
    pub branch_id: Uuid,
    pub notes: Option<String>,
}

/// Status update payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLoanStatus {
    pub status: LoanStatus,
    pub notes: Option<String>,
}

/// Loan list filters. Permission-agnostic: handlers narrow `member_id`
/// before this reaches the repository.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct LoanFilter {
    pub member_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub status: Option<LoanStatus>,
}

/// Loan list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct LoanQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub member_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub status: Option<LoanStatus>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Paginated loan list response
#[derive(Debug, Serialize, ToSchema)]
pub struct LoanListResponse {
    pub items: Vec<Loan>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use LoanStatus::*;

    const ALL: [LoanStatus; 7] = [Requested, Canceled, Approved, Borrowed, Overdue, Returned, Lost];

    #[test]
    fn transition_table_matches_lifecycle_graph() {
        assert_eq!(Requested.allowed_transitions(), &[Canceled, Approved]);
        assert_eq!(Approved.allowed_transitions(), &[Borrowed, Canceled]);
        assert_eq!(Borrowed.allowed_transitions(), &[Returned, Lost, Overdue]);
        assert_eq!(Overdue.allowed_transitions(), &[Returned, Lost]);
    }

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        for status in [Returned, Canceled, Lost] {
            assert!(status.is_terminal());
            for next in ALL {
                assert!(!status.can_transition_to(next));
            }
        }
        for status in [Requested, Approved, Borrowed, Overdue] {
            assert!(!status.is_terminal());
        }
    }

    #[test]
    fn every_status_is_reachable_from_requested() {
        // Breadth-first walk over the transition table.
        let mut reachable = vec![Requested];
        let mut frontier = vec![Requested];
        while let Some(status) = frontier.pop() {
            for &next in status.allowed_transitions() {
                if !reachable.contains(&next) {
                    reachable.push(next);
                    frontier.push(next);
                }
            }
        }
        for status in ALL {
            assert!(reachable.contains(&status), "{status} unreachable");
        }
    }

    #[test]
    fn no_status_transitions_to_itself() {
        for status in ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn overdue_is_only_reachable_from_borrowed() {
        for status in ALL {
            let can = status.can_transition_to(Overdue);
            assert_eq!(can, status == Borrowed);
        }
    }

    #[test]
    fn active_statuses_exclude_terminal_ones() {
        for status in ALL {
            assert_eq!(status.is_active(), !status.is_terminal());
        }
    }
}
