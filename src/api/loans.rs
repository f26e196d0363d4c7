//! Loan management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{
            CreateLoan, Loan, LoanFilter, LoanListResponse, LoanQuery, LoanStatusHistory,
            UpdateLoanStatus,
        },
        user::UserRole,
    },
};

use super::{calculate_pages, CurrentUser};

/// Request a new loan (any authenticated user)
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan request created", body = Loan),
        (status = 400, description = "No copies available, branch mismatch or loan ceiling reached"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateLoan>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let loan = state.services.loans.request_loan(user.id, request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// List loans.
///
/// Members see only their own loans; librarians and admins see all and may
/// filter by member or branch.
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "Paginated list of loans", body = LoanListResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<LoanListResponse>> {
    let member_id = if user.role == UserRole::Member {
        Some(user.id)
    } else {
        query.member_id
    };

    let filter = LoanFilter {
        member_id,
        branch_id: query.branch_id,
        status: query.status,
    };
    let page = query.page.unwrap_or(1).max(1);
    let size = query.size.unwrap_or(20).clamp(1, 100);

    let (items, total) = state
        .services
        .loans
        .list_loans(
            &filter,
            page,
            size,
            query.sort_by.as_deref().unwrap_or("created_at"),
            query.sort_order.as_deref().unwrap_or("desc"),
        )
        .await?;

    Ok(Json(LoanListResponse {
        items,
        total,
        page,
        size,
        pages: calculate_pages(total, size),
    }))
}

/// Current user's loan history
#[utoipa::path(
    get,
    path = "/loans/my-history",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "Paginated list of the current user's loans", body = LoanListResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_loan_history(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<LoanListResponse>> {
    let filter = LoanFilter {
        member_id: Some(user.id),
        branch_id: None,
        status: query.status,
    };
    let page = query.page.unwrap_or(1).max(1);
    let size = query.size.unwrap_or(20).clamp(1, 100);

    let (items, total) = state
        .services
        .loans
        .list_loans(
            &filter,
            page,
            size,
            query.sort_by.as_deref().unwrap_or("created_at"),
            query.sort_order.as_deref().unwrap_or("desc"),
        )
        .await?;

    Ok(Json(LoanListResponse {
        items,
        total,
        page,
        size,
        pages: calculate_pages(total, size),
    }))
}

/// Get loan details (members only their own)
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan details", body = Loan),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Member viewing another user's loan"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Path(loan_id): Path<Uuid>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.get_loan(loan_id).await?;

    if user.role == UserRole::Member && loan.member_id != user.id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }
    Ok(Json(loan))
}

/// Status change audit trail for a loan, oldest first
#[utoipa::path(
    get,
    path = "/loans/{id}/history",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Status history entries", body = Vec<LoanStatusHistory>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Member viewing another user's loan"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan_history(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Path(loan_id): Path<Uuid>,
) -> AppResult<Json<Vec<LoanStatusHistory>>> {
    let loan = state.services.loans.get_loan(loan_id).await?;

    if user.role == UserRole::Member && loan.member_id != user.id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    let history = state.services.loans.get_history(loan_id).await?;
    Ok(Json(history))
}

/// Update loan status.
///
/// Allowed transitions depend on the actor's role; the state machine
/// enforces both the permission matrix and the transition graph.
#[utoipa::path(
    patch,
    path = "/loans/{id}/status",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Loan ID")),
    request_body = UpdateLoanStatus,
    responses(
        (status = 200, description = "Loan status updated", body = Loan),
        (status = 400, description = "Invalid status transition"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Insufficient permissions for this transition"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn update_loan_status(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Path(loan_id): Path<Uuid>,
    Json(request): Json<UpdateLoanStatus>,
) -> AppResult<Json<Loan>> {
    let loan = state
        .services
        .loans
        .change_status(loan_id, request.status, &user, request.notes.as_deref())
        .await?;
    Ok(Json(loan))
}
