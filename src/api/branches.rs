//! Library branch endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::branch::{Branch, BranchListResponse, BranchQuery, CreateBranch, UpdateBranch},
};

use super::{calculate_pages, CurrentUser};

/// List branches
#[utoipa::path(
    get,
    path = "/branches",
    tag = "branches",
    security(("bearer_auth" = [])),
    params(BranchQuery),
    responses(
        (status = 200, description = "Paginated list of branches", body = BranchListResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_branches(
    State(state): State<crate::AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<BranchQuery>,
) -> AppResult<Json<BranchListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let size = query.size.unwrap_or(20).clamp(1, 100);

    let (items, total) = state.services.branches.list_branches(&query).await?;

    Ok(Json(BranchListResponse {
        items,
        total,
        page,
        size,
        pages: calculate_pages(total, size),
    }))
}

/// Get a branch by ID
#[utoipa::path(
    get,
    path = "/branches/{id}",
    tag = "branches",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Branch ID")),
    responses(
        (status = 200, description = "Branch details", body = Branch),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Branch not found")
    )
)]
pub async fn get_branch(
    State(state): State<crate::AppState>,
    CurrentUser(_user): CurrentUser,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<Branch>> {
    let branch = state.services.branches.get_branch(branch_id).await?;
    Ok(Json(branch))
}

/// Create a branch (librarian or admin)
#[utoipa::path(
    post,
    path = "/branches",
    tag = "branches",
    security(("bearer_auth" = [])),
    request_body = CreateBranch,
    responses(
        (status = 201, description = "Branch created", body = Branch),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Staff access required")
    )
)]
pub async fn create_branch(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateBranch>,
) -> AppResult<(StatusCode, Json<Branch>)> {
    user.require_staff()?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let branch = state
        .services
        .branches
        .create_branch(request, user.id)
        .await?;
    Ok((StatusCode::CREATED, Json(branch)))
}

/// Update a branch (librarian or admin)
#[utoipa::path(
    put,
    path = "/branches/{id}",
    tag = "branches",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Branch ID")),
    request_body = UpdateBranch,
    responses(
        (status = 200, description = "Branch updated", body = Branch),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Staff access required"),
        (status = 404, description = "Branch not found")
    )
)]
pub async fn update_branch(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Path(branch_id): Path<Uuid>,
    Json(request): Json<UpdateBranch>,
) -> AppResult<Json<Branch>> {
    user.require_staff()?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let branch = state
        .services
        .branches
        .update_branch(branch_id, request, user.id)
        .await?;
    Ok(Json(branch))
}

/// Delete a branch (admin only)
#[utoipa::path(
    delete,
    path = "/branches/{id}",
    tag = "branches",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Branch ID")),
    responses(
        (status = 204, description = "Branch deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Branch not found")
    )
)]
pub async fn delete_branch(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Path(branch_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    state
        .services
        .branches
        .delete_branch(branch_id, user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
