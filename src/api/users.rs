//! User management endpoints (admin only)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{UpdateUser, User, UserListResponse, UserQuery},
};

use super::{calculate_pages, CurrentUser};

/// List users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "Paginated list of users", body = UserListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<UserListResponse>> {
    user.require_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let size = query.size.unwrap_or(20).clamp(1, 100);

    let (items, total) = state.services.users.list_users(&query).await?;

    Ok(Json(UserListResponse {
        items,
        total,
        page,
        size,
        pages: calculate_pages(total, size),
    }))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<User>> {
    user.require_admin()?;
    let target = state.services.users.get_user(user_id).await?;
    Ok(Json(target))
}

/// Update a user's profile, role or active flag
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUser>,
) -> AppResult<Json<User>> {
    user.require_admin()?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let updated = state
        .services
        .users
        .update_user(user_id, request, user.id)
        .await?;
    Ok(Json(updated))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin access required or built-in account"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    state.services.users.delete_user(user_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
