//! Authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{RegisterUser, User},
};

use super::{BearerClaims, CurrentUser};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a new member account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Validation error or email already registered")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(request): Json<RegisterUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = state
        .services
        .auth
        .register(&request.email, &request.password, &request.full_name)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account deactivated")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (user, token) = state
        .services
        .auth
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user,
    }))
}

/// Invalidate the current access token
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token invalidated", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    State(state): State<crate::AppState>,
    BearerClaims(claims): BearerClaims,
) -> AppResult<Json<MessageResponse>> {
    state.services.auth.logout(&claims).await?;
    Ok(Json(MessageResponse {
        message: "Successfully logged out".to_string(),
    }))
}

/// Current authenticated user's profile
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
