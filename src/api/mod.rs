//! API handlers for Libris REST endpoints

pub mod auth;
pub mod books;
pub mod branches;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{error::AppError, models::user::User, AppState};

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))
}

/// Extractor for the authenticated user behind a bearer token.
///
/// Decodes and verifies the JWT, rejects blacklisted token ids, and loads
/// the account (inactive accounts are refused).
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.services.auth.decode_token(token)?;
        let user = state.services.auth.current_user(&claims).await?;
        Ok(CurrentUser(user))
    }
}

/// Raw verified claims, for endpoints that act on the token itself.
pub struct BearerClaims(pub crate::models::user::UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for BearerClaims {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.services.auth.decode_token(token)?;
        Ok(BearerClaims(claims))
    }
}

/// Page count for a paginated response: `ceil(total / size)`, 0 when the
/// page size is 0.
pub(crate) fn calculate_pages(total: i64, size: i64) -> i64 {
    if size > 0 {
        (total + size - 1) / size
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::calculate_pages;

    #[test]
    fn pages_round_up() {
        assert_eq!(calculate_pages(0, 20), 0);
        assert_eq!(calculate_pages(1, 20), 1);
        assert_eq!(calculate_pages(20, 20), 1);
        assert_eq!(calculate_pages(21, 20), 2);
        assert_eq!(calculate_pages(100, 7), 15);
    }

    #[test]
    fn zero_size_yields_zero_pages() {
        assert_eq!(calculate_pages(42, 0), 0);
    }
}
