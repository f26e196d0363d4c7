//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// User roles.
///
/// Stored as the Postgres enum `user_role`. The loan engine's permission
/// rules key off this: members act only on their own loans, librarians
/// manage the loan desk, admins are unrestricted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Member,
    Librarian,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Member => "member",
            UserRole::Librarian => "librarian",
            UserRole::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub full_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub is_built_in: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Librarian or admin.
    pub fn is_staff(&self) -> bool {
        matches!(self.role, UserRole::Librarian | UserRole::Admin)
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Insufficient permissions".to_string()))
        }
    }

    pub fn require_staff(&self) -> AppResult<()> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Insufficient permissions".to_string()))
        }
    }
}

/// Register request (public; always creates a member account)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
}

/// Update user request (admin only)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

/// User list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    /// Matches full name or email
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Paginated user list response
#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub items: Vec<User>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub pages: i64,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// User id
    pub sub: Uuid,
    pub role: UserRole,
    /// Token id, checked against the blacklist on every request
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_role(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@library.com".to_string(),
            hashed_password: String::new(),
            full_name: "Test User".to_string(),
            role,
            is_active: true,
            is_built_in: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn staff_check_covers_librarian_and_admin() {
        assert!(!user_with_role(UserRole::Member).is_staff());
        assert!(user_with_role(UserRole::Librarian).is_staff());
        assert!(user_with_role(UserRole::Admin).is_staff());
    }

    #[test]
    fn only_admin_passes_require_admin() {
        assert!(user_with_role(UserRole::Admin).require_admin().is_ok());
        assert!(matches!(
            user_with_role(UserRole::Librarian).require_admin(),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            user_with_role(UserRole::Member).require_admin(),
            Err(AppError::Forbidden(_))
        ));
    }
}
