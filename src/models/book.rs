//! Book (catalog) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Book model from database.
///
/// Invariant: `0 <= available_copies <= total_copies`, enforced by check
/// constraints and only ever decremented/incremented through the loan
/// engine's transactional code paths.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub publication_year: Option<i32>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub branch_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 10, max = 13, message = "ISBN must be 10-13 characters"))]
    pub isbn: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub publication_year: Option<i32>,
    #[validate(range(min = 0, message = "total_copies must be >= 0"))]
    pub total_copies: Option<i32>,
    pub branch_id: Uuid,
}

/// Update book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub publication_year: Option<i32>,
    /// Resizing adjusts `available_copies` by the same delta; rejected if
    /// it would drop below the number of copies currently on loan.
    #[validate(range(min = 0, message = "total_copies must be >= 0"))]
    pub total_copies: Option<i32>,
    pub branch_id: Option<Uuid>,
}

/// Book list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub branch_id: Option<Uuid>,
    pub genre: Option<String>,
    pub author: Option<String>,
    /// Only books with at least one available copy
    pub available: Option<bool>,
    /// Matches title, author or ISBN
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Paginated book list response
#[derive(Debug, Serialize, ToSchema)]
pub struct BookListResponse {
    pub items: Vec<Book>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub pages: i64,
}
