//! Library branch model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Library branch model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Branch {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub description: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create branch request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBranch {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    pub description: Option<String>,
    pub phone_number: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Update branch request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBranch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub phone_number: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

/// Branch list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BranchQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub is_active: Option<bool>,
    /// Matches name or address
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Paginated branch list response
#[derive(Debug, Serialize, ToSchema)]
pub struct BranchListResponse {
    pub items: Vec<Branch>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub pages: i64,
}
