//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, branches, health, loans, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "1.0.0",
        description = "Library Management System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        // Users
        users::list_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        // Branches
        branches::list_branches,
        branches::get_branch,
        branches::create_branch,
        branches::update_branch,
        branches::delete_branch,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Loans
        loans::create_loan,
        loans::list_loans,
        loans::my_loan_history,
        loans::get_loan,
        loans::get_loan_history,
        loans::update_loan_status,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::MessageResponse,
            // Users
            crate::models::user::User,
            crate::models::user::UserRole,
            crate::models::user::RegisterUser,
            crate::models::user::UpdateUser,
            crate::models::user::UserListResponse,
            // Branches
            crate::models::branch::Branch,
            crate::models::branch::CreateBranch,
            crate::models::branch::UpdateBranch,
            crate::models::branch::BranchListResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book::BookListResponse,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanStatus,
            crate::models::loan::LoanStatusHistory,
            crate::models::loan::CreateLoan,
            crate::models::loan::UpdateLoanStatus,
            crate::models::loan::LoanListResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User management"),
        (name = "branches", description = "Library branch management"),
        (name = "books", description = "Book catalog management"),
        (name = "loans", description = "Loan management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
