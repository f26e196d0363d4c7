//! Book catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookListResponse, BookQuery, CreateBook, UpdateBook},
};

use super::{calculate_pages, CurrentUser};

/// List books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "Paginated list of books", body = BookListResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<BookListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let size = query.size.unwrap_or(20).clamp(1, 100);

    let (items, total) = state.services.books.list_books(&query).await?;

    Ok(Json(BookListResponse {
        items,
        total,
        page,
        size,
        pages: calculate_pages(total, size),
    }))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    CurrentUser(_user): CurrentUser,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get_book(book_id).await?;
    Ok(Json(book))
}

/// Add a book to the catalog (librarian or admin)
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Staff access required"),
        (status = 404, description = "Branch not found")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    user.require_staff()?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let book = state.services.books.create_book(request, user.id).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update a book (librarian or admin)
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Validation error or copy count conflict"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Staff access required"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Path(book_id): Path<Uuid>,
    Json(request): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    user.require_staff()?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let book = state
        .services
        .books
        .update_book(book_id, request, user.id)
        .await?;
    Ok(Json(book))
}

/// Remove a book from the catalog (admin only)
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    CurrentUser(user): CurrentUser,
    Path(book_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require_admin()?;
    state.services.books.delete_book(book_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
