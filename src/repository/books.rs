//! Books repository for catalog operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    clock::SharedClock,
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

fn order_clause(sort_by: &str, sort_order: &str) -> String {
    let column = match sort_by {
        "title" | "author" | "publication_year" | "created_at" => sort_by,
        _ => "created_at",
    };
    let direction = if sort_order.eq_ignore_ascii_case("asc") {
        "ASC"
    } else {
        "DESC"
    };
    format!("ORDER BY {} {}", column, direction)
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
    clock: SharedClock,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>, clock: SharedClock) -> Self {
        Self { pool, clock }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {}", id)))
    }

    /// Create a new book; available copies start equal to total copies.
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let now = self.clock.now();
        let total_copies = book.total_copies.unwrap_or(1);

        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books
                (id, title, author, isbn, description, genre, publication_year,
                 total_copies, available_copies, branch_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $9, $10, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.description)
        .bind(&book.genre)
        .bind(book.publication_year)
        .bind(total_copies)
        .bind(book.branch_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update a book.
    ///
    /// Resizing `total_copies` moves `available_copies` by the same delta;
    /// shrinking below the number of copies currently on loan is rejected.
    pub async fn update(&self, id: Uuid, update: &UpdateBook) -> AppResult<Book> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {}", id)))?;

        let (total_copies, available_copies) = match update.total_copies {
            Some(new_total) => {
                let new_available = book.available_copies + (new_total - book.total_copies);
                if new_available < 0 {
                    return Err(AppError::Validation(
                        "Cannot reduce total copies below the number currently on loan"
                            .to_string(),
                    ));
                }
                (new_total, new_available)
            }
            None => (book.total_copies, book.available_copies),
        };

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = COALESCE($2, title),
                author = COALESCE($3, author),
                description = COALESCE($4, description),
                genre = COALESCE($5, genre),
                publication_year = COALESCE($6, publication_year),
                total_copies = $7,
                available_copies = $8,
                branch_id = COALESCE($9, branch_id),
                updated_at = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.author)
        .bind(&update.description)
        .bind(&update.genre)
        .bind(update.publication_year)
        .bind(total_copies)
        .bind(available_copies)
        .bind(update.branch_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a book
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let deleted = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {}", id)));
        }
        Ok(())
    }

    /// List books with filtering, sorting and pagination
    pub async fn list(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let size = query.size.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * size;

        let mut conditions: Vec<String> = Vec::new();
        let mut idx = 0;
        if query.branch_id.is_some() {
            idx += 1;
            conditions.push(format!("branch_id = ${}", idx));
        }
        if query.genre.is_some() {
            idx += 1;
            conditions.push(format!("genre ILIKE ${}", idx));
        }
        if query.author.is_some() {
            idx += 1;
            conditions.push(format!("author ILIKE ${}", idx));
        }
        if query.available == Some(true) {
            conditions.push("available_copies > 0".to_string());
        }
        if query.search.is_some() {
            idx += 1;
            conditions.push(format!(
                "(title ILIKE ${0} OR author ILIKE ${0} OR isbn ILIKE ${0})",
                idx
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let genre = query.genre.as_ref().map(|g| format!("%{}%", g));
        let author = query.author.as_ref().map(|a| format!("%{}%", a));
        let search = query.search.as_ref().map(|s| format!("%{}%", s));

        let count_query = format!("SELECT COUNT(*) FROM books {}", where_clause);
        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(branch_id) = query.branch_id {
            count = count.bind(branch_id);
        }
        if let Some(ref genre) = genre {
            count = count.bind(genre);
        }
        if let Some(ref author) = author {
            count = count.bind(author);
        }
        if let Some(ref search) = search {
            count = count.bind(search);
        }
        let total = count.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT * FROM books {} {} LIMIT {} OFFSET {}",
            where_clause,
            order_clause(
                query.sort_by.as_deref().unwrap_or("created_at"),
                query.sort_order.as_deref().unwrap_or("desc"),
            ),
            size,
            offset
        );
        let mut select = sqlx::query_as::<_, Book>(&select_query);
        if let Some(branch_id) = query.branch_id {
            select = select.bind(branch_id);
        }
        if let Some(ref genre) = genre {
            select = select.bind(genre);
        }
        if let Some(ref author) = author {
            select = select.bind(author);
        }
        if let Some(ref search) = search {
            select = select.bind(search);
        }
        let books = select.fetch_all(&self.pool).await?;

        Ok((books, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_sort_whitelist_falls_back() {
        assert_eq!(order_clause("title", "asc"), "ORDER BY title ASC");
        assert_eq!(order_clause("isbn", "asc"), "ORDER BY created_at ASC");
    }
}
