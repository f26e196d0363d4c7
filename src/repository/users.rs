//! Users repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    clock::SharedClock,
    error::{AppError, AppResult},
    models::user::{User, UserQuery, UserRole},
};

fn order_clause(sort_by: &str, sort_order: &str) -> String {
    let column = match sort_by {
        "email" | "full_name" | "created_at" => sort_by,
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
pub struct UsersRepository {
    pool: Pool<Postgres>,
    clock: SharedClock,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>, clock: SharedClock) -> Self {
        Self { pool, clock }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {}", id)))
    }

    /// Get user by email
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Create a new user account
    pub async fn create(
        &self,
        email: &str,
        hashed_password: &str,
        full_name: &str,
        role: UserRole,
        is_built_in: bool,
    ) -> AppResult<User> {
        let now = self.clock.now();
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (id, email, hashed_password, full_name, role,
                 is_active, is_built_in, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .bind(full_name)
        .bind(role)
        .bind(is_built_in)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Update a user's fields. A `None` leaves the column unchanged.
    pub async fn update(
        &self,
        id: Uuid,
        email: Option<&str>,
        hashed_password: Option<&str>,
        full_name: Option<&str>,
        role: Option<UserRole>,
        is_active: Option<bool>,
    ) -> AppResult<User> {
        let now = self.clock.now();
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                hashed_password = COALESCE($3, hashed_password),
                full_name = COALESCE($4, full_name),
                role = COALESCE($5, role),
                is_active = COALESCE($6, is_active),
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(hashed_password)
        .bind(full_name)
        .bind(role)
        .bind(is_active)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {}", id)))
    }

    /// Delete a user
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {}", id)));
        }
        Ok(())
    }

    /// List users with filtering, sorting and pagination
    pub async fn list(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let size = query.size.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * size;

        let mut conditions: Vec<String> = Vec::new();
        let mut idx = 0;
        if query.role.is_some() {
            idx += 1;
            conditions.push(format!("role = ${}", idx));
        }
        if query.is_active.is_some() {
            idx += 1;
            conditions.push(format!("is_active = ${}", idx));
        }
        if query.search.is_some() {
            idx += 1;
            conditions.push(format!("(full_name ILIKE ${0} OR email ILIKE ${0})", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let search = query.search.as_ref().map(|s| format!("%{}%", s));

        let count_query = format!("SELECT COUNT(*) FROM users {}", where_clause);
        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(role) = query.role {
            count = count.bind(role);
        }
        if let Some(is_active) = query.is_active {
            count = count.bind(is_active);
        }
        if let Some(ref search) = search {
            count = count.bind(search);
        }
        let total = count.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT * FROM users {} {} LIMIT {} OFFSET {}",
            where_clause,
            order_clause(
                query.sort_by.as_deref().unwrap_or("created_at"),
                query.sort_order.as_deref().unwrap_or("desc"),
            ),
            size,
            offset
        );
        let mut select = sqlx::query_as::<_, User>(&select_query);
        if let Some(role) = query.role {
            select = select.bind(role);
        }
        if let Some(is_active) = query.is_active {
            select = select.bind(is_active);
        }
        if let Some(ref search) = search {
            select = select.bind(search);
        }
        let users = select.fetch_all(&self.pool).await?;

        Ok((users, total))
    }
}
