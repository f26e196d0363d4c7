//! Library branches repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    clock::SharedClock,
    error::{AppError, AppResult},
    models::branch::{Branch, BranchQuery, CreateBranch, UpdateBranch},
};

fn order_clause(sort_by: &str, sort_order: &str) -> String {
    let column = match sort_by {
        "name" | "created_at" => sort_by,
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
pub struct BranchesRepository {
    pool: Pool<Postgres>,
    clock: SharedClock,
}

impl BranchesRepository {
    pub fn new(pool: Pool<Postgres>, clock: SharedClock) -> Self {
        Self { pool, clock }
    }

    /// Get branch by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Branch> {
        sqlx::query_as::<_, Branch>("SELECT * FROM library_branches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Branch with id {}", id)))
    }

    /// Create a new branch
    pub async fn create(&self, branch: &CreateBranch) -> AppResult<Branch> {
        let now = self.clock.now();
        let created = sqlx::query_as::<_, Branch>(
            r#"
            INSERT INTO library_branches
                (id, name, address, description, phone_number, email,
                 is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&branch.name)
        .bind(&branch.address)
        .bind(&branch.description)
        .bind(&branch.phone_number)
        .bind(&branch.email)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Update a branch
    pub async fn update(&self, id: Uuid, update: &UpdateBranch) -> AppResult<Branch> {
        let now = self.clock.now();
        sqlx::query_as::<_, Branch>(
            r#"
            UPDATE library_branches
            SET name = COALESCE($2, name),
                address = COALESCE($3, address),
                description = COALESCE($4, description),
                phone_number = COALESCE($5, phone_number),
                email = COALESCE($6, email),
                is_active = COALESCE($7, is_active),
                updated_at = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.address)
        .bind(&update.description)
        .bind(&update.phone_number)
        .bind(&update.email)
        .bind(update.is_active)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Branch with id {}", id)))
    }

    /// Delete a branch
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let deleted = sqlx::query("DELETE FROM library_branches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Branch with id {}", id)));
        }
        Ok(())
    }

    /// List branches with filtering, sorting and pagination
    pub async fn list(&self, query: &BranchQuery) -> AppResult<(Vec<Branch>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let size = query.size.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * size;

        let mut conditions: Vec<String> = Vec::new();
        let mut idx = 0;
        if query.is_active.is_some() {
            idx += 1;
            conditions.push(format!("is_active = ${}", idx));
        }
        if query.search.is_some() {
            idx += 1;
            conditions.push(format!("(name ILIKE ${0} OR address ILIKE ${0})", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let search = query.search.as_ref().map(|s| format!("%{}%", s));

        let count_query = format!("SELECT COUNT(*) FROM library_branches {}", where_clause);
        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(is_active) = query.is_active {
            count = count.bind(is_active);
        }
        if let Some(ref search) = search {
            count = count.bind(search);
        }
        let total = count.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT * FROM library_branches {} {} LIMIT {} OFFSET {}",
            where_clause,
            order_clause(
                query.sort_by.as_deref().unwrap_or("created_at"),
                query.sort_order.as_deref().unwrap_or("desc"),
            ),
            size,
            offset
        );
        let mut select = sqlx::query_as::<_, Branch>(&select_query);
        if let Some(is_active) = query.is_active {
            select = select.bind(is_active);
        }
        if let Some(ref search) = search {
            select = select.bind(search);
        }
        let branches = select.fetch_all(&self.pool).await?;

        Ok((branches, total))
    }
}
