//! Repository layer for database operations

pub mod books;
pub mod branches;
pub mod loans;
pub mod tokens;
pub mod users;

use sqlx::{Pool, Postgres};

use crate::clock::{system_clock, SharedClock};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub branches: branches::BranchesRepository,
    pub books: books::BooksRepository,
    pub loans: loans::LoansRepository,
    pub tokens: tokens::TokensRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self::with_clock(pool, system_clock())
    }

    /// Create a repository with an explicit time source (tests)
    pub fn with_clock(pool: Pool<Postgres>, clock: SharedClock) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone(), clock.clone()),
            branches: branches::BranchesRepository::new(pool.clone(), clock.clone()),
            books: books::BooksRepository::new(pool.clone(), clock.clone()),
            loans: loans::LoansRepository::new(pool.clone(), clock.clone()),
            tokens: tokens::TokensRepository::new(pool.clone(), clock),
            pool,
        }
    }
}
