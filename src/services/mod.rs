//! Business logic services

pub mod auth;
pub mod books;
pub mod branches;
pub mod loans;
pub mod overdue;
pub mod users;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub users: users::UsersService,
    pub branches: branches::BranchesService,
    pub books: books::BooksService,
    pub loans: loans::LoansService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        let auth = auth::AuthService::new(repository.clone(), auth_config);
        Self {
            users: users::UsersService::new(repository.clone(), auth.clone()),
            branches: branches::BranchesService::new(repository.clone()),
            books: books::BooksService::new(repository.clone()),
            loans: loans::LoansService::new(repository),
            auth,
        }
    }
}
