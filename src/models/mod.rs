//! Data models for Libris

pub mod book;
pub mod branch;
pub mod loan;
pub mod user;

// Re-export commonly used types
pub use book::Book;
pub use branch::Branch;
pub use loan::{Loan, LoanStatus, LoanStatusHistory};
pub use user::{User, UserRole};
