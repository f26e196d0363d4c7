//! Book catalog service

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn create_book(&self, book: CreateBook, actor_id: Uuid) -> AppResult<Book> {
        // The branch must exist before cataloging against it
        self.repository.branches.get_by_id(book.branch_id).await?;
        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = %created.id, title = %created.title, actor_id = %actor_id, "book created");
        Ok(created)
    }

    pub async fn get_book(&self, book_id: Uuid) -> AppResult<Book> {
        self.repository.books.get_by_id(book_id).await
    }

    pub async fn update_book(
        &self,
        book_id: Uuid,
        update: UpdateBook,
        actor_id: Uuid,
    ) -> AppResult<Book> {
        let updated = self.repository.books.update(book_id, &update).await?;
        tracing::info!(book_id = %book_id, actor_id = %actor_id, "book updated");
        Ok(updated)
    }

    pub async fn delete_book(&self, book_id: Uuid, actor_id: Uuid) -> AppResult<()> {
        self.repository.books.delete(book_id).await?;
        tracing::info!(book_id = %book_id, actor_id = %actor_id, "book deleted");
        Ok(())
    }

    pub async fn list_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.list(query).await
    }
}
