//! Book catalog service

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List catalog entries with optional filters, newest first
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.list(query).await
    }

    /// Get a single book
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Add a book to the catalog
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        let book = self.repository.books.create(&book).await?;

        tracing::info!("Added book {} ('{}') to the catalog", book.id, book.title);

        Ok(book)
    }

    /// Update a book; only provided fields are applied
    pub async fn update_book(&self, id: i32, book: UpdateBook) -> AppResult<Book> {
        self.repository.books.update(id, &book).await
    }

    /// Remove a book. Refused while loan requests still reference it.
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await
    }
}
