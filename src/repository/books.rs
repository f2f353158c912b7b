//! Books repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{is_foreign_key_violation, is_unique_violation, AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// List books, newest first, with optional filters
    pub async fn list(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref title) = query.title {
            params.push(format!("%{}%", title));
            conditions.push(format!("title ILIKE ${}", params.len()));
        }

        if let Some(ref author) = query.author {
            params.push(format!("%{}%", author));
            conditions.push(format!("author ILIKE ${}", params.len()));
        }

        if let Some(available) = query.available {
            conditions.push(format!("available = {}", available));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let select_query = format!(
            "SELECT * FROM books {} ORDER BY created_at DESC",
            where_clause
        );

        let mut builder = sqlx::query_as::<_, Book>(&select_query);
        for param in &params {
            builder = builder.bind(param);
        }
        let books = builder.fetch_all(&self.pool).await?;

        Ok(books)
    }

    /// Create a new book
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO books (title, author, isbn, description, available)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.description)
        .bind(book.available)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::AlreadyExists("A book with this ISBN already exists".to_string())
            } else {
                e.into()
            }
        })?;

        self.get_by_id(id).await
    }

    /// Update an existing book
    pub async fn update(&self, id: i32, book: &UpdateBook) -> AppResult<Book> {
        let now = Utc::now();

        // Build dynamic update query
        let mut sets = vec!["updated_at = $1".to_string()];
        let mut param_idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, param_idx));
                    param_idx += 1;
                }
            };
        }

        add_field!(book.title, "title");
        add_field!(book.author, "author");
        add_field!(book.isbn, "isbn");
        add_field!(book.description, "description");
        add_field!(book.available, "available");

        let query = format!(
            "UPDATE books SET {} WHERE id = ${}",
            sets.join(", "),
            param_idx
        );

        let mut builder = sqlx::query(&query).bind(now);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(book.title);
        bind_field!(book.author);
        bind_field!(book.isbn);
        bind_field!(book.description);
        bind_field!(book.available);

        builder.bind(id).execute(&self.pool).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::AlreadyExists("A book with this ISBN already exists".to_string())
            } else {
                AppError::from(e)
            }
        })?;

        self.get_by_id(id).await
    }

    /// Set only the availability flag. Outside catalog updates, the loan
    /// workflow is the single caller; it passes its own transaction so the
    /// flip commits together with the request write.
    pub async fn set_availability<'e, E>(
        &self,
        executor: E,
        id: i32,
        available: bool,
    ) -> AppResult<()>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE books SET available = $1, updated_at = NOW() WHERE id = $2")
            .bind(available)
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Delete a book. Blocked while loan requests reference it.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::Conflict(
                        "Book is referenced by loan requests and cannot be deleted".to_string(),
                    )
                } else {
                    AppError::from(e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        Ok(())
    }

    /// Total number of books
    pub async fn count_all(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Number of books currently unavailable (on loan)
    pub async fn count_unavailable(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE available = FALSE")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
