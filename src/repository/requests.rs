//! Loan requests repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        request::{LoanRequest, LoanRequestDetails, RequestStatus},
        user::User,
    },
};

/// Detail projection joining the request with its user and book. Column
/// aliases keep the three entities apart in the row.
const DETAILS_SELECT: &str = r#"
    SELECT r.id, r.status, r.request_date, r.return_date, r.comment,
           r.created_at, r.updated_at,
           u.id AS user_id, u.email AS user_email, u.password AS user_password,
           u.last_name AS user_last_name, u.first_name AS user_first_name,
           u.role AS user_role, u.created_at AS user_created_at,
           u.updated_at AS user_updated_at,
           b.id AS book_id, b.title AS book_title, b.author AS book_author,
           b.isbn AS book_isbn, b.description AS book_description,
           b.available AS book_available, b.created_at AS book_created_at,
           b.updated_at AS book_updated_at
    FROM loan_requests r
    JOIN users u ON r.user_id = u.id
    JOIN books b ON r.book_id = b.id
"#;

fn details_from_row(row: &PgRow) -> LoanRequestDetails {
    LoanRequestDetails {
        id: row.get("id"),
        user: User {
            id: row.get("user_id"),
            email: row.get("user_email"),
            password: row.get("user_password"),
            last_name: row.get("user_last_name"),
            first_name: row.get("user_first_name"),
            role: row.get("user_role"),
            created_at: row.get("user_created_at"),
            updated_at: row.get("user_updated_at"),
        },
        book: Book {
            id: row.get("book_id"),
            title: row.get("book_title"),
            author: row.get("book_author"),
            isbn: row.get("book_isbn"),
            description: row.get("book_description"),
            available: row.get("book_available"),
            created_at: row.get("book_created_at"),
            updated_at: row.get("book_updated_at"),
        },
        status: row.get("status"),
        request_date: row.get("request_date"),
        return_date: row.get("return_date"),
        comment: row.get("comment"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[derive(Clone)]
pub struct RequestsRepository {
    pool: Pool<Postgres>,
}

impl RequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get request by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<LoanRequest> {
        sqlx::query_as::<_, LoanRequest>("SELECT * FROM loan_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan request with id {} not found", id)))
    }

    /// Get request with its user and book embedded
    pub async fn get_details(&self, id: i32) -> AppResult<LoanRequestDetails> {
        let query = format!("{} WHERE r.id = $1", DETAILS_SELECT);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan request with id {} not found", id)))?;

        Ok(details_from_row(&row))
    }

    /// All requests, by id
    pub async fn list_all(&self) -> AppResult<Vec<LoanRequestDetails>> {
        let query = format!("{} ORDER BY r.id", DETAILS_SELECT);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(details_from_row).collect())
    }

    /// One user's requests, newest first
    pub async fn list_by_user(&self, user_id: i32) -> AppResult<Vec<LoanRequestDetails>> {
        let query = format!(
            "{} WHERE r.user_id = $1 ORDER BY r.created_at DESC",
            DETAILS_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(details_from_row).collect())
    }

    /// Create a pending request
    pub async fn create(&self, user_id: i32, book_id: i32) -> AppResult<LoanRequest> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO loan_requests (user_id, book_id, status, request_date)
            VALUES ($1, $2, $3, NOW())
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(RequestStatus::Pending)
        .fetch_one(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Apply a partial update computed by the workflow service. Runs on the
    /// caller's executor so it can share a transaction with the availability
    /// flip.
    pub async fn apply_update<'e, E>(
        &self,
        executor: E,
        id: i32,
        status: Option<RequestStatus>,
        return_date: Option<DateTime<Utc>>,
        comment: Option<String>,
    ) -> AppResult<()>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
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

        add_field!(status, "status");
        add_field!(return_date, "return_date");
        add_field!(comment, "comment");

        let query = format!(
            "UPDATE loan_requests SET {} WHERE id = ${}",
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

        bind_field!(status);
        bind_field!(return_date);
        bind_field!(comment);

        builder.bind(id).execute(executor).await?;

        Ok(())
    }

    /// Delete a request
    pub async fn delete<'e, E>(&self, executor: E, id: i32) -> AppResult<()>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM loan_requests WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Loan request with id {} not found",
                id
            )));
        }

        Ok(())
    }

    /// Total number of requests
    pub async fn count_all(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loan_requests")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Number of requests with the given status
    pub async fn count_by_status(&self, status: RequestStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loan_requests WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
