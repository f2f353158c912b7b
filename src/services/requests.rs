//! Loan request workflow service
//!
//! The only place that flips book availability as a side effect. Status
//! changes go through `RequestStatus::transition_effects`; availability
//! writes go through `BooksRepository::set_availability`, in the same
//! transaction as the request-row write.

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::request::{CreateLoanRequest, LoanRequestDetails, RequestStatus, UpdateLoanRequest},
    repository::Repository,
};

#[derive(Clone)]
pub struct RequestsService {
    repository: Repository,
}

impl RequestsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Open a request for a book on behalf of a member. The book must exist
    /// and be available; the new request starts pending and does not reserve
    /// the book.
    pub async fn create_request(
        &self,
        user_id: i32,
        payload: &CreateLoanRequest,
    ) -> AppResult<LoanRequestDetails> {
        let book = self.repository.books.get_by_id(payload.book_id).await?;

        if !book.available {
            return Err(AppError::NotAvailable(format!(
                "Book '{}' is not available for loan",
                book.title
            )));
        }

        let request = self.repository.requests.create(user_id, book.id).await?;

        tracing::info!(
            "User {} opened loan request {} for book {}",
            user_id,
            request.id,
            book.id
        );

        self.repository.requests.get_details(request.id).await
    }

    /// List requests: admins see everything, members only their own
    pub async fn list_requests(
        &self,
        viewer_id: i32,
        is_admin: bool,
    ) -> AppResult<Vec<LoanRequestDetails>> {
        if is_admin {
            self.repository.requests.list_all().await
        } else {
            self.repository.requests.list_by_user(viewer_id).await
        }
    }

    /// Get one request. A member asking for someone else's request gets
    /// not-found; existence is not revealed.
    pub async fn get_request(
        &self,
        id: i32,
        viewer_id: i32,
        is_admin: bool,
    ) -> AppResult<LoanRequestDetails> {
        let details = self.repository.requests.get_details(id).await?;

        if !is_admin && details.user.id != viewer_id {
            return Err(AppError::NotFound(format!(
                "Loan request with id {} not found",
                id
            )));
        }

        Ok(details)
    }

    /// Apply an admin update: an optional status transition plus an optional
    /// comment overwrite. A status equal to the current one is a no-op; the
    /// comment applies either way.
    pub async fn update_request(
        &self,
        id: i32,
        payload: UpdateLoanRequest,
    ) -> AppResult<LoanRequestDetails> {
        let request = self.repository.requests.get_by_id(id).await?;

        let mut new_status = None;
        let mut return_date: Option<DateTime<Utc>> = None;
        let mut book_available = None;

        if let Some(status) = payload.status {
            if status != request.status {
                if !request.status.is_transition_allowed(status) {
                    return Err(AppError::BadRequest(format!(
                        "Transition {} -> {} is not allowed",
                        request.status, status
                    )));
                }

                let effects = request.status.transition_effects(status);
                book_available = effects.set_book_available;
                if effects.set_return_date {
                    return_date = Some(Utc::now());
                }
                new_status = Some(status);
            }
        }

        if new_status.is_none() && payload.comment.is_none() {
            // Nothing to write; serve the current state
            return self.repository.requests.get_details(id).await;
        }

        // The availability flip and the request update commit together
        let mut tx = self.repository.pool.begin().await?;

        if let Some(available) = book_available {
            self.repository
                .books
                .set_availability(&mut *tx, request.book_id, available)
                .await?;
        }

        self.repository
            .requests
            .apply_update(&mut *tx, id, new_status, return_date, payload.comment)
            .await?;

        tx.commit().await?;

        if let Some(status) = new_status {
            tracing::info!(
                "Loan request {} moved from {} to {}",
                id,
                request.status,
                status
            );
        }

        self.repository.requests.get_details(id).await
    }

    /// Delete a request. An approved request frees its book on the way out;
    /// any other status leaves availability untouched. The compensation and
    /// the delete commit together.
    pub async fn delete_request(&self, id: i32) -> AppResult<()> {
        let request = self.repository.requests.get_by_id(id).await?;

        let mut tx = self.repository.pool.begin().await?;

        if request.status == RequestStatus::Approved {
            self.repository
                .books
                .set_availability(&mut *tx, request.book_id, true)
                .await?;
        }

        self.repository.requests.delete(&mut *tx, id).await?;

        tx.commit().await?;

        Ok(())
    }
}
