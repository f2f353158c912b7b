//! Statistics service

use crate::{
    api::stats::LibraryStats, error::AppResult, models::request::RequestStatus,
    repository::Repository,
};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Recompute the library-wide aggregate from storage. Nothing is cached;
    /// every call counts afresh.
    pub async fn get_stats(&self) -> AppResult<LibraryStats> {
        let total_books = self.repository.books.count_all().await?;
        let books_on_loan = self.repository.books.count_unavailable().await?;
        let total_users = self.repository.users.count_all().await?;
        let total_requests = self.repository.requests.count_all().await?;
        let requests_pending = self
            .repository
            .requests
            .count_by_status(RequestStatus::Pending)
            .await?;
        let requests_approved = self
            .repository
            .requests
            .count_by_status(RequestStatus::Approved)
            .await?;
        let requests_rejected = self
            .repository
            .requests
            .count_by_status(RequestStatus::Rejected)
            .await?;

        Ok(LibraryStats {
            total_books,
            books_on_loan,
            books_available: total_books - books_on_loan,
            total_users,
            total_requests,
            requests_pending,
            requests_approved,
            requests_rejected,
        })
    }
}
