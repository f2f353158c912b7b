//! Statistics endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;

use super::AuthenticatedUser;

/// Library-wide aggregate counters
#[derive(Debug, Serialize, ToSchema)]
pub struct LibraryStats {
    /// Total number of books in the catalog
    #[serde(rename = "total_livres")]
    pub total_books: i64,
    /// Books currently unavailable
    #[serde(rename = "livres_empruntes")]
    pub books_on_loan: i64,
    /// Books currently available
    #[serde(rename = "livres_disponibles")]
    pub books_available: i64,
    /// Total number of registered users
    #[serde(rename = "total_utilisateurs")]
    pub total_users: i64,
    /// Total number of loan requests
    #[serde(rename = "total_demandes")]
    pub total_requests: i64,
    /// Requests waiting for a decision
    #[serde(rename = "demandes_en_attente")]
    pub requests_pending: i64,
    /// Requests that were approved
    #[serde(rename = "demandes_approuvees")]
    pub requests_approved: i64,
    /// Requests that were rejected
    #[serde(rename = "demandes_refusees")]
    pub requests_rejected: i64,
}

/// Get library-wide statistics
#[utoipa::path(
    get,
    path = "/statistiques",
    tag = "statistiques",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Library statistics", body = LibraryStats),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<LibraryStats>> {
    claims.require_admin()?;

    let stats = state.services.stats.get_stats().await?;
    Ok(Json(stats))
}
