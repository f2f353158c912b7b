//! Loan request endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::request::{CreateLoanRequest, LoanRequestDetails, UpdateLoanRequest},
};

use super::AuthenticatedUser;

/// List loan requests (admins see all, members only their own)
#[utoipa::path(
    get,
    path = "/demandes",
    tag = "demandes",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of loan requests", body = Vec<LoanRequestDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanRequestDetails>>> {
    let requests = state
        .services
        .requests
        .list_requests(claims.user_id, claims.is_admin())
        .await?;

    Ok(Json(requests))
}

/// Get loan request details by ID
#[utoipa::path(
    get,
    path = "/demandes/{id}",
    tag = "demandes",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan request ID")
    ),
    responses(
        (status = 200, description = "Loan request details", body = LoanRequestDetails),
        (status = 404, description = "Loan request not found")
    )
)]
pub async fn get_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LoanRequestDetails>> {
    let details = state
        .services
        .requests
        .get_request(id, claims.user_id, claims.is_admin())
        .await?;

    Ok(Json(details))
}

/// Open a loan request for a book
#[utoipa::path(
    post,
    path = "/demandes",
    tag = "demandes",
    security(("bearer_auth" = [])),
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan request created", body = LoanRequestDetails),
        (status = 400, description = "Book is not available"),
        (status = 403, description = "Administrators cannot create loan requests"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<LoanRequestDetails>)> {
    claims.require_user()?;
    payload.validate()?;

    let details = state
        .services
        .requests
        .create_request(claims.user_id, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(details)))
}

/// Update a loan request's status or comment
#[utoipa::path(
    put,
    path = "/demandes/{id}",
    tag = "demandes",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan request ID")
    ),
    request_body = UpdateLoanRequest,
    responses(
        (status = 200, description = "Loan request updated", body = LoanRequestDetails),
        (status = 400, description = "Transition not allowed"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Loan request not found")
    )
)]
pub async fn update_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateLoanRequest>,
) -> AppResult<Json<LoanRequestDetails>> {
    claims.require_admin()?;
    payload.validate()?;

    let details = state.services.requests.update_request(id, payload).await?;
    Ok(Json(details))
}

/// Delete a loan request
#[utoipa::path(
    delete,
    path = "/demandes/{id}",
    tag = "demandes",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan request ID")
    ),
    responses(
        (status = 204, description = "Loan request deleted"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Loan request not found")
    )
)]
pub async fn delete_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.requests.delete_request(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
