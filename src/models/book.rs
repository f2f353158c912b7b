//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::datetime;

/// Catalog entry. Availability is only flipped by the loan workflow and by
/// explicit admin updates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(rename = "auteur")]
    pub author: String,
    pub isbn: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "disponible")]
    pub available: bool,
    #[serde(rename = "createdAt", with = "datetime::timestamp")]
    #[schema(value_type = String, example = "2026-02-03 14:30:05")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "datetime::timestamp")]
    #[schema(value_type = String, example = "2026-02-03 14:30:05")]
    pub updated_at: DateTime<Utc>,
}

/// Catalog list filters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive title substring
    #[serde(rename = "titre")]
    pub title: Option<String>,
    /// Case-insensitive author substring
    #[serde(rename = "auteur")]
    pub author: Option<String>,
    /// Exact availability match
    #[serde(rename = "disponible")]
    pub available: Option<bool>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[serde(rename = "titre")]
    #[validate(length(min = 1, max = 255, message = "Title is required (max 255 characters)"))]
    pub title: String,
    #[serde(rename = "auteur")]
    #[validate(length(min = 1, max = 255, message = "Author is required (max 255 characters)"))]
    pub author: String,
    #[validate(length(max = 20, message = "ISBN must be at most 20 characters"))]
    pub isbn: Option<String>,
    pub description: Option<String>,
    /// Defaults to true when omitted
    #[serde(rename = "disponible", default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// Update book request; only provided fields are applied
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[serde(rename = "titre")]
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty (max 255 characters)"))]
    pub title: Option<String>,
    #[serde(rename = "auteur")]
    #[validate(length(min = 1, max = 255, message = "Author cannot be empty (max 255 characters)"))]
    pub author: Option<String>,
    #[validate(length(max = 20, message = "ISBN must be at most 20 characters"))]
    pub isbn: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "disponible")]
    pub available: Option<bool>,
}
