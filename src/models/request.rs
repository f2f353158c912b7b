//! Loan request model and the status workflow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

use super::book::Book;
use super::datetime;
use super::user::User;

/// Loan request lifecycle status. The wire and storage form is the French
/// slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RequestStatus {
    #[serde(rename = "en_attente")]
    Pending,
    #[serde(rename = "approuvee")]
    Approved,
    #[serde(rename = "refusee")]
    Rejected,
    #[serde(rename = "retournee")]
    Returned,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "en_attente",
            RequestStatus::Approved => "approuvee",
            RequestStatus::Rejected => "refusee",
            RequestStatus::Returned => "retournee",
        }
    }

    /// Whether a request may move from `self` to `next`.
    ///
    /// Every pair is accepted, including moves like returned -> pending; the
    /// admin screens are trusted to issue sensible updates. Tightening the
    /// policy only requires changing this function.
    pub fn is_transition_allowed(self, _next: RequestStatus) -> bool {
        true
    }

    /// Side effects of moving from `self` to `next` on the referenced book
    /// and the request itself. No-op when the status does not change.
    pub fn transition_effects(self, next: RequestStatus) -> TransitionEffects {
        if next == self {
            return TransitionEffects::default();
        }
        match next {
            RequestStatus::Approved => TransitionEffects {
                set_book_available: Some(false),
                set_return_date: false,
            },
            RequestStatus::Returned => TransitionEffects {
                set_book_available: Some(true),
                set_return_date: true,
            },
            // A rejection only frees the book if the loan had been granted
            RequestStatus::Rejected if self == RequestStatus::Approved => TransitionEffects {
                set_book_available: Some(true),
                set_return_date: false,
            },
            _ => TransitionEffects::default(),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en_attente" => Ok(RequestStatus::Pending),
            "approuvee" => Ok(RequestStatus::Approved),
            "refusee" => Ok(RequestStatus::Rejected),
            "retournee" => Ok(RequestStatus::Returned),
            _ => Err(format!("Invalid request status: {}", s)),
        }
    }
}

// SQLx conversion for RequestStatus (stored as VARCHAR)
impl sqlx::Type<Postgres> for RequestStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for RequestStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for RequestStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Side effects implied by a status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransitionEffects {
    /// New value for the book's availability flag, when it changes
    pub set_book_available: Option<bool>,
    /// Stamp the request's return date with the current time
    pub set_return_date: bool,
}

/// Loan request as stored
#[derive(Debug, Clone, FromRow)]
pub struct LoanRequest {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub status: RequestStatus,
    pub request_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Loan request with its user and book embedded, as served to clients
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanRequestDetails {
    pub id: i32,
    pub user: User,
    #[serde(rename = "livre")]
    pub book: Book,
    #[serde(rename = "statut")]
    pub status: RequestStatus,
    #[serde(rename = "dateDemande", with = "datetime::timestamp")]
    #[schema(value_type = String, example = "2026-02-03 14:30:05")]
    pub request_date: DateTime<Utc>,
    #[serde(rename = "dateRetour", with = "datetime::timestamp_option")]
    #[schema(value_type = Option<String>, example = "2026-02-10 09:00:00")]
    pub return_date: Option<DateTime<Utc>>,
    #[serde(rename = "commentaire")]
    pub comment: Option<String>,
    #[serde(rename = "createdAt", with = "datetime::timestamp")]
    #[schema(value_type = String, example = "2026-02-03 14:30:05")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "datetime::timestamp")]
    #[schema(value_type = String, example = "2026-02-03 14:30:05")]
    pub updated_at: DateTime<Utc>,
}

/// Create loan request payload
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLoanRequest {
    #[serde(rename = "livreId")]
    #[validate(range(min = 1, message = "A valid book id is required"))]
    pub book_id: i32,
}

/// Admin-side request update: a new status and/or a comment. A provided
/// comment overwrites the stored one regardless of any status change.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateLoanRequest {
    #[serde(rename = "statut")]
    pub status: Option<RequestStatus>,
    #[serde(rename = "commentaire")]
    pub comment: Option<String>,
}
