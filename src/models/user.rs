//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

use super::datetime;

/// Account role. Closed set; the wire and storage form is the
/// `ROLE_`-prefixed string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Admin => "ROLE_ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_USER" => Ok(Role::User),
            "ROLE_ADMIN" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// SQLx conversion for Role (stored as VARCHAR)
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Account as stored. The password hash never serializes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(rename = "nom")]
    pub last_name: String,
    #[serde(rename = "prenom")]
    pub first_name: String,
    pub role: Role,
    #[serde(rename = "createdAt", with = "datetime::timestamp")]
    #[schema(value_type = String, example = "2026-02-03 14:30:05")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "datetime::timestamp")]
    #[schema(value_type = String, example = "2026-02-03 14:30:05")]
    pub updated_at: DateTime<Utc>,
}

/// Self-service registration. The role is always USER; any submitted role is
/// ignored.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(
        email(message = "Invalid email format"),
        length(max = 180, message = "Email must be at most 180 characters")
    )]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(rename = "nom")]
    #[validate(length(min = 1, max = 100, message = "Last name is required (max 100 characters)"))]
    pub last_name: String,
    #[serde(rename = "prenom")]
    #[validate(length(min = 1, max = 100, message = "First name is required (max 100 characters)"))]
    pub first_name: String,
}

/// Admin-side account creation; may set the role
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(
        email(message = "Invalid email format"),
        length(max = 180, message = "Email must be at most 180 characters")
    )]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(rename = "nom")]
    #[validate(length(min = 1, max = 100, message = "Last name is required (max 100 characters)"))]
    pub last_name: String,
    #[serde(rename = "prenom")]
    #[validate(length(min = 1, max = 100, message = "First name is required (max 100 characters)"))]
    pub first_name: String,
    pub role: Option<Role>,
}

/// Admin-side account update; only provided fields are applied
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(
        email(message = "Invalid email format"),
        length(max = 180, message = "Email must be at most 180 characters")
    )]
    pub email: Option<String>,
    /// Re-hashed before storage when provided
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    #[serde(rename = "nom")]
    #[validate(length(min = 1, max = 100, message = "Last name cannot be empty (max 100 characters)"))]
    pub last_name: Option<String>,
    #[serde(rename = "prenom")]
    #[validate(length(min = 1, max = 100, message = "First name cannot be empty (max 100 characters)"))]
    pub first_name: Option<String>,
    pub role: Option<Role>,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Check if user is admin
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Administrator privileges required".to_string(),
            ))
        }
    }

    /// Require a regular member account. Loan requests are member-initiated;
    /// administrators manage them but do not open them.
    pub fn require_user(&self) -> Result<(), AppError> {
        if self.role == Role::User {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Administrators cannot create loan requests".to_string(),
            ))
        }
    }
}
