//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, RegisterUser, Role, UpdateUser, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new member account. The role is always USER; any role in
    /// the payload was discarded before this point.
    pub async fn register(&self, user: RegisterUser) -> AppResult<User> {
        if self
            .repository
            .users
            .email_exists(&user.email, None)
            .await?
        {
            return Err(AppError::AlreadyExists("Email already in use".to_string()));
        }

        let password = self.hash_password(&user.password)?;

        let user = self
            .repository
            .users
            .create(
                &user.email,
                &password,
                &user.last_name,
                &user.first_name,
                Role::User,
            )
            .await?;

        tracing::info!("Registered new user {} ({})", user.id, user.email);

        Ok(user)
    }

    /// Authenticate by email and password and return a JWT with the account
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        let token = self.create_token_for_user(&user)?;

        Ok((token, user))
    }

    /// Create JWT token for a user
    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.id,
            role: user.role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify user password
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// List all users
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }

    /// Create a new user; the payload may set the role
    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        if self
            .repository
            .users
            .email_exists(&user.email, None)
            .await?
        {
            return Err(AppError::AlreadyExists("Email already in use".to_string()));
        }

        let password = self.hash_password(&user.password)?;
        let role = user.role.unwrap_or(Role::User);

        self.repository
            .users
            .create(
                &user.email,
                &password,
                &user.last_name,
                &user.first_name,
                role,
            )
            .await
    }

    /// Update an existing user
    pub async fn update_user(&self, id: i32, user: UpdateUser) -> AppResult<User> {
        // Surface unknown ids before the uniqueness check
        self.repository.users.get_by_id(id).await?;

        if let Some(ref email) = user.email {
            if self.repository.users.email_exists(email, Some(id)).await? {
                return Err(AppError::AlreadyExists("Email already in use".to_string()));
            }
        }

        let password = if let Some(ref password) = user.password {
            Some(self.hash_password(password)?)
        } else {
            None
        };

        self.repository.users.update(id, &user, password).await
    }

    /// Delete a user. The FK cascade removes their loan requests without
    /// restoring book availability; an admin deletes the requests explicitly
    /// first when the books must come back.
    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        self.repository.users.delete(id).await?;

        tracing::info!("Deleted user {} and their loan requests", id);

        Ok(())
    }
}
