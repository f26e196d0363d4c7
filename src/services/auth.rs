//! Authentication service: registration, login, token lifecycle

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{User, UserClaims, UserRole},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new member account
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> AppResult<User> {
        if self.repository.users.get_by_email(email).await?.is_some() {
            return Err(AppError::Validation(
                "A user with this email already exists".to_string(),
            ));
        }

        let hashed = self.hash_password(password)?;
        let user = self
            .repository
            .users
            .create(email, &hashed, full_name, UserRole::Member, false)
            .await?;

        tracing::info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Authenticate credentials and issue an access token
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(User, String)> {
        let invalid = || AppError::Authentication("Invalid email or password".to_string());

        let user = self
            .repository
            .users
            .get_by_email(email)
            .await?
            .ok_or_else(invalid)?;

        if !user.is_active {
            tracing::warn!(email = %email, "login rejected: inactive account");
            return Err(AppError::Forbidden("User account is inactive".to_string()));
        }

        if !self.verify_password(&user, password)? {
            tracing::warn!(email = %email, "login rejected: wrong password");
            return Err(invalid());
        }

        let token = self.create_token_for_user(&user)?;
        tracing::info!(user_id = %user.id, email = %email, "login successful");
        Ok((user, token))
    }

    /// Blacklist the current token's jti until its expiry
    pub async fn logout(&self, claims: &UserClaims) -> AppResult<()> {
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| AppError::Internal("Invalid token expiry".to_string()))?;
        self.repository.tokens.blacklist(claims.jti, expires_at).await?;
        tracing::info!(jti = %claims.jti, "token blacklisted");
        Ok(())
    }

    /// Resolve the user behind a set of verified claims.
    ///
    /// Rejects blacklisted tokens, missing users and inactive accounts.
    pub async fn current_user(&self, claims: &UserClaims) -> AppResult<User> {
        if self.repository.tokens.is_blacklisted(claims.jti).await? {
            tracing::warn!(jti = %claims.jti, "blacklisted token used");
            return Err(AppError::Authentication(
                "Could not validate credentials".to_string(),
            ));
        }

        let user = self
            .repository
            .users
            .get_by_id(claims.sub)
            .await
            .map_err(|_| AppError::Authentication("Could not validate credentials".to_string()))?;

        if !user.is_active {
            return Err(AppError::Forbidden("User account is inactive".to_string()));
        }
        Ok(user)
    }

    /// Create the built-in admin account if it doesn't exist
    pub async fn seed_admin(&self) -> AppResult<()> {
        let email = self.config.admin_email.clone();
        if self.repository.users.get_by_email(&email).await?.is_some() {
            tracing::info!(email = %email, "built-in admin already exists");
            return Ok(());
        }

        let hashed = self.hash_password(&self.config.admin_password)?;
        self.repository
            .users
            .create(&email, &hashed, "System Administrator", UserRole::Admin, true)
            .await?;
        tracing::info!(email = %email, "built-in admin created");
        Ok(())
    }

    pub fn decode_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = UserClaims {
            sub: user.id,
            role: user.role,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.config.jwt_expiration_minutes)).timestamp(),
        };
        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.hashed_password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
