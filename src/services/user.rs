//! User service
//!
//! Registration, login/logout, session validation and profile management.
//! Emails are trimmed and lowercased before they reach storage; uniqueness is
//! ultimately decided by the database constraint, so two concurrent
//! registrations for one address cannot both succeed.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::db::StorageError;
use crate::models::{CreateUserInput, Session, UpdateProfileInput, User};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::Duration;
use serde::Deserialize;
use std::sync::Arc;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Email already registered
    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("User not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Login credentials
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Password change request
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

/// User service for managing users and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Create a new user service with custom session expiration
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// - `ValidationError` for a malformed email or a short password
    /// - `UserExists` if the email is already registered
    pub async fn register(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        let email = normalize_email(&input.email)?;
        validate_password(&input.password)?;
        let phone = normalize_phone(input.phone);

        if self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(email_taken(&email));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(email, phone, password_hash);

        let created = self
            .user_repo
            .create(&user)
            .await
            .map_err(|e| map_duplicate(e, &user.email))?;

        tracing::info!(user_id = %created.id, "Registered user");
        Ok(created)
    }

    /// Verify credentials and open a session.
    ///
    /// Unknown email and wrong password give the same error.
    pub async fn login(&self, input: LoginInput) -> Result<Session, UserServiceError> {
        let email = input.email.trim().to_lowercase();
        let invalid = || UserServiceError::AuthenticationError("Invalid email or password".to_string());

        let user = self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to get user by email")?
            .ok_or_else(invalid)?;

        let valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            tracing::debug!(user_id = %user.id, "Rejected login with wrong password");
            return Err(invalid());
        }

        self.create_session(&user.id).await
    }

    /// Open a new session for `user_id`
    pub async fn create_session(&self, user_id: &str) -> Result<Session, UserServiceError> {
        let session = Session::new(user_id, Duration::days(self.session_expiration_days));
        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;
        Ok(created)
    }

    /// Invalidate a session token
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Missing or expired sessions yield `None`; expired ones are removed.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to remove expired session: {:#}", e);
            }
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(&session.user_id)
            .await
            .context("Failed to get user")?;
        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?)
    }

    /// Change email and/or phone
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> Result<User, UserServiceError> {
        let email = input.email.as_deref().map(normalize_email).transpose()?;
        let update = UpdateProfileInput {
            email,
            phone: normalize_phone(input.phone),
        };

        if let Some(email) = &update.email {
            let existing = self
                .user_repo
                .get_by_email(email)
                .await
                .context("Failed to check email")?;
            if existing.is_some_and(|u| u.id != user_id) {
                return Err(email_taken(email));
            }
        }

        let attempted = update.email.clone().unwrap_or_default();
        self.user_repo
            .update_profile(user_id, &update)
            .await
            .map_err(|e| map_duplicate(e, &attempted))?
            .ok_or(UserServiceError::NotFound)
    }

    /// Replace the password after checking the current one
    pub async fn change_password(
        &self,
        user_id: &str,
        input: ChangePasswordInput,
    ) -> Result<(), UserServiceError> {
        let user = self.get_by_id(user_id).await?.ok_or(UserServiceError::NotFound)?;

        let valid = verify_password(&input.current_password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(UserServiceError::AuthenticationError(
                "Current password is incorrect".to_string(),
            ));
        }
        validate_password(&input.new_password)?;

        let password_hash =
            hash_password(&input.new_password).context("Failed to hash password")?;
        let updated = self
            .user_repo
            .update_password(user_id, &password_hash)
            .await
            .context("Failed to update password")?;
        if !updated {
            return Err(UserServiceError::NotFound);
        }

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Delete all expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }
}

fn email_taken(email: &str) -> UserServiceError {
    UserServiceError::UserExists(format!("Email '{}' is already registered", email))
}

/// Lift a storage-level duplicate into `UserExists`
fn map_duplicate(err: anyhow::Error, email: &str) -> UserServiceError {
    match StorageError::find(&err) {
        Some(StorageError::Duplicate(_)) => email_taken(email),
        None => UserServiceError::InternalError(err),
    }
}

/// Trim, lowercase and sanity-check an email address
pub fn normalize_email(email: &str) -> Result<String, UserServiceError> {
    let email = email.trim().to_lowercase();
    let invalid = || UserServiceError::ValidationError(format!("Invalid email address: '{}'", email));

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    Ok(email)
}

fn validate_password(password: &str) -> Result<(), UserServiceError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(UserServiceError::ValidationError(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn normalize_phone(phone: Option<String>) -> Option<String> {
    phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::db::Storage;
    use futures::future::join_all;
    use proptest::prelude::*;

    fn memory_service() -> UserService {
        let storage = Storage::in_memory();
        UserService::new(storage.users, storage.sessions)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        /// Of N concurrent registrations for the same email exactly one wins;
        /// every other attempt reports `UserExists`.
        #[test]
        fn concurrent_duplicate_registration_single_winner(
            local in "[a-z]{3,10}",
            attempts in 2usize..6
        ) {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(4)
                .enable_all()
                .build()
                .unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let service = Arc::new(memory_service());
                let email = format!("{}@example.com", local);

                let tasks = (0..attempts).map(|_| {
                    let service = service.clone();
                    let email = email.clone();
                    tokio::spawn(async move {
                        service
                            .register(CreateUserInput {
                                email,
                                phone: None,
                                password: "senha123".to_string(),
                            })
                            .await
                    })
                });
                let results: Vec<_> = join_all(tasks)
                    .await
                    .into_iter()
                    .map(|r| r.expect("task panicked"))
                    .collect();

                let winners = results.iter().filter(|r| r.is_ok()).count();
                let duplicates = results
                    .iter()
                    .filter(|r| matches!(r, Err(UserServiceError::UserExists(_))))
                    .count();
                prop_assert_eq!(winners, 1);
                prop_assert_eq!(duplicates, attempts - 1);
                Ok(())
            });
            result?;
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn normalized_email_is_lowercase_and_trimmed(
            local in "[a-zA-Z0-9._]{1,12}",
            domain in "[a-zA-Z]{1,10}",
            tld in "[a-z]{2,4}",
            pad in " {0,3}"
        ) {
            let raw = format!("{pad}{local}@{domain}.{tld}{pad}");
            let normalized = normalize_email(&raw).unwrap();
            prop_assert_eq!(normalized.clone(), normalized.to_lowercase());
            prop_assert_eq!(normalized.trim(), normalized.as_str());
        }
    }
}
