//! User repository
//!
//! - `UserRepository` trait defining user data access
//! - `SqlxUserRepository` implementing it for SQLite and MySQL
//!
//! Email uniqueness is left to the `UNIQUE` constraint on `users.email`; a
//! violation comes back as [`StorageError::Duplicate`] so that concurrent
//! registrations with the same address fail deterministically.

use crate::config::DatabaseDriver;
use crate::db::error::map_unique_violation;
use crate::db::{mysql_pool, sqlite_pool, DynDatabasePool, StorageError};
use crate::models::{UpdateProfileInput, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const USER_COLUMNS: &str = "id, email, phone, password_hash, created_at, updated_at";

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user; a taken email fails with [`StorageError::Duplicate`]
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get user by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Replace the password hash; `false` when the user does not exist
    async fn update_password(&self, id: &str, password_hash: &str) -> Result<bool>;

    /// Change email and/or phone.
    ///
    /// Returns `None` for a missing user. A taken email fails with
    /// [`StorageError::Duplicate`].
    async fn update_profile(&self, id: &str, input: &UpdateProfileInput) -> Result<Option<User>>;
}

/// SQLx-based user repository
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(sqlite_pool(&self.pool)?, user).await,
            DatabaseDriver::Mysql => create_user_mysql(mysql_pool(&self.pool)?, user).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(email)
                    .fetch_optional(sqlite_pool(&self.pool)?)
                    .await
                    .context("Failed to get user by email")?;
                Ok(row.as_ref().map(row_to_user_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(email)
                    .fetch_optional(mysql_pool(&self.pool)?)
                    .await
                    .context("Failed to get user by email")?;
                Ok(row.as_ref().map(row_to_user_mysql))
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(sqlite_pool(&self.pool)?)
                    .await
                    .context("Failed to get user by ID")?;
                Ok(row.as_ref().map(row_to_user_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(mysql_pool(&self.pool)?)
                    .await
                    .context("Failed to get user by ID")?;
                Ok(row.as_ref().map(row_to_user_mysql))
            }
        }
    }

    async fn update_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        let sql = "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?";
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(password_hash)
                .bind(now)
                .bind(id)
                .execute(sqlite_pool(&self.pool)?)
                .await
                .context("Failed to update password")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(password_hash)
                .bind(now)
                .bind(id)
                .execute(mysql_pool(&self.pool)?)
                .await
                .context("Failed to update password")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn update_profile(&self, id: &str, input: &UpdateProfileInput) -> Result<Option<User>> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_profile_sqlite(sqlite_pool(&self.pool)?, id, input).await?
            }
            DatabaseDriver::Mysql => update_profile_mysql(mysql_pool(&self.pool)?, id, input).await?,
        };

        if affected == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }
}

const INSERT_SQL: &str = r#"
    INSERT INTO users (id, email, phone, password_hash, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?)
"#;

const UPDATE_PROFILE_SQL: &str = r#"
    UPDATE users SET
        email = COALESCE(?, email),
        phone = COALESCE(?, phone),
        updated_at = ?
    WHERE id = ?
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    sqlx::query(INSERT_SQL)
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(pool)
        .await
        .map_err(|e| map_unique_violation(e, "email", "Failed to create user"))?;

    Ok(user.clone())
}

async fn update_profile_sqlite(
    pool: &SqlitePool,
    id: &str,
    input: &UpdateProfileInput,
) -> Result<u64> {
    let result = sqlx::query(UPDATE_PROFILE_SQL)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| map_unique_violation(e, "email", "Failed to update user profile"))?;

    Ok(result.rows_affected())
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        phone: row.get("phone"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    sqlx::query(INSERT_SQL)
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(pool)
        .await
        .map_err(|e| map_unique_violation(e, "email", "Failed to create user"))?;

    Ok(user.clone())
}

async fn update_profile_mysql(
    pool: &MySqlPool,
    id: &str,
    input: &UpdateProfileInput,
) -> Result<u64> {
    let result = sqlx::query(UPDATE_PROFILE_SQL)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| map_unique_violation(e, "email", "Failed to update user profile"))?;

    Ok(result.rows_affected())
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        phone: row.get("phone"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
