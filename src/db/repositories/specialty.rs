//! Specialty repository
//!
//! - `SpecialtyRepository` trait defining specialty data access
//! - `SqlxSpecialtyRepository` implementing it for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::{mysql_pool, sqlite_pool, DynDatabasePool};
use crate::models::Specialty;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const INSERT_SPECIALTY_SQL: &str = "INSERT INTO specialties (id, name, image_url) VALUES (?, ?, ?)";

/// Specialty repository trait
#[async_trait]
pub trait SpecialtyRepository: Send + Sync {
    /// All specialties ordered by name
    async fn list(&self) -> Result<Vec<Specialty>>;

    /// Get specialty by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<Specialty>>;

    /// Insert a specialty
    async fn create(&self, specialty: &Specialty) -> Result<Specialty>;

    /// Insert every specialty or none of them
    async fn create_many(&self, specialties: &[Specialty]) -> Result<()>;

    /// Set the illustration URL and nothing else.
    ///
    /// Returns `false` when no specialty has this ID.
    async fn update_image(&self, id: &str, image_url: &str) -> Result<bool>;

    /// Number of stored specialties
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based specialty repository
pub struct SqlxSpecialtyRepository {
    pool: DynDatabasePool,
}

impl SqlxSpecialtyRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SpecialtyRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SpecialtyRepository for SqlxSpecialtyRepository {
    async fn list(&self) -> Result<Vec<Specialty>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_specialties_sqlite(sqlite_pool(&self.pool)?).await,
            DatabaseDriver::Mysql => list_specialties_mysql(mysql_pool(&self.pool)?).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Specialty>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_specialty_sqlite(sqlite_pool(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_specialty_mysql(mysql_pool(&self.pool)?, id).await,
        }
    }

    async fn create(&self, specialty: &Specialty) -> Result<Specialty> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_specialty_sqlite(sqlite_pool(&self.pool)?, specialty).await
            }
            DatabaseDriver::Mysql => {
                create_specialty_mysql(mysql_pool(&self.pool)?, specialty).await
            }
        }
    }

    async fn create_many(&self, specialties: &[Specialty]) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_specialties_sqlite(sqlite_pool(&self.pool)?, specialties).await
            }
            DatabaseDriver::Mysql => {
                create_specialties_mysql(mysql_pool(&self.pool)?, specialties).await
            }
        }
    }

    async fn update_image(&self, id: &str, image_url: &str) -> Result<bool> {
        let sql = "UPDATE specialties SET image_url = ? WHERE id = ?";
        let result = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(image_url)
                .bind(id)
                .execute(sqlite_pool(&self.pool)?)
                .await
                .context("Failed to update specialty image")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(image_url)
                .bind(id)
                .execute(mysql_pool(&self.pool)?)
                .await
                .context("Failed to update specialty image")?
                .rows_affected(),
        };
        Ok(result > 0)
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS n FROM specialties";
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .fetch_one(sqlite_pool(&self.pool)?)
                .await
                .context("Failed to count specialties")?
                .get("n"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .fetch_one(mysql_pool(&self.pool)?)
                .await
                .context("Failed to count specialties")?
                .get("n"),
        };
        Ok(count)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_specialties_sqlite(pool: &SqlitePool) -> Result<Vec<Specialty>> {
    let rows = sqlx::query("SELECT id, name, image_url FROM specialties ORDER BY name")
        .fetch_all(pool)
        .await
        .context("Failed to list specialties")?;

    Ok(rows.iter().map(row_to_specialty_sqlite).collect())
}

async fn get_specialty_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Specialty>> {
    let row = sqlx::query("SELECT id, name, image_url FROM specialties WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get specialty by ID")?;

    Ok(row.as_ref().map(row_to_specialty_sqlite))
}

async fn create_specialty_sqlite(pool: &SqlitePool, specialty: &Specialty) -> Result<Specialty> {
    sqlx::query(INSERT_SPECIALTY_SQL)
        .bind(&specialty.id)
        .bind(&specialty.name)
        .bind(&specialty.image_url)
        .execute(pool)
        .await
        .context("Failed to create specialty")?;

    Ok(specialty.clone())
}

async fn create_specialties_sqlite(pool: &SqlitePool, specialties: &[Specialty]) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    for specialty in specialties {
        sqlx::query(INSERT_SPECIALTY_SQL)
            .bind(&specialty.id)
            .bind(&specialty.name)
            .bind(&specialty.image_url)
            .execute(&mut *tx)
            .await
            .context("Failed to create specialty")?;
    }
    tx.commit().await.context("Failed to commit specialties")?;
    Ok(())
}

fn row_to_specialty_sqlite(row: &sqlx::sqlite::SqliteRow) -> Specialty {
    Specialty {
        id: row.get("id"),
        name: row.get("name"),
        image_url: row.get("image_url"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn list_specialties_mysql(pool: &MySqlPool) -> Result<Vec<Specialty>> {
    let rows = sqlx::query("SELECT id, name, image_url FROM specialties ORDER BY name")
        .fetch_all(pool)
        .await
        .context("Failed to list specialties")?;

    Ok(rows.iter().map(row_to_specialty_mysql).collect())
}

async fn get_specialty_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Specialty>> {
    let row = sqlx::query("SELECT id, name, image_url FROM specialties WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get specialty by ID")?;

    Ok(row.as_ref().map(row_to_specialty_mysql))
}

async fn create_specialty_mysql(pool: &MySqlPool, specialty: &Specialty) -> Result<Specialty> {
    sqlx::query(INSERT_SPECIALTY_SQL)
        .bind(&specialty.id)
        .bind(&specialty.name)
        .bind(&specialty.image_url)
        .execute(pool)
        .await
        .context("Failed to create specialty")?;

    Ok(specialty.clone())
}

async fn create_specialties_mysql(pool: &MySqlPool, specialties: &[Specialty]) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    for specialty in specialties {
        sqlx::query(INSERT_SPECIALTY_SQL)
            .bind(&specialty.id)
            .bind(&specialty.name)
            .bind(&specialty.image_url)
            .execute(&mut *tx)
            .await
            .context("Failed to create specialty")?;
    }
    tx.commit().await.context("Failed to commit specialties")?;
    Ok(())
}

fn row_to_specialty_mysql(row: &sqlx::mysql::MySqlRow) -> Specialty {
    Specialty {
        id: row.get("id"),
        name: row.get("name"),
        image_url: row.get("image_url"),
    }
}
