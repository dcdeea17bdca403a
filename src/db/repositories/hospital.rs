//! Hospital repository
//!
//! - `HospitalRepository` trait defining hospital data access
//! - `SqlxHospitalRepository` implementing it for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::{mysql_pool, sqlite_pool, DynDatabasePool};
use crate::models::Hospital;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const INSERT_HOSPITAL_SQL: &str =
    "INSERT INTO hospitals (id, name, address, phone) VALUES (?, ?, ?, ?)";

/// Hospital repository trait
#[async_trait]
pub trait HospitalRepository: Send + Sync {
    /// All hospitals ordered by name
    async fn list(&self) -> Result<Vec<Hospital>>;

    /// Get hospital by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<Hospital>>;

    /// Insert a hospital
    async fn create(&self, hospital: &Hospital) -> Result<Hospital>;

    /// Insert every hospital or none of them
    async fn create_many(&self, hospitals: &[Hospital]) -> Result<()>;

    /// Number of stored hospitals
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based hospital repository
pub struct SqlxHospitalRepository {
    pool: DynDatabasePool,
}

impl SqlxHospitalRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn HospitalRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl HospitalRepository for SqlxHospitalRepository {
    async fn list(&self) -> Result<Vec<Hospital>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_hospitals_sqlite(sqlite_pool(&self.pool)?).await,
            DatabaseDriver::Mysql => list_hospitals_mysql(mysql_pool(&self.pool)?).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Hospital>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_hospital_sqlite(sqlite_pool(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_hospital_mysql(mysql_pool(&self.pool)?, id).await,
        }
    }

    async fn create(&self, hospital: &Hospital) -> Result<Hospital> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_hospital_sqlite(sqlite_pool(&self.pool)?, hospital).await
            }
            DatabaseDriver::Mysql => create_hospital_mysql(mysql_pool(&self.pool)?, hospital).await,
        }
    }

    async fn create_many(&self, hospitals: &[Hospital]) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_hospitals_sqlite(sqlite_pool(&self.pool)?, hospitals).await
            }
            DatabaseDriver::Mysql => {
                create_hospitals_mysql(mysql_pool(&self.pool)?, hospitals).await
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS n FROM hospitals";
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .fetch_one(sqlite_pool(&self.pool)?)
                .await
                .context("Failed to count hospitals")?
                .get("n"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .fetch_one(mysql_pool(&self.pool)?)
                .await
                .context("Failed to count hospitals")?
                .get("n"),
        };
        Ok(count)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_hospitals_sqlite(pool: &SqlitePool) -> Result<Vec<Hospital>> {
    let rows = sqlx::query("SELECT id, name, address, phone FROM hospitals ORDER BY name")
        .fetch_all(pool)
        .await
        .context("Failed to list hospitals")?;

    Ok(rows.iter().map(row_to_hospital_sqlite).collect())
}

async fn get_hospital_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<Hospital>> {
    let row = sqlx::query("SELECT id, name, address, phone FROM hospitals WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get hospital by ID")?;

    Ok(row.as_ref().map(row_to_hospital_sqlite))
}

async fn create_hospital_sqlite(pool: &SqlitePool, hospital: &Hospital) -> Result<Hospital> {
    sqlx::query(INSERT_HOSPITAL_SQL)
        .bind(&hospital.id)
        .bind(&hospital.name)
        .bind(&hospital.address)
        .bind(&hospital.phone)
        .execute(pool)
        .await
        .context("Failed to create hospital")?;

    Ok(hospital.clone())
}

async fn create_hospitals_sqlite(pool: &SqlitePool, hospitals: &[Hospital]) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    for hospital in hospitals {
        sqlx::query(INSERT_HOSPITAL_SQL)
            .bind(&hospital.id)
            .bind(&hospital.name)
            .bind(&hospital.address)
            .bind(&hospital.phone)
            .execute(&mut *tx)
            .await
            .context("Failed to create hospital")?;
    }
    tx.commit().await.context("Failed to commit hospitals")?;
    Ok(())
}

fn row_to_hospital_sqlite(row: &sqlx::sqlite::SqliteRow) -> Hospital {
    Hospital {
        id: row.get("id"),
        name: row.get("name"),
        address: row.get("address"),
        phone: row.get("phone"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn list_hospitals_mysql(pool: &MySqlPool) -> Result<Vec<Hospital>> {
    let rows = sqlx::query("SELECT id, name, address, phone FROM hospitals ORDER BY name")
        .fetch_all(pool)
        .await
        .context("Failed to list hospitals")?;

    Ok(rows.iter().map(row_to_hospital_mysql).collect())
}

async fn get_hospital_mysql(pool: &MySqlPool, id: &str) -> Result<Option<Hospital>> {
    let row = sqlx::query("SELECT id, name, address, phone FROM hospitals WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get hospital by ID")?;

    Ok(row.as_ref().map(row_to_hospital_mysql))
}

async fn create_hospital_mysql(pool: &MySqlPool, hospital: &Hospital) -> Result<Hospital> {
    sqlx::query(INSERT_HOSPITAL_SQL)
        .bind(&hospital.id)
        .bind(&hospital.name)
        .bind(&hospital.address)
        .bind(&hospital.phone)
        .execute(pool)
        .await
        .context("Failed to create hospital")?;

    Ok(hospital.clone())
}

async fn create_hospitals_mysql(pool: &MySqlPool, hospitals: &[Hospital]) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    for hospital in hospitals {
        sqlx::query(INSERT_HOSPITAL_SQL)
            .bind(&hospital.id)
            .bind(&hospital.name)
            .bind(&hospital.address)
            .bind(&hospital.phone)
            .execute(&mut *tx)
            .await
            .context("Failed to create hospital")?;
    }
    tx.commit().await.context("Failed to commit hospitals")?;
    Ok(())
}

fn row_to_hospital_mysql(row: &sqlx::mysql::MySqlRow) -> Hospital {
    Hospital {
        id: row.get("id"),
        name: row.get("name"),
        address: row.get("address"),
        phone: row.get("phone"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::CreateHospitalInput;

    async fn setup_test_repo() -> SqlxHospitalRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxHospitalRepository::new(pool)
    }

    fn hospital(name: &str) -> Hospital {
        Hospital::new(CreateHospitalInput {
            name: name.to_string(),
            address: "Rua das Flores, 123 - Centro".to_string(),
            phone: "(11) 4229-1234".to_string(),
        })
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let repo = setup_test_repo().await;

        let created = repo
            .create(&hospital("Hospital Municipal"))
            .await
            .expect("Failed to create hospital");
        let found = repo
            .get_by_id(&created.id)
            .await
            .expect("Failed to get hospital")
            .expect("Hospital not found");

        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let repo = setup_test_repo().await;

        let found = repo.get_by_id("missing").await.expect("Failed to get hospital");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_ordered_by_name_and_count() {
        let repo = setup_test_repo().await;
        for name in ["UPA 24h", "Hospital B", "Hospital A"] {
            repo.create(&hospital(name)).await.unwrap();
        }

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|h| h.name).collect();

        assert_eq!(names, vec!["Hospital A", "Hospital B", "UPA 24h"]);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_create_many_is_all_or_nothing() {
        let repo = setup_test_repo().await;
        let first = hospital("Hospital A");
        let mut clash = hospital("Hospital B");
        clash.id = first.id.clone();

        let failed = repo.create_many(&[first.clone(), clash]).await;

        assert!(failed.is_err());
        assert_eq!(repo.count().await.unwrap(), 0);

        repo.create_many(&[first, hospital("Hospital C")]).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 2);
    }
}
