//! Appointment repository
//!
//! Every query here carries the owner: reads, updates and deletes filter on
//! `id = ? AND user_id = ?`, so a row owned by another user behaves exactly
//! like a missing one.
//!
//! - `AppointmentRepository` trait defining appointment data access
//! - `SqlxAppointmentRepository` implementing it for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::{mysql_pool, sqlite_pool, DynDatabasePool};
use crate::models::{Appointment, CreateAppointmentInput, UpdateAppointmentInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const APPOINTMENT_COLUMNS: &str = "id, user_id, specialty_id, hospital_id, doctor_name, \
     appointment_date, status, notes, created_at, updated_at";

/// Appointment repository trait
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// All appointments owned by `user_id`, earliest date first
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Appointment>>;

    /// Get an appointment if it exists and belongs to `user_id`
    async fn get_owned(&self, id: &str, user_id: &str) -> Result<Option<Appointment>>;

    /// Owned appointments on the UTC calendar day `date`
    async fn list_by_date(&self, date: NaiveDate, user_id: &str) -> Result<Vec<Appointment>>;

    /// Book an appointment owned by `user_id`
    async fn create(&self, input: CreateAppointmentInput, user_id: &str) -> Result<Appointment>;

    /// Apply a partial update to an owned appointment.
    ///
    /// Returns `None` when no row matched both `id` and `user_id`.
    async fn update_owned(
        &self,
        id: &str,
        update: &UpdateAppointmentInput,
        user_id: &str,
    ) -> Result<Option<Appointment>>;

    /// Delete an owned appointment; `false` when no row matched.
    async fn delete_owned(&self, id: &str, user_id: &str) -> Result<bool>;
}

/// SQLx-based appointment repository
pub struct SqlxAppointmentRepository {
    pool: DynDatabasePool,
}

impl SqlxAppointmentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AppointmentRepository> {
        Arc::new(Self::new(pool))
    }
}

/// Half-open UTC range `[date 00:00, date+1 00:00)`
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    (start, start + Duration::days(1))
}

#[async_trait]
impl AppointmentRepository for SqlxAppointmentRepository {
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Appointment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_appointments_sqlite(sqlite_pool(&self.pool)?, user_id).await
            }
            DatabaseDriver::Mysql => list_appointments_mysql(mysql_pool(&self.pool)?, user_id).await,
        }
    }

    async fn get_owned(&self, id: &str, user_id: &str) -> Result<Option<Appointment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_appointment_sqlite(sqlite_pool(&self.pool)?, id, user_id).await
            }
            DatabaseDriver::Mysql => {
                get_appointment_mysql(mysql_pool(&self.pool)?, id, user_id).await
            }
        }
    }

    async fn list_by_date(&self, date: NaiveDate, user_id: &str) -> Result<Vec<Appointment>> {
        let (start, end) = day_bounds(date);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_appointments_between_sqlite(sqlite_pool(&self.pool)?, user_id, start, end).await
            }
            DatabaseDriver::Mysql => {
                list_appointments_between_mysql(mysql_pool(&self.pool)?, user_id, start, end).await
            }
        }
    }

    async fn create(&self, input: CreateAppointmentInput, user_id: &str) -> Result<Appointment> {
        let appointment = Appointment::new(input, user_id);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_appointment_sqlite(sqlite_pool(&self.pool)?, &appointment).await?
            }
            DatabaseDriver::Mysql => {
                create_appointment_mysql(mysql_pool(&self.pool)?, &appointment).await?
            }
        }
        Ok(appointment)
    }

    async fn update_owned(
        &self,
        id: &str,
        update: &UpdateAppointmentInput,
        user_id: &str,
    ) -> Result<Option<Appointment>> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_appointment_sqlite(sqlite_pool(&self.pool)?, id, update, user_id).await?
            }
            DatabaseDriver::Mysql => {
                update_appointment_mysql(mysql_pool(&self.pool)?, id, update, user_id).await?
            }
        };

        if affected == 0 {
            return Ok(None);
        }
        self.get_owned(id, user_id).await
    }

    async fn delete_owned(&self, id: &str, user_id: &str) -> Result<bool> {
        let sql = "DELETE FROM appointments WHERE id = ? AND user_id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .bind(user_id)
                .execute(sqlite_pool(&self.pool)?)
                .await
                .context("Failed to delete appointment")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .bind(user_id)
                .execute(mysql_pool(&self.pool)?)
                .await
                .context("Failed to delete appointment")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

const UPDATE_OWNED_SQL: &str = r#"
    UPDATE appointments SET
        specialty_id = COALESCE(?, specialty_id),
        hospital_id = COALESCE(?, hospital_id),
        doctor_name = CASE WHEN ? THEN ? ELSE doctor_name END,
        appointment_date = COALESCE(?, appointment_date),
        status = COALESCE(?, status),
        notes = CASE WHEN ? THEN ? ELSE notes END,
        updated_at = ?
    WHERE id = ? AND user_id = ?
"#;

const INSERT_SQL: &str = r#"
    INSERT INTO appointments (id, user_id, specialty_id, hospital_id, doctor_name,
                              appointment_date, status, notes, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn list_appointments_sqlite(pool: &SqlitePool, user_id: &str) -> Result<Vec<Appointment>> {
    let sql = format!(
        "SELECT {} FROM appointments WHERE user_id = ? ORDER BY appointment_date ASC",
        APPOINTMENT_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list appointments")?;

    rows.iter().map(row_to_appointment_sqlite).collect()
}

async fn get_appointment_sqlite(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
) -> Result<Option<Appointment>> {
    let sql = format!(
        "SELECT {} FROM appointments WHERE id = ? AND user_id = ?",
        APPOINTMENT_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get appointment")?;

    row.as_ref().map(row_to_appointment_sqlite).transpose()
}

async fn list_appointments_between_sqlite(
    pool: &SqlitePool,
    user_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Appointment>> {
    let sql = format!(
        "SELECT {} FROM appointments \
         WHERE user_id = ? AND appointment_date >= ? AND appointment_date < ? \
         ORDER BY appointment_date ASC",
        APPOINTMENT_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
        .context("Failed to list appointments by date")?;

    rows.iter().map(row_to_appointment_sqlite).collect()
}

async fn create_appointment_sqlite(pool: &SqlitePool, appointment: &Appointment) -> Result<()> {
    sqlx::query(INSERT_SQL)
        .bind(&appointment.id)
        .bind(&appointment.user_id)
        .bind(&appointment.specialty_id)
        .bind(&appointment.hospital_id)
        .bind(&appointment.doctor_name)
        .bind(appointment.appointment_date)
        .bind(appointment.status.to_string())
        .bind(&appointment.notes)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .execute(pool)
        .await
        .context("Failed to create appointment")?;

    Ok(())
}

async fn update_appointment_sqlite(
    pool: &SqlitePool,
    id: &str,
    update: &UpdateAppointmentInput,
    user_id: &str,
) -> Result<u64> {
    let result = sqlx::query(UPDATE_OWNED_SQL)
        .bind(&update.specialty_id)
        .bind(&update.hospital_id)
        .bind(update.doctor_name.is_some())
        .bind(update.doctor_name.clone().flatten())
        .bind(update.appointment_date)
        .bind(update.status.map(|s| s.to_string()))
        .bind(update.notes.is_some())
        .bind(update.notes.clone().flatten())
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to update appointment")?;

    Ok(result.rows_affected())
}

fn row_to_appointment_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Appointment> {
    let status: String = row.get("status");
    Ok(Appointment {
        id: row.get("id"),
        user_id: row.get("user_id"),
        specialty_id: row.get("specialty_id"),
        hospital_id: row.get("hospital_id"),
        doctor_name: row.get("doctor_name"),
        appointment_date: row.get("appointment_date"),
        status: status.parse()?,
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn list_appointments_mysql(pool: &MySqlPool, user_id: &str) -> Result<Vec<Appointment>> {
    let sql = format!(
        "SELECT {} FROM appointments WHERE user_id = ? ORDER BY appointment_date ASC",
        APPOINTMENT_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list appointments")?;

    rows.iter().map(row_to_appointment_mysql).collect()
}

async fn get_appointment_mysql(
    pool: &MySqlPool,
    id: &str,
    user_id: &str,
) -> Result<Option<Appointment>> {
    let sql = format!(
        "SELECT {} FROM appointments WHERE id = ? AND user_id = ?",
        APPOINTMENT_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get appointment")?;

    row.as_ref().map(row_to_appointment_mysql).transpose()
}

async fn list_appointments_between_mysql(
    pool: &MySqlPool,
    user_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Appointment>> {
    let sql = format!(
        "SELECT {} FROM appointments \
         WHERE user_id = ? AND appointment_date >= ? AND appointment_date < ? \
         ORDER BY appointment_date ASC",
        APPOINTMENT_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
        .context("Failed to list appointments by date")?;

    rows.iter().map(row_to_appointment_mysql).collect()
}

async fn create_appointment_mysql(pool: &MySqlPool, appointment: &Appointment) -> Result<()> {
    sqlx::query(INSERT_SQL)
        .bind(&appointment.id)
        .bind(&appointment.user_id)
        .bind(&appointment.specialty_id)
        .bind(&appointment.hospital_id)
        .bind(&appointment.doctor_name)
        .bind(appointment.appointment_date)
        .bind(appointment.status.to_string())
        .bind(&appointment.notes)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .execute(pool)
        .await
        .context("Failed to create appointment")?;

    Ok(())
}

async fn update_appointment_mysql(
    pool: &MySqlPool,
    id: &str,
    update: &UpdateAppointmentInput,
    user_id: &str,
) -> Result<u64> {
    let result = sqlx::query(UPDATE_OWNED_SQL)
        .bind(&update.specialty_id)
        .bind(&update.hospital_id)
        .bind(update.doctor_name.is_some())
        .bind(update.doctor_name.clone().flatten())
        .bind(update.appointment_date)
        .bind(update.status.map(|s| s.to_string()))
        .bind(update.notes.is_some())
        .bind(update.notes.clone().flatten())
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to update appointment")?;

    Ok(result.rows_affected())
}

fn row_to_appointment_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Appointment> {
    let status: String = row.get("status");
    Ok(Appointment {
        id: row.get("id"),
        user_id: row.get("user_id"),
        specialty_id: row.get("specialty_id"),
        hospital_id: row.get("hospital_id"),
        doctor_name: row.get("doctor_name"),
        appointment_date: row.get("appointment_date"),
        status: status.parse()?,
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::AppointmentStatus;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxAppointmentRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxAppointmentRepository::new(pool.clone());
        (pool, repo)
    }

    // Appointments reference users through a foreign key
    async fn create_test_user(pool: &DynDatabasePool, id: &str) {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO users (id, email, phone, password_hash, created_at, updated_at)
            VALUES (?, ?, NULL, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(format!("{}@example.com", id))
        .bind("hash")
        .bind(now)
        .bind(now)
        .execute(pool.as_sqlite().unwrap())
        .await
        .expect("Failed to create test user");
    }

    fn booking(date: DateTime<Utc>) -> CreateAppointmentInput {
        CreateAppointmentInput {
            specialty_id: "spec-1".to_string(),
            hospital_id: "hosp-1".to_string(),
            doctor_name: Some("Dra. Ana".to_string()),
            appointment_date: date,
            status: None,
            notes: None,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_list_by_user_isolated_and_ordered() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, "alice").await;
        create_test_user(&pool, "bob").await;

        repo.create(booking(at(2025, 5, 3, 9)), "alice").await.unwrap();
        repo.create(booking(at(2025, 5, 1, 9)), "alice").await.unwrap();
        repo.create(booking(at(2025, 5, 2, 9)), "bob").await.unwrap();

        let alice = repo.list_by_user("alice").await.unwrap();
        let bob = repo.list_by_user("bob").await.unwrap();

        assert_eq!(alice.len(), 2);
        assert!(alice.iter().all(|a| a.user_id == "alice"));
        assert!(alice[0].appointment_date < alice[1].appointment_date);
        assert_eq!(bob.len(), 1);
    }

    #[tokio::test]
    async fn test_cross_user_access_behaves_like_missing() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, "alice").await;
        create_test_user(&pool, "bob").await;
        let owned = repo.create(booking(at(2025, 5, 1, 9)), "alice").await.unwrap();

        let update = UpdateAppointmentInput {
            notes: Some(Some("hijack".to_string())),
            ..Default::default()
        };

        assert!(repo.get_owned(&owned.id, "bob").await.unwrap().is_none());
        assert!(repo.get_owned("missing", "bob").await.unwrap().is_none());
        assert!(repo.update_owned(&owned.id, &update, "bob").await.unwrap().is_none());
        assert!(repo.update_owned("missing", &update, "bob").await.unwrap().is_none());
        assert!(!repo.delete_owned(&owned.id, "bob").await.unwrap());
        assert!(!repo.delete_owned("missing", "bob").await.unwrap());

        let untouched = repo.get_owned(&owned.id, "alice").await.unwrap().unwrap();
        assert_eq!(untouched.notes, None);
    }

    #[tokio::test]
    async fn test_update_owned_is_partial() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, "alice").await;
        let owned = repo.create(booking(at(2025, 5, 1, 9)), "alice").await.unwrap();

        let updated = repo
            .update_owned(
                &owned.id,
                &UpdateAppointmentInput {
                    status: Some(AppointmentStatus::Confirmed),
                    ..Default::default()
                },
                "alice",
            )
            .await
            .unwrap()
            .expect("Owned appointment should update");

        assert_eq!(updated.status, AppointmentStatus::Confirmed);
        assert_eq!(updated.doctor_name.as_deref(), Some("Dra. Ana"));
        assert_eq!(updated.appointment_date, owned.appointment_date);
        assert_eq!(updated.user_id, "alice");
    }

    #[tokio::test]
    async fn test_update_owned_null_clears_doctor_and_notes() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, "alice").await;
        let owned = repo.create(booking(at(2025, 5, 1, 9)), "alice").await.unwrap();

        let with_notes = repo
            .update_owned(
                &owned.id,
                &UpdateAppointmentInput {
                    notes: Some(Some("Jejum de 8 horas".to_string())),
                    ..Default::default()
                },
                "alice",
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(with_notes.notes.as_deref(), Some("Jejum de 8 horas"));
        assert_eq!(with_notes.doctor_name.as_deref(), Some("Dra. Ana"));

        let cleared = repo
            .update_owned(
                &owned.id,
                &UpdateAppointmentInput {
                    doctor_name: Some(None),
                    notes: Some(None),
                    ..Default::default()
                },
                "alice",
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cleared.doctor_name, None);
        assert_eq!(cleared.notes, None);
        assert_eq!(cleared.status, owned.status);
    }

    #[tokio::test]
    async fn test_delete_owned() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, "alice").await;
        let owned = repo.create(booking(at(2025, 5, 1, 9)), "alice").await.unwrap();

        assert!(repo.delete_owned(&owned.id, "alice").await.unwrap());
        assert!(repo.get_owned(&owned.id, "alice").await.unwrap().is_none());
        assert!(!repo.delete_owned(&owned.id, "alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_by_date_uses_utc_day() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, "alice").await;
        create_test_user(&pool, "bob").await;

        repo.create(booking(at(2025, 5, 1, 0)), "alice").await.unwrap();
        repo.create(booking(at(2025, 5, 1, 23)), "alice").await.unwrap();
        repo.create(booking(at(2025, 5, 2, 0)), "alice").await.unwrap();
        repo.create(booking(at(2025, 5, 1, 12)), "bob").await.unwrap();

        let day = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let found = repo.list_by_date(day, "alice").await.unwrap();

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|a| a.appointment_date.date_naive() == day));
    }

    #[tokio::test]
    async fn test_deleting_user_cascades() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, "alice").await;
        repo.create(booking(at(2025, 5, 1, 9)), "alice").await.unwrap();

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind("alice")
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();

        assert!(repo.list_by_user("alice").await.unwrap().is_empty());
    }

    #[test]
    fn test_day_bounds() {
        let (start, end) = day_bounds(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        assert_eq!(start, at(2024, 2, 29, 0));
        assert_eq!(end, at(2024, 3, 1, 0));
    }
}
