//! Appointment service
//!
//! Booking operations for the authenticated caller. The caller's user ID is
//! always passed in by the handler; nothing here trusts an owner from the
//! request body. A foreign appointment and a missing one produce the same
//! `NotFound`.

use crate::db::repositories::{AppointmentRepository, HospitalRepository, SpecialtyRepository};
use crate::models::{Appointment, CreateAppointmentInput, UpdateAppointmentInput};
use anyhow::Context;
use chrono::NaiveDate;
use std::sync::Arc;

/// Error types for appointment service operations
#[derive(Debug, thiserror::Error)]
pub enum AppointmentServiceError {
    /// Appointment absent or owned by someone else
    #[error("Appointment not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct AppointmentService {
    appointments: Arc<dyn AppointmentRepository>,
    hospitals: Arc<dyn HospitalRepository>,
    specialties: Arc<dyn SpecialtyRepository>,
}

impl AppointmentService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        hospitals: Arc<dyn HospitalRepository>,
        specialties: Arc<dyn SpecialtyRepository>,
    ) -> Self {
        Self {
            appointments,
            hospitals,
            specialties,
        }
    }

    /// The caller's appointments, earliest first
    pub async fn list(&self, user_id: &str) -> Result<Vec<Appointment>, AppointmentServiceError> {
        Ok(self
            .appointments
            .list_by_user(user_id)
            .await
            .context("Failed to list appointments")?)
    }

    /// The caller's appointments on one UTC calendar day
    pub async fn list_by_date(
        &self,
        date: NaiveDate,
        user_id: &str,
    ) -> Result<Vec<Appointment>, AppointmentServiceError> {
        Ok(self
            .appointments
            .list_by_date(date, user_id)
            .await
            .context("Failed to list appointments by date")?)
    }

    pub async fn get(&self, id: &str, user_id: &str) -> Result<Appointment, AppointmentServiceError> {
        self.appointments
            .get_owned(id, user_id)
            .await
            .context("Failed to get appointment")?
            .ok_or_else(|| AppointmentServiceError::NotFound(id.to_string()))
    }

    /// Book an appointment for `user_id`
    pub async fn create(
        &self,
        input: CreateAppointmentInput,
        user_id: &str,
    ) -> Result<Appointment, AppointmentServiceError> {
        self.check_references(Some(&input.hospital_id), Some(&input.specialty_id))
            .await?;

        let appointment = self
            .appointments
            .create(input, user_id)
            .await
            .context("Failed to create appointment")?;

        tracing::info!(
            appointment_id = %appointment.id,
            user_id = %user_id,
            "Booked appointment for {}",
            appointment.appointment_date
        );
        Ok(appointment)
    }

    /// Partially update one of the caller's appointments
    pub async fn update(
        &self,
        id: &str,
        update: UpdateAppointmentInput,
        user_id: &str,
    ) -> Result<Appointment, AppointmentServiceError> {
        if update.is_empty() {
            return Err(AppointmentServiceError::ValidationError(
                "No fields to update".to_string(),
            ));
        }
        self.check_references(update.hospital_id.as_ref(), update.specialty_id.as_ref())
            .await?;

        self.appointments
            .update_owned(id, &update, user_id)
            .await
            .context("Failed to update appointment")?
            .ok_or_else(|| AppointmentServiceError::NotFound(id.to_string()))
    }

    pub async fn delete(&self, id: &str, user_id: &str) -> Result<(), AppointmentServiceError> {
        let deleted = self
            .appointments
            .delete_owned(id, user_id)
            .await
            .context("Failed to delete appointment")?;

        if !deleted {
            return Err(AppointmentServiceError::NotFound(id.to_string()));
        }
        tracing::info!(appointment_id = %id, user_id = %user_id, "Deleted appointment");
        Ok(())
    }

    async fn check_references(
        &self,
        hospital_id: Option<&String>,
        specialty_id: Option<&String>,
    ) -> Result<(), AppointmentServiceError> {
        if let Some(hospital_id) = hospital_id {
            let exists = self
                .hospitals
                .get_by_id(hospital_id)
                .await
                .context("Failed to check hospital")?
                .is_some();
            if !exists {
                return Err(AppointmentServiceError::ValidationError(format!(
                    "Unknown hospital: {}",
                    hospital_id
                )));
            }
        }
        if let Some(specialty_id) = specialty_id {
            let exists = self
                .specialties
                .get_by_id(specialty_id)
                .await
                .context("Failed to check specialty")?
                .is_some();
            if !exists {
                return Err(AppointmentServiceError::ValidationError(format!(
                    "Unknown specialty: {}",
                    specialty_id
                )));
            }
        }
        Ok(())
    }
}
