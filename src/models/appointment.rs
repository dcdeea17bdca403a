//! Appointment model
//!
//! An appointment belongs to exactly one user. The owner is never taken from
//! request payloads: [`CreateAppointmentInput`] has no owner field and the
//! caller's ID is passed separately to [`Appointment::new`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A booked appointment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// Unique identifier (UUID text)
    pub id: String,
    /// Owning user
    pub user_id: String,
    pub specialty_id: String,
    pub hospital_id: String,
    pub doctor_name: Option<String>,
    pub appointment_date: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Build an appointment owned by `user_id`.
    pub fn new(input: CreateAppointmentInput, user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            specialty_id: input.specialty_id,
            hospital_id: input.hospital_id,
            doctor_name: input.doctor_name,
            appointment_date: input.appointment_date,
            status: input.status.unwrap_or_default(),
            notes: input.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the fields present in `update` and bump `updated_at`.
    pub fn apply(&mut self, update: &UpdateAppointmentInput) {
        if let Some(specialty_id) = &update.specialty_id {
            self.specialty_id = specialty_id.clone();
        }
        if let Some(hospital_id) = &update.hospital_id {
            self.hospital_id = hospital_id.clone();
        }
        if let Some(doctor_name) = &update.doctor_name {
            self.doctor_name = doctor_name.clone();
        }
        if let Some(date) = update.appointment_date {
            self.appointment_date = date;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(notes) = &update.notes {
            self.notes = notes.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// Appointment lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid appointment status: {}", s)),
        }
    }
}

/// Input for booking an appointment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentInput {
    pub specialty_id: String,
    pub hospital_id: String,
    #[serde(default)]
    pub doctor_name: Option<String>,
    pub appointment_date: DateTime<Utc>,
    /// Defaults to `scheduled`
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update: only `Some` fields change
///
/// `doctor_name` and `notes` are nullable columns. An absent key leaves them
/// alone, an explicit `null` clears them (`Some(None)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentInput {
    #[serde(default)]
    pub specialty_id: Option<String>,
    #[serde(default)]
    pub hospital_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub doctor_name: Option<Option<String>>,
    #[serde(default)]
    pub appointment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<Option<String>>,
}

/// Only called for keys present in the payload, so `null` becomes `Some(None)`.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl UpdateAppointmentInput {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.specialty_id.is_none()
            && self.hospital_id.is_none()
            && self.doctor_name.is_none()
            && self.appointment_date.is_none()
            && self.status.is_none()
            && self.notes.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_input() -> CreateAppointmentInput {
        CreateAppointmentInput {
            specialty_id: "spec-1".to_string(),
            hospital_id: "hosp-1".to_string(),
            doctor_name: None,
            appointment_date: Utc.with_ymd_and_hms(2025, 3, 10, 14, 30, 0).unwrap(),
            status: None,
            notes: Some("Primeira consulta".to_string()),
        }
    }

    #[test]
    fn test_new_stamps_owner_and_default_status() {
        let appointment = Appointment::new(sample_input(), "user-1");

        assert_eq!(appointment.user_id, "user-1");
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.created_at, appointment.updated_at);
    }

    #[test]
    fn test_apply_changes_only_supplied_fields() {
        let mut appointment = Appointment::new(sample_input(), "user-1");
        let before = appointment.clone();

        appointment.apply(&UpdateAppointmentInput {
            status: Some(AppointmentStatus::Confirmed),
            ..Default::default()
        });

        assert_eq!(appointment.status, AppointmentStatus::Confirmed);
        assert_eq!(appointment.notes, before.notes);
        assert_eq!(appointment.appointment_date, before.appointment_date);
        assert_eq!(appointment.user_id, before.user_id);
        assert!(appointment.updated_at >= before.updated_at);
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
        ] {
            let parsed: AppointmentStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("postponed".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_update_input_is_empty() {
        assert!(UpdateAppointmentInput::default().is_empty());
        let update = UpdateAppointmentInput {
            notes: Some(Some("x".to_string())),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_update_input_distinguishes_null_from_absent() {
        let absent: UpdateAppointmentInput =
            serde_json::from_str(r#"{"status":"confirmed"}"#).unwrap();
        assert_eq!(absent.notes, None);
        assert_eq!(absent.doctor_name, None);

        let cleared: UpdateAppointmentInput =
            serde_json::from_str(r#"{"notes":null,"doctor_name":"Dr. Paulo"}"#).unwrap();
        assert_eq!(cleared.notes, Some(None));
        assert_eq!(cleared.doctor_name, Some(Some("Dr. Paulo".to_string())));
        assert!(!cleared.is_empty());
    }

    #[test]
    fn test_apply_explicit_null_clears_nullable_fields() {
        let mut appointment = Appointment::new(sample_input(), "user-1");
        appointment.doctor_name = Some("Dra. Ana".to_string());

        appointment.apply(&UpdateAppointmentInput {
            notes: Some(None),
            ..Default::default()
        });

        assert_eq!(appointment.notes, None);
        assert_eq!(appointment.doctor_name.as_deref(), Some("Dra. Ana"));
    }

    #[test]
    fn test_create_input_rejects_owner_field_silently() {
        let json = r#"{
            "specialty_id": "s",
            "hospital_id": "h",
            "appointment_date": "2025-03-10T14:30:00Z",
            "user_id": "someone-else"
        }"#;
        let input: CreateAppointmentInput = serde_json::from_str(json).unwrap();
        let appointment = Appointment::new(input, "caller");

        assert_eq!(appointment.user_id, "caller");
    }
}
