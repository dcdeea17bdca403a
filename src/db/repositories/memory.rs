//! In-memory storage adapter
//!
//! `MemoryStore` implements every repository trait over `RwLock<HashMap>`
//! tables. It follows the same contract as the SQLx repositories (ordering,
//! owner scoping, unique email) and backs the property tests. Data lives only
//! as long as the store.

use crate::db::repositories::appointment::day_bounds;
use crate::db::repositories::{
    AppointmentRepository, HospitalRepository, NewsRepository, SessionRepository,
    SpecialtyRepository, UserRepository,
};
use crate::db::StorageError;
use crate::models::{
    Appointment, CreateAppointmentInput, Hospital, News, Session, Specialty,
    UpdateAppointmentInput, UpdateProfileInput, User,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local store implementing all repository traits
#[derive(Default)]
pub struct MemoryStore {
    hospitals: RwLock<HashMap<String, Hospital>>,
    specialties: RwLock<HashMap<String, Specialty>>,
    appointments: RwLock<HashMap<String, Appointment>>,
    news: RwLock<HashMap<String, News>>,
    users: RwLock<HashMap<String, User>>,
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Insert a batch under one write guard, rejecting it whole on an ID clash
fn insert_all<T: Clone>(
    table: &mut HashMap<String, T>,
    items: &[T],
    id_of: impl Fn(&T) -> &str,
    kind: &str,
) -> Result<()> {
    if let Some(clash) = items.iter().map(&id_of).find(|id| table.contains_key(*id)) {
        anyhow::bail!("Failed to create {}: duplicate id {}", kind, clash);
    }
    for item in items {
        table.insert(id_of(item).to_string(), item.clone());
    }
    Ok(())
}

fn sort_appointments(mut items: Vec<Appointment>) -> Vec<Appointment> {
    items.sort_by(|a, b| {
        a.appointment_date
            .cmp(&b.appointment_date)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    items
}

#[async_trait]
impl HospitalRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Hospital>> {
        let mut items: Vec<Hospital> = self.hospitals.read().await.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Hospital>> {
        Ok(self.hospitals.read().await.get(id).cloned())
    }

    async fn create(&self, hospital: &Hospital) -> Result<Hospital> {
        self.hospitals
            .write()
            .await
            .insert(hospital.id.clone(), hospital.clone());
        Ok(hospital.clone())
    }

    async fn create_many(&self, hospitals: &[Hospital]) -> Result<()> {
        let mut table = self.hospitals.write().await;
        insert_all(&mut table, hospitals, |h| h.id.as_str(), "hospital")
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.hospitals.read().await.len() as i64)
    }
}

#[async_trait]
impl SpecialtyRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Specialty>> {
        let mut items: Vec<Specialty> = self.specialties.read().await.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Specialty>> {
        Ok(self.specialties.read().await.get(id).cloned())
    }

    async fn create(&self, specialty: &Specialty) -> Result<Specialty> {
        self.specialties
            .write()
            .await
            .insert(specialty.id.clone(), specialty.clone());
        Ok(specialty.clone())
    }

    async fn create_many(&self, specialties: &[Specialty]) -> Result<()> {
        let mut table = self.specialties.write().await;
        insert_all(&mut table, specialties, |s| s.id.as_str(), "specialty")
    }

    async fn update_image(&self, id: &str, image_url: &str) -> Result<bool> {
        match self.specialties.write().await.get_mut(id) {
            Some(specialty) => {
                specialty.image_url = Some(image_url.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.specialties.read().await.len() as i64)
    }
}

#[async_trait]
impl AppointmentRepository for MemoryStore {
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Appointment>> {
        let items = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        Ok(sort_appointments(items))
    }

    async fn get_owned(&self, id: &str, user_id: &str) -> Result<Option<Appointment>> {
        Ok(self
            .appointments
            .read()
            .await
            .get(id)
            .filter(|a| a.user_id == user_id)
            .cloned())
    }

    async fn list_by_date(&self, date: NaiveDate, user_id: &str) -> Result<Vec<Appointment>> {
        let (start, end) = day_bounds(date);
        let items = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| {
                a.user_id == user_id && a.appointment_date >= start && a.appointment_date < end
            })
            .cloned()
            .collect();
        Ok(sort_appointments(items))
    }

    async fn create(&self, input: CreateAppointmentInput, user_id: &str) -> Result<Appointment> {
        let appointment = Appointment::new(input, user_id);
        self.appointments
            .write()
            .await
            .insert(appointment.id.clone(), appointment.clone());
        Ok(appointment)
    }

    async fn update_owned(
        &self,
        id: &str,
        update: &UpdateAppointmentInput,
        user_id: &str,
    ) -> Result<Option<Appointment>> {
        let mut appointments = self.appointments.write().await;
        match appointments.get_mut(id).filter(|a| a.user_id == user_id) {
            Some(appointment) => {
                appointment.apply(update);
                Ok(Some(appointment.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_owned(&self, id: &str, user_id: &str) -> Result<bool> {
        let mut appointments = self.appointments.write().await;
        if appointments.get(id).is_some_and(|a| a.user_id == user_id) {
            appointments.remove(id);
            return Ok(true);
        }
        Ok(false)
    }
}

#[async_trait]
impl NewsRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<News>> {
        let mut items: Vec<News> = self.news.read().await.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<News>> {
        Ok(self.news.read().await.get(id).cloned())
    }

    async fn create(&self, news: &News) -> Result<News> {
        self.news.write().await.insert(news.id.clone(), news.clone());
        Ok(news.clone())
    }

    async fn create_many(&self, news: &[News]) -> Result<()> {
        let mut table = self.news.write().await;
        insert_all(&mut table, news, |n| n.id.as_str(), "news")
    }

    async fn update_image(&self, id: &str, image_url: &str) -> Result<bool> {
        match self.news.write().await.get_mut(id) {
            Some(news) => {
                news.image_url = Some(image_url.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.news.read().await.len() as i64)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &User) -> Result<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StorageError::Duplicate("email").into());
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user.clone())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn update_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        match self.users.write().await.get_mut(id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_profile(&self, id: &str, input: &UpdateProfileInput) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        if let Some(email) = &input.email {
            if users.values().any(|u| u.id != id && &u.email == email) {
                return Err(StorageError::Duplicate("email").into());
            }
        }
        match users.get_mut(id) {
            Some(user) => {
                if let Some(email) = &input.email {
                    user.email = email.clone();
                }
                if let Some(phone) = &input.phone {
                    user.phone = Some(phone.clone());
                }
                user.updated_at = Utc::now();
                Ok(Some(user.clone()))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create(&self, session: &Session) -> Result<Session> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(session.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<()> {
        self.sessions.write().await.retain(|_, s| s.user_id != user_id);
        Ok(())
    }

    async fn delete_expired(&self) -> Result<i64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        Ok((before - sessions.len()) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentStatus, CreateHospitalInput, CreateSpecialtyInput};
    use chrono::{TimeZone, Utc};

    fn booking(day: u32) -> CreateAppointmentInput {
        CreateAppointmentInput {
            specialty_id: "s".to_string(),
            hospital_id: "h".to_string(),
            doctor_name: None,
            appointment_date: Utc.with_ymd_and_hms(2025, 6, day, 10, 0, 0).unwrap(),
            status: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_owner_scoping() {
        let store = MemoryStore::new();
        let owned = AppointmentRepository::create(&store, booking(2), "alice")
            .await
            .unwrap();
        AppointmentRepository::create(&store, booking(1), "alice")
            .await
            .unwrap();

        let update = UpdateAppointmentInput {
            status: Some(AppointmentStatus::Cancelled),
            ..Default::default()
        };

        assert!(store.get_owned(&owned.id, "bob").await.unwrap().is_none());
        assert!(store.update_owned(&owned.id, &update, "bob").await.unwrap().is_none());
        assert!(!store.delete_owned(&owned.id, "bob").await.unwrap());

        let listed = store.list_by_user("alice").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].appointment_date < listed[1].appointment_date);
        assert_eq!(listed[1].status, AppointmentStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let store = MemoryStore::new();
        let first = User::new("x@example.com".to_string(), None, "h".to_string());
        let second = User::new("x@example.com".to_string(), None, "h".to_string());

        UserRepository::create(&store, &first).await.unwrap();
        let err = UserRepository::create(&store, &second).await.unwrap_err();

        assert_eq!(StorageError::find(&err), Some(&StorageError::Duplicate("email")));
    }

    #[tokio::test]
    async fn test_create_many_rejects_whole_batch_on_clash() {
        let store = MemoryStore::new();
        let existing = Hospital::new(CreateHospitalInput {
            name: "Hospital A".to_string(),
            address: "Rua X".to_string(),
            phone: "111".to_string(),
        });
        HospitalRepository::create(&store, &existing).await.unwrap();
        let fresh = Hospital::new(CreateHospitalInput {
            name: "Hospital B".to_string(),
            address: "Rua Y".to_string(),
            phone: "222".to_string(),
        });

        let result = HospitalRepository::create_many(&store, &[fresh.clone(), existing]).await;

        assert!(result.is_err());
        assert_eq!(HospitalRepository::count(&store).await.unwrap(), 1);
        assert!(HospitalRepository::get_by_id(&store, &fresh.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_image_missing() {
        let store = MemoryStore::new();
        let specialty = Specialty::new(CreateSpecialtyInput {
            name: "Neurologia".to_string(),
            image_url: None,
        });
        SpecialtyRepository::create(&store, &specialty).await.unwrap();

        assert!(SpecialtyRepository::update_image(&store, &specialty.id, "u").await.unwrap());
        assert!(!SpecialtyRepository::update_image(&store, "missing", "u").await.unwrap());
    }
}
