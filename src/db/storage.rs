//! Repository bundle injected into services

use std::sync::Arc;

use super::repositories::{
    AppointmentRepository, HospitalRepository, MemoryStore, NewsRepository, SessionRepository,
    SpecialtyRepository, SqlxAppointmentRepository, SqlxHospitalRepository, SqlxNewsRepository,
    SqlxSessionRepository, SqlxSpecialtyRepository, SqlxUserRepository, UserRepository,
};
use super::DynDatabasePool;

/// Every repository behind its trait.
///
/// Cloning is cheap; all fields are `Arc`s.
#[derive(Clone)]
pub struct Storage {
    pub hospitals: Arc<dyn HospitalRepository>,
    pub specialties: Arc<dyn SpecialtyRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub news: Arc<dyn NewsRepository>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
}

impl Storage {
    /// SQLx repositories sharing one pool
    pub fn from_pool(pool: DynDatabasePool) -> Self {
        Self {
            hospitals: SqlxHospitalRepository::boxed(pool.clone()),
            specialties: SqlxSpecialtyRepository::boxed(pool.clone()),
            appointments: SqlxAppointmentRepository::boxed(pool.clone()),
            news: SqlxNewsRepository::boxed(pool.clone()),
            users: SqlxUserRepository::boxed(pool.clone()),
            sessions: SqlxSessionRepository::boxed(pool),
        }
    }

    /// All repositories backed by a single fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            hospitals: store.clone(),
            specialties: store.clone(),
            appointments: store.clone(),
            news: store.clone(),
            users: store.clone(),
            sessions: store,
        }
    }
}
