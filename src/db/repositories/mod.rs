//! Database repositories
//!
//! One trait per entity plus its SQLx implementation. [`MemoryStore`]
//! implements every trait in memory.

pub mod appointment;
pub mod hospital;
pub mod memory;
pub mod news;
pub mod session;
pub mod specialty;
pub mod user;

pub use appointment::{AppointmentRepository, SqlxAppointmentRepository};
pub use hospital::{HospitalRepository, SqlxHospitalRepository};
pub use memory::MemoryStore;
pub use news::{NewsRepository, SqlxNewsRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use specialty::{SpecialtyRepository, SqlxSpecialtyRepository};
pub use user::{SqlxUserRepository, UserRepository};
