//! Data models
//!
//! Entities persisted by the storage layer plus the input types accepted by
//! the services and HTTP handlers.

mod appointment;
mod hospital;
mod news;
mod session;
mod specialty;
mod user;

pub use appointment::{
    Appointment, AppointmentStatus, CreateAppointmentInput, UpdateAppointmentInput,
};
pub use hospital::{CreateHospitalInput, Hospital};
pub use news::{CreateNewsInput, News};
pub use session::Session;
pub use specialty::{CreateSpecialtyInput, Specialty};
pub use user::{CreateUserInput, UpdateProfileInput, User};
