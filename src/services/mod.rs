//! Services layer
//!
//! Input validation and error mapping on top of the repositories. Each
//! service returns its own `thiserror` error type; storage failures travel
//! inside the `InternalError` variant.

pub mod appointment;
pub mod hospital;
pub mod illustration;
pub mod news;
pub mod password;
pub mod seed;
pub mod specialty;
pub mod user;

pub use appointment::{AppointmentService, AppointmentServiceError};
pub use hospital::{HospitalService, HospitalServiceError};
pub use illustration::{IllustrationError, IllustrationOutcome, IllustrationService};
pub use news::{NewsService, NewsServiceError};
pub use password::{hash_password, verify_password};
pub use seed::SeedReport;
pub use specialty::{SpecialtyService, SpecialtyServiceError};
pub use user::{ChangePasswordInput, LoginInput, UserService, UserServiceError};

/// Trim `value`, rejecting it when nothing is left
pub(crate) fn require_field(field: &str, value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} cannot be empty", field));
    }
    Ok(trimmed.to_string())
}
