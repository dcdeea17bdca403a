//! Specialty model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A medical specialty offered for booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Specialty {
    /// Unique identifier (UUID text)
    pub id: String,
    pub name: String,
    /// Illustration URL, set after creation
    pub image_url: Option<String>,
}

impl Specialty {
    pub fn new(input: CreateSpecialtyInput) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            image_url: input.image_url,
        }
    }
}

/// Input for creating a specialty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSpecialtyInput {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}
