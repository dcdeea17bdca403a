//! Hospital model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A municipal hospital or care unit.
///
/// Hospitals are reference data: created by the seed or by an operator and
/// never edited afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hospital {
    /// Unique identifier (UUID text)
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
}

impl Hospital {
    /// Build a hospital with a freshly generated ID.
    pub fn new(input: CreateHospitalInput) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            address: input.address,
            phone: input.phone,
        }
    }
}

/// Input for creating a hospital
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHospitalInput {
    pub name: String,
    pub address: String,
    pub phone: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hospital_new_generates_distinct_ids() {
        let input = CreateHospitalInput {
            name: "Hospital Central".to_string(),
            address: "Rua A, 1".to_string(),
            phone: "(11) 1111-1111".to_string(),
        };

        let a = Hospital::new(input.clone());
        let b = Hospital::new(input);

        assert_ne!(a.id, b.id);
        assert_eq!(a.name, "Hospital Central");
        assert!(Uuid::parse_str(&a.id).is_ok());
    }
}
