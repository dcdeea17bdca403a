//! Hospital service
//!
//! Listing, lookup and creation of hospitals. Hospitals are never edited.

use crate::db::repositories::HospitalRepository;
use crate::models::{CreateHospitalInput, Hospital};
use crate::services::require_field;
use anyhow::Context;
use std::sync::Arc;

/// Error types for hospital service operations
#[derive(Debug, thiserror::Error)]
pub enum HospitalServiceError {
    /// Hospital not found
    #[error("Hospital not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct HospitalService {
    repo: Arc<dyn HospitalRepository>,
}

impl HospitalService {
    pub fn new(repo: Arc<dyn HospitalRepository>) -> Self {
        Self { repo }
    }

    /// All hospitals ordered by name
    pub async fn list(&self) -> Result<Vec<Hospital>, HospitalServiceError> {
        Ok(self.repo.list().await.context("Failed to list hospitals")?)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Hospital>, HospitalServiceError> {
        Ok(self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get hospital")?)
    }

    /// Like [`get_by_id`](Self::get_by_id) but a miss is `NotFound`
    pub async fn require(&self, id: &str) -> Result<Hospital, HospitalServiceError> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| HospitalServiceError::NotFound(id.to_string()))
    }

    /// Create a hospital after checking that no field is blank
    pub async fn create(&self, input: CreateHospitalInput) -> Result<Hospital, HospitalServiceError> {
        let input = CreateHospitalInput {
            name: require_field("name", &input.name).map_err(HospitalServiceError::ValidationError)?,
            address: require_field("address", &input.address)
                .map_err(HospitalServiceError::ValidationError)?,
            phone: require_field("phone", &input.phone)
                .map_err(HospitalServiceError::ValidationError)?,
        };

        let hospital = Hospital::new(input);
        let created = self
            .repo
            .create(&hospital)
            .await
            .context("Failed to create hospital")?;

        tracing::info!(hospital_id = %created.id, "Created hospital {}", created.name);
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, repositories::SqlxHospitalRepository};

    async fn setup_service() -> HospitalService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        HospitalService::new(SqlxHospitalRepository::boxed(pool))
    }

    fn input(name: &str) -> CreateHospitalInput {
        CreateHospitalInput {
            name: name.to_string(),
            address: "Av. Goiás, 1000 - Barcelona".to_string(),
            phone: "(11) 4229-5678".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_get_and_missing() {
        let service = setup_service().await;

        let created = service.create(input("  Hospital Dr. Manoel de Abreu ")).await.unwrap();
        let found = service.get_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(found.name, "Hospital Dr. Manoel de Abreu");
        assert!(service.get_by_id("does-not-exist").await.unwrap().is_none());
        assert!(matches!(
            service.require("does-not-exist").await,
            Err(HospitalServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_fields() {
        let service = setup_service().await;

        let mut bad = input("Hospital");
        bad.phone = "   ".to_string();
        let result = service.create(bad).await;

        assert!(matches!(result, Err(HospitalServiceError::ValidationError(_))));
        assert!(service.list().await.unwrap().is_empty());
    }
}
