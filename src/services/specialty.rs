//! Specialty service
//!
//! Specialty listing and creation, plus illustration generation: the image
//! URL is stored only when the provider actually produced one.

use crate::db::repositories::SpecialtyRepository;
use crate::models::{CreateSpecialtyInput, Specialty};
use crate::services::illustration::{IllustrationError, IllustrationOutcome, IllustrationService};
use crate::services::require_field;
use anyhow::Context;
use std::sync::Arc;

/// Error types for specialty service operations
#[derive(Debug, thiserror::Error)]
pub enum SpecialtyServiceError {
    #[error("Specialty not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Illustration(#[from] IllustrationError),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct SpecialtyService {
    repo: Arc<dyn SpecialtyRepository>,
    illustrations: Arc<IllustrationService>,
}

impl SpecialtyService {
    pub fn new(repo: Arc<dyn SpecialtyRepository>, illustrations: Arc<IllustrationService>) -> Self {
        Self { repo, illustrations }
    }

    pub async fn list(&self) -> Result<Vec<Specialty>, SpecialtyServiceError> {
        Ok(self.repo.list().await.context("Failed to list specialties")?)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Specialty>, SpecialtyServiceError> {
        Ok(self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get specialty")?)
    }

    pub async fn require(&self, id: &str) -> Result<Specialty, SpecialtyServiceError> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| SpecialtyServiceError::NotFound(id.to_string()))
    }

    pub async fn create(
        &self,
        input: CreateSpecialtyInput,
    ) -> Result<Specialty, SpecialtyServiceError> {
        let name =
            require_field("name", &input.name).map_err(SpecialtyServiceError::ValidationError)?;
        let specialty = Specialty::new(CreateSpecialtyInput {
            name,
            image_url: input.image_url.filter(|u| !u.trim().is_empty()),
        });

        Ok(self
            .repo
            .create(&specialty)
            .await
            .context("Failed to create specialty")?)
    }

    /// Set the illustration URL of an existing specialty
    pub async fn update_image(&self, id: &str, image_url: &str) -> Result<(), SpecialtyServiceError> {
        let updated = self
            .repo
            .update_image(id, image_url)
            .await
            .context("Failed to update specialty image")?;

        if !updated {
            return Err(SpecialtyServiceError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Generate an icon for the specialty and store its URL.
    ///
    /// Returns `Unavailable` without touching the record when image
    /// generation is not configured.
    pub async fn generate_illustration(
        &self,
        id: &str,
    ) -> Result<IllustrationOutcome, SpecialtyServiceError> {
        let specialty = self.require(id).await?;

        let outcome = self
            .illustrations
            .generate_specialty_icon(&specialty.name)
            .await?;

        if let Some(url) = outcome.url() {
            self.update_image(id, url).await?;
            tracing::info!(specialty_id = %id, "Stored generated specialty illustration");
        }
        Ok(outcome)
    }
}
