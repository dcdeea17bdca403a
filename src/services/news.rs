//! News service

use crate::db::repositories::NewsRepository;
use crate::models::{CreateNewsInput, News};
use crate::services::illustration::{IllustrationError, IllustrationOutcome, IllustrationService};
use crate::services::require_field;
use anyhow::Context;
use std::sync::Arc;

/// Error types for news service operations
#[derive(Debug, thiserror::Error)]
pub enum NewsServiceError {
    #[error("News not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Illustration(#[from] IllustrationError),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct NewsService {
    repo: Arc<dyn NewsRepository>,
    illustrations: Arc<IllustrationService>,
}

impl NewsService {
    pub fn new(repo: Arc<dyn NewsRepository>, illustrations: Arc<IllustrationService>) -> Self {
        Self { repo, illustrations }
    }

    /// All news, newest first
    pub async fn list(&self) -> Result<Vec<News>, NewsServiceError> {
        Ok(self.repo.list().await.context("Failed to list news")?)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<News>, NewsServiceError> {
        Ok(self.repo.get_by_id(id).await.context("Failed to get news")?)
    }

    pub async fn require(&self, id: &str) -> Result<News, NewsServiceError> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| NewsServiceError::NotFound(id.to_string()))
    }

    /// Publish a news item; title, summary, content and category are required
    pub async fn create(&self, input: CreateNewsInput) -> Result<News, NewsServiceError> {
        let validate = |field: &str, value: &str| {
            require_field(field, value).map_err(NewsServiceError::ValidationError)
        };
        let news = News::new(CreateNewsInput {
            title: validate("title", &input.title)?,
            summary: validate("summary", &input.summary)?,
            content: validate("content", &input.content)?,
            category: validate("category", &input.category)?,
            image_url: input.image_url.filter(|u| !u.trim().is_empty()),
        });

        let created = self
            .repo
            .create(&news)
            .await
            .context("Failed to create news")?;

        tracing::info!(news_id = %created.id, "Published news: {}", created.title);
        Ok(created)
    }

    pub async fn update_image(&self, id: &str, image_url: &str) -> Result<(), NewsServiceError> {
        let updated = self
            .repo
            .update_image(id, image_url)
            .await
            .context("Failed to update news image")?;

        if !updated {
            return Err(NewsServiceError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Generate an image for the news item from its title and category and
    /// store the URL when one was produced.
    pub async fn generate_illustration(
        &self,
        id: &str,
    ) -> Result<IllustrationOutcome, NewsServiceError> {
        let news = self.require(id).await?;

        let outcome = self
            .illustrations
            .generate_news_image(&news.title, &news.category)
            .await?;

        if let Some(url) = outcome.url() {
            self.update_image(id, url).await?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IllustrationConfig;
    use crate::db::Storage;

    fn input(title: &str) -> CreateNewsInput {
        CreateNewsInput {
            title: title.to_string(),
            summary: "Resumo".to_string(),
            content: "Texto completo".to_string(),
            category: "Saúde".to_string(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_newest_first() {
        let service = NewsService::new(
            Storage::in_memory().news,
            Arc::new(IllustrationService::disabled().unwrap()),
        );

        service.create(input("primeira")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        service.create(input("segunda")).await.unwrap();

        let list = service.list().await.unwrap();
        assert_eq!(list[0].title, "segunda");
        assert_eq!(list[1].title, "primeira");
    }

    #[tokio::test]
    async fn test_create_rejects_blank_category() {
        let service = NewsService::new(
            Storage::in_memory().news,
            Arc::new(IllustrationService::disabled().unwrap()),
        );
        let mut bad = input("x");
        bad.category = String::new();

        assert!(matches!(
            service.create(bad).await,
            Err(NewsServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_record_unchanged() {
        // Nothing listens on port 9 of localhost, so the request fails fast
        let illustrations = IllustrationService::new(&IllustrationConfig {
            api_key: Some("key".to_string()),
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 2,
            ..IllustrationConfig::default()
        })
        .unwrap();
        let service = NewsService::new(Storage::in_memory().news, Arc::new(illustrations));
        let created = service.create(input("Vacinação")).await.unwrap();

        let result = service.generate_illustration(&created.id).await;

        assert!(matches!(
            result,
            Err(NewsServiceError::Illustration(IllustrationError::GenerationFailed))
        ));
        assert!(service.require(&created.id).await.unwrap().image_url.is_none());
    }
}
