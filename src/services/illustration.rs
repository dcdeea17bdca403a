//! Illustration service
//!
//! Generates friendly medical illustrations through an OpenAI-compatible
//! images endpoint. One outbound request per call, no retries. Without an API
//! key the service reports [`IllustrationOutcome::Unavailable`] instead of
//! failing, so the portal keeps working with placeholder images.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::IllustrationConfig;

/// Result of a generation request that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IllustrationOutcome {
    /// The provider returned an image URL
    Generated { url: String },
    /// No API key is configured
    Unavailable,
}

impl IllustrationOutcome {
    pub fn url(&self) -> Option<&str> {
        match self {
            IllustrationOutcome::Generated { url } => Some(url),
            IllustrationOutcome::Unavailable => None,
        }
    }
}

/// Error types for illustration generation
#[derive(Debug, thiserror::Error)]
pub enum IllustrationError {
    /// The provider call failed or returned no image
    #[error("Failed to generate illustration")]
    GenerationFailed,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    quality: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

/// Wrap a subject in the portal's house style
pub fn medical_illustration_prompt(subject: &str) -> String {
    format!(
        "Medical illustration in a friendly, modern, accessible style: {}. Clean, professional, \
         welcoming aesthetic suitable for all ages, especially elderly patients. Use warm, \
         trustworthy colors.",
        subject
    )
}

pub fn specialty_icon_prompt(specialty_name: &str) -> String {
    format!(
        "A simple, clear medical icon representing {} specialty. Minimalist, friendly design \
         with medical symbols. High contrast, easy to understand for elderly patients.",
        specialty_name
    )
}

pub fn news_image_prompt(title: &str, category: &str) -> String {
    format!(
        "Illustration for health news article titled \"{}\" in category {}. Warm, educational, \
         accessible style showing diverse Brazilian people in healthcare context. Positive, \
         encouraging mood.",
        title, category
    )
}

/// Client for the image-generation API
pub struct IllustrationService {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
    size: String,
    quality: String,
}

impl IllustrationService {
    /// Build the service from configuration.
    ///
    /// A missing or blank API key yields an unavailable service.
    pub fn new(config: &IllustrationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        let api_key = if config.is_configured() {
            config.api_key.clone()
        } else {
            None
        };

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/images/generations", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            size: config.size.clone(),
            quality: config.quality.clone(),
        })
    }

    /// An always-unavailable service
    pub fn disabled() -> Result<Self> {
        Self::new(&IllustrationConfig {
            api_key: None,
            ..IllustrationConfig::default()
        })
    }

    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate an illustration of `subject` in the medical house style.
    pub async fn generate(&self, subject: &str) -> Result<IllustrationOutcome, IllustrationError> {
        let Some(api_key) = &self.api_key else {
            tracing::warn!("Illustration API key not configured, skipping image generation");
            return Ok(IllustrationOutcome::Unavailable);
        };

        let prompt = medical_illustration_prompt(subject);
        match self.request_image(api_key, &prompt).await {
            Ok(url) => Ok(IllustrationOutcome::Generated { url }),
            Err(e) => {
                tracing::error!("Error generating image: {:#}", e);
                Err(IllustrationError::GenerationFailed)
            }
        }
    }

    pub async fn generate_specialty_icon(
        &self,
        specialty_name: &str,
    ) -> Result<IllustrationOutcome, IllustrationError> {
        self.generate(&specialty_icon_prompt(specialty_name)).await
    }

    pub async fn generate_news_image(
        &self,
        title: &str,
        category: &str,
    ) -> Result<IllustrationOutcome, IllustrationError> {
        self.generate(&news_image_prompt(title, category)).await
    }

    async fn request_image(&self, api_key: &str, prompt: &str) -> Result<String> {
        let body = ImageRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: &self.size,
            quality: &self.quality,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send image generation request")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Image API returned {}: {}", status, text);
        }

        let parsed: ImageResponse = response
            .json()
            .await
            .context("Failed to parse image generation response")?;

        // No usable URL is a failed generation (502), never an empty `image_url`
        parsed
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Image API response contained no URL"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    /// Serve `handler` on an ephemeral port and return its base URL
    async fn mock_provider(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config_for(base_url: String) -> IllustrationConfig {
        IllustrationConfig {
            api_key: Some("test-key".to_string()),
            base_url,
            timeout_seconds: 5,
            ..IllustrationConfig::default()
        }
    }

    #[tokio::test]
    async fn test_unconfigured_is_unavailable() {
        let service = IllustrationService::disabled().unwrap();

        assert!(!service.is_available());
        let outcome = service.generate("cardiology").await.unwrap();
        assert_eq!(outcome, IllustrationOutcome::Unavailable);
        assert!(outcome.url().is_none());
    }

    #[tokio::test]
    async fn test_blank_key_is_unavailable() {
        let service = IllustrationService::new(&IllustrationConfig {
            api_key: Some("  ".to_string()),
            ..IllustrationConfig::default()
        })
        .unwrap();

        assert!(!service.is_available());
    }

    #[tokio::test]
    async fn test_generated_url_and_request_shape() {
        let router = Router::new().route(
            "/images/generations",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                if auth != "Bearer test-key" {
                    return (StatusCode::UNAUTHORIZED, Json(json!({})));
                }
                assert_eq!(body["model"], "dall-e-3");
                assert_eq!(body["n"], 1);
                assert_eq!(body["size"], "1024x1024");
                assert_eq!(body["quality"], "standard");
                assert!(body["prompt"]
                    .as_str()
                    .unwrap()
                    .starts_with("Medical illustration in a friendly"));
                (
                    StatusCode::OK,
                    Json(json!({ "data": [{ "url": "https://images.example/1.png" }] })),
                )
            }),
        );
        let base_url = mock_provider(router).await;
        let service = IllustrationService::new(&config_for(base_url)).unwrap();

        let outcome = service.generate_specialty_icon("Cardiologia").await.unwrap();

        assert_eq!(
            outcome,
            IllustrationOutcome::Generated {
                url: "https://images.example/1.png".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_provider_error_is_generation_failure() {
        let router = Router::new().route(
            "/images/generations",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base_url = mock_provider(router).await;
        let service = IllustrationService::new(&config_for(base_url)).unwrap();

        let result = service.generate_news_image("Vacinação", "Saúde").await;

        assert!(matches!(result, Err(IllustrationError::GenerationFailed)));
    }

    #[tokio::test]
    async fn test_missing_url_is_generation_failure() {
        let router = Router::new().route(
            "/images/generations",
            post(|| async { Json(json!({ "data": [] })) }),
        );
        let base_url = mock_provider(router).await;
        let service = IllustrationService::new(&config_for(base_url)).unwrap();

        let result = service.generate("anything").await;

        assert!(matches!(result, Err(IllustrationError::GenerationFailed)));
    }

    #[test]
    fn test_prompts_embed_inputs() {
        assert!(specialty_icon_prompt("Pediatria").contains("representing Pediatria specialty"));
        let news = news_image_prompt("Campanha", "Prevenção");
        assert!(news.contains("titled \"Campanha\""));
        assert!(news.contains("category Prevenção"));
        assert!(medical_illustration_prompt("x").contains(": x."));
    }
}
