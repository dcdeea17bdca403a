//! News model
//!
//! Health news items shown on the portal home page, newest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A health news item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct News {
    /// Unique identifier (UUID text)
    pub id: String,
    pub title: String,
    /// Short teaser shown in listings
    pub summary: String,
    /// Full body text
    pub content: String,
    /// Free-form category label (e.g. "Prevenção")
    pub category: String,
    /// Illustration URL, set after creation
    pub image_url: Option<String>,
    /// Publication timestamp, the listing order key
    pub created_at: DateTime<Utc>,
}

impl News {
    /// Build a news item stamped with the current time.
    pub fn new(input: CreateNewsInput) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            summary: input.summary,
            content: input.content,
            category: input.category,
            image_url: input.image_url,
            created_at: Utc::now(),
        }
    }
}

/// Input for creating a news item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNewsInput {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
}
