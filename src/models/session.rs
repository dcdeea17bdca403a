//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session entity for user authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (token)
    pub id: String,
    /// Associated user ID
    pub user_id: String,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Start a session for `user_id` lasting `duration`.
    ///
    /// The token is two concatenated v4 UUIDs without dashes (244 random bits).
    pub fn new(user_id: &str, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
            user_id: user_id.to_string(),
            expires_at: now + duration,
            created_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
