//! User model
//!
//! Portal accounts are identified by email. There are no roles: any
//! authenticated user may book appointments and manage reference data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered portal user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (UUID text)
    pub id: String,
    /// Email address (unique)
    pub email: String,
    pub phone: Option<String>,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User.
    ///
    /// The password must already be hashed, see `services::password::hash_password`.
    pub fn new(email: String, phone: Option<String>, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            phone,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for registering a user (before password hashing)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Plaintext password (will be hashed)
    pub password: String,
}

/// Profile changes: only `Some` fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileInput {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new(
            "maria@example.com".to_string(),
            Some("(11) 99999-0000".to_string()),
            "hashed_password".to_string(),
        );

        assert!(Uuid::parse_str(&user.id).is_ok());
        assert_eq!(user.email, "maria@example.com");
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new("a@b.com".to_string(), None, "secret-hash".to_string());
        let json = serde_json::to_string(&user).unwrap();

        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));
    }
}
