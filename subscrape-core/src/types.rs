use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Author shown when the account behind a post is deleted or suspended.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

pub const DEFAULT_USER_AGENT: &str = "subscrape/0.1 (desktop)";

/// One exported row: a top post that passed the recency filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub body: String,
    pub score: i32,
    pub comment_count: u32,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl RedditCredentials {
    pub fn new(client_id: String, client_secret: String, user_agent: String) -> Self {
        Self {
            client_id,
            client_secret,
            user_agent,
        }
    }

    /// Pre-populate from the environment. Fields stay editable in the form.
    pub fn from_env() -> Self {
        Self {
            client_id: std::env::var("REDDIT_CLIENT_ID").unwrap_or_default(),
            client_secret: std::env::var("REDDIT_CLIENT_SECRET").unwrap_or_default(),
            user_agent: std::env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        }
    }

    /// Callers must check this before handing the credentials to the client.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (field, value) in [
            ("client ID", &self.client_id),
            ("client secret", &self.client_secret),
            ("user agent", &self.user_agent),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::MissingCredentials {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> RedditCredentials {
        RedditCredentials::new(
            "test_client_id".to_string(),
            "test_client_secret".to_string(),
            "subscrape/0.1 by test_user".to_string(),
        )
    }

    #[test]
    fn test_complete_credentials_validate() {
        assert!(filled().validate().is_ok());
    }

    #[test]
    fn test_missing_client_id() {
        let mut creds = filled();
        creds.client_id = String::new();

        let result = creds.validate();
        assert!(matches!(
            result,
            Err(CoreError::MissingCredentials { ref field }) if field == "client ID"
        ));
    }

    #[test]
    fn test_whitespace_secret_is_missing() {
        let mut creds = filled();
        creds.client_secret = "   ".to_string();

        assert!(matches!(
            creds.validate(),
            Err(CoreError::MissingCredentials { ref field }) if field == "client secret"
        ));
    }

    #[test]
    fn test_missing_user_agent() {
        let mut creds = filled();
        creds.user_agent = String::new();

        assert!(matches!(
            creds.validate(),
            Err(CoreError::MissingCredentials { ref field }) if field == "user agent"
        ));
    }
}
