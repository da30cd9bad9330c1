use std::time::{Duration, SystemTime};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use subscrape_core::{CoreError, RedditApiError, RedditCredentials};
use tracing::{debug, error, info};

const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

// Tokens within this many seconds of expiry count as expired.
const EXPIRY_LEEWAY_SECS: u64 = 60;

/// Application-only token. Reddit grants these without a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
    pub scope: String,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() + Duration::from_secs(EXPIRY_LEEWAY_SECS) >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: u64,
    #[serde(default)]
    scope: String,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug)]
pub struct RedditAuthenticator {
    http_client: Client,
    credentials: RedditCredentials,
    token_url: String,
}

impl RedditAuthenticator {
    pub fn new(credentials: RedditCredentials) -> Self {
        Self::with_token_url(credentials, REDDIT_TOKEN_URL)
    }

    /// Endpoint override for tests running against a local server.
    pub fn with_token_url(credentials: RedditCredentials, token_url: impl Into<String>) -> Self {
        let http_client = Client::builder()
            .user_agent(&credentials.user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            credentials,
            token_url: token_url.into(),
        }
    }

    /// Exchange the script credentials for an application-only access token.
    pub async fn request_token(&self) -> Result<RedditToken, CoreError> {
        info!("Requesting application-only Reddit token");

        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .header("User-Agent", &self.credentials.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| {
                error!("Token request failed: {}", e);
                if e.is_timeout() {
                    CoreError::RedditApi(RedditApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        match status.as_u16() {
            401 | 403 => {
                error!("Token request rejected with status {}", status);
                return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: format!("credentials rejected (HTTP {})", status.as_u16()),
                }));
            }
            code if status.is_server_error() => {
                error!("Token endpoint server error: {}", status);
                return Err(CoreError::RedditApi(RedditApiError::ServerError {
                    status_code: code,
                }));
            }
            code if !status.is_success() => {
                return Err(CoreError::RedditApi(RedditApiError::InvalidResponse {
                    details: format!("Unexpected status {} from token endpoint", code),
                }));
            }
            _ => {}
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            error!("Failed to parse token response: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: "Failed to parse token response".to_string(),
            })
        })?;

        // Reddit reports grant-type problems as 200s with an error field.
        if let Some(error) = token_response.error {
            error!("Token endpoint returned error: {}", error);
            return Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: error,
            }));
        }

        let access_token = token_response.access_token.ok_or_else(|| {
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: "Token response missing access_token".to_string(),
            })
        })?;

        debug!(
            "Received token valid for {} seconds",
            token_response.expires_in
        );
        Ok(RedditToken {
            access_token,
            expires_at: SystemTime::now() + Duration::from_secs(token_response.expires_in),
            scope: token_response.scope,
        })
    }
}
