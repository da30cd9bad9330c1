pub mod api;
pub mod auth;
pub mod collector;


use chrono::{DateTime, Utc};
use subscrape_core::{CoreError, PostRecord, RedditCredentials};
use tokio::sync::Mutex;
use tracing::debug;

pub use api::RedditApiClient;
pub use auth::{RedditAuthenticator, RedditToken};

pub struct RedditClient {
    authenticator: RedditAuthenticator,
    api: RedditApiClient,
    token: Mutex<Option<RedditToken>>,
}

impl RedditClient {
    pub fn new(credentials: RedditCredentials) -> Self {
        let api = RedditApiClient::new(credentials.user_agent.clone());
        let authenticator = RedditAuthenticator::new(credentials);
        Self {
            authenticator,
            api,
            token: Mutex::new(None),
        }
    }

    /// Endpoint overrides for tests running against a local mock server.
    pub fn with_endpoints(
        credentials: RedditCredentials,
        token_url: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        let api = RedditApiClient::with_base_url(credentials.user_agent.clone(), api_base);
        let authenticator = RedditAuthenticator::with_token_url(credentials, token_url);
        Self {
            authenticator,
            api,
            token: Mutex::new(None),
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(&*self.token.lock().await, Some(token) if !token.is_expired())
    }

    /// Get a usable access token, reusing the cached one until it expires.
    pub async fn authenticate(&self) -> Result<RedditToken, CoreError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if !token.is_expired() {
                debug!("Reusing cached Reddit token");
                return Ok(token.clone());
            }
        }

        let token = self.authenticator.request_token().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    /// Top posts for a subreddit created within the recency window, capped
    /// at [`collector::RESULT_LIMIT`], in listing rank order.
    pub async fn fetch_top_posts(
        &self,
        subreddit: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<PostRecord>, CoreError> {
        let token = self.authenticate().await?;
        collector::collect_top_posts(&self.api, &token.access_token, subreddit, now).await
    }
}
