use std::time::Duration;

use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use subscrape_core::{CoreError, RedditApiError};
use tracing::{debug, error, info, warn};

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

/// Listing payload trimmed to the fields the collector consumes. `author`
/// is absent when the account was deleted or suspended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub author: Option<String>,
    pub url: String,
    pub created_utc: f64,
    #[serde(default)]
    pub score: i32,
    #[serde(default)]
    pub num_comments: u32,
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    user_agent: String,
    base_url: String,
}

impl RedditApiClient {
    pub fn new(user_agent: String) -> Self {
        Self::with_base_url(user_agent, REDDIT_API_BASE)
    }

    /// Base-URL override for tests running against a local server.
    pub fn with_base_url(user_agent: String, base_url: impl Into<String>) -> Self {
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            user_agent,
            base_url: base_url.into(),
        }
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .header("User-Agent", &self.user_agent);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }

        info!("Making Reddit API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        match status.as_u16() {
            401 => Err(CoreError::RedditApi(RedditApiError::InvalidToken)),
            403 => Err(CoreError::RedditApi(RedditApiError::Forbidden {
                resource: endpoint.to_string(),
            })),
            404 => Err(CoreError::RedditApi(RedditApiError::NotFound {
                resource: endpoint.to_string(),
            })),
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited, retry after {} seconds", retry_after);
                Err(CoreError::RedditApi(RedditApiError::RateLimitExceeded {
                    retry_after,
                }))
            }
            code if status.is_server_error() => {
                Err(CoreError::RedditApi(RedditApiError::ServerError {
                    status_code: code,
                }))
            }
            code => Err(CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Unexpected status {} for {}", code, endpoint),
            })),
        }
    }

    /// Fetch one page of the all-time top listing for a subreddit.
    pub async fn get_top_posts(
        &self,
        access_token: &str,
        subreddit: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/top", subreddit);
        let limit_str = limit.to_string();
        let mut params = vec![("t", "all"), ("limit", limit_str.as_str())];
        if let Some(after_val) = after {
            params.push(("after", after_val));
        }

        let response = match self
            .make_request(Method::GET, &endpoint, access_token, Some(params.as_slice()))
            .await
        {
            Ok(response) => response,
            // A private subreddit answers 403 and a missing one 404; both
            // read as "not found" to the caller.
            Err(CoreError::RedditApi(
                RedditApiError::Forbidden { .. } | RedditApiError::NotFound { .. },
            )) => {
                return Err(CoreError::RedditApi(RedditApiError::SubredditNotFound {
                    subreddit: subreddit.to_string(),
                }))
            }
            Err(e) => return Err(e),
        };

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }
}
