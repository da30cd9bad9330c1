use crate::error::*;
use tracing::error;

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn user_friendly_message(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        if let CoreError::RedditApi(e) = self {
            error!("Reddit API error details: {:?}", e);
        }
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::Io(e) => format!("Could not write file: {}", e),
            CoreError::Serialization(_) => {
                "Received data that could not be parsed.".to_string()
            }
            CoreError::MissingCredentials { field } => {
                format!("Please fill in the {} field.", field)
            }
            CoreError::Internal { .. } => {
                "An unexpected error occurred. Please try again later.".to_string()
            }
        }
    }
}

impl RedditApiError {
    pub fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } | RedditApiError::InvalidToken => {
                "Reddit rejected the API credentials. Check your client ID and secret.".to_string()
            }
            RedditApiError::SubredditNotFound { subreddit } => {
                format!(
                    "Subreddit r/{} was not found. It may be private or banned.",
                    subreddit
                )
            }
            RedditApiError::Forbidden { resource } => {
                format!("Access to {} is forbidden.", resource)
            }
            RedditApiError::NotFound { resource } => format!("Could not find: {}", resource),
            RedditApiError::RateLimitExceeded { retry_after } => {
                format!(
                    "Reddit is rate limiting requests. Try again in {} seconds.",
                    retry_after
                )
            }
            RedditApiError::RequestTimeout => {
                "The request to Reddit timed out. Please try again.".to_string()
            }
            RedditApiError::InvalidResponse { .. } => {
                "Reddit returned an unexpected response.".to_string()
            }
            RedditApiError::ServerError { status_code } => {
                format!(
                    "Reddit is having server trouble (HTTP {}). Try again later.",
                    status_code
                )
            }
        }
    }
}
