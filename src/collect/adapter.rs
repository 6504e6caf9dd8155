use async_trait::async_trait;
use chrono::{DateTime, Utc};
use strum::{Display, EnumString};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    Bluesky,
    Reddit,
}

/// One platform record, already mapped out of the platform-native response
/// shape but not yet normalized into a stored Post.
#[derive(Debug, Clone)]
pub struct RawPost {
    pub platform: Platform,
    pub native_id: String,
    pub author_id: String,
    pub author_handle: String,
    pub content: String,
    /// Event time on the platform. None when the source omits it; ingestion
    /// falls back to now().
    pub timestamp: Option<DateTime<Utc>>,
    pub url: String,
    pub likes: i32,
    pub shares: i32,
    pub comments: i32,
    pub raw: serde_json::Value,
}

/// Adapter call outcomes the orchestrator can branch on without
/// string-matching error messages. Everything except `Auth` is transient:
/// the query gets skipped and the run continues.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited")]
    RateLimited,

    #[error("unexpected response shape: {0}")]
    Malformed(String),

    #[error("platform rejected credentials: {0}")]
    Auth(String),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        !matches!(self, FetchError::Auth(_))
    }

    pub fn from_response(status: reqwest::StatusCode) -> FetchError {
        match status.as_u16() {
            401 | 403 => FetchError::Auth(status.to_string()),
            429 => FetchError::RateLimited,
            _ => FetchError::Network(format!("status {status}")),
        }
    }

    pub fn from_request(err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// One adapter per platform. `search` covers query-scoped collection;
/// `feed` covers the platform's listing capability (an author feed on
/// Bluesky, a subreddit listing on Reddit).
///
/// Empty results are Ok(vec![]), never an error. The since-timestamp is an
/// inclusive lower bound; whether the platform applies it server-side or the
/// adapter filters client-side is documented per adapter.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    async fn search(
        &self,
        query: &str,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<RawPost>, FetchError>;

    async fn feed(
        &self,
        source: &str,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<RawPost>, FetchError>;
}
