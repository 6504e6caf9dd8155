use crate::collect::adapter::{FetchError, Platform, RawPost, SourceAdapter};
use crate::settings::settings;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

pub const PUBLIC_API_BASE: &str = "https://public.api.bsky.app/xrpc";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    posts: Vec<PostView>,
    #[allow(dead_code)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorFeedResponse {
    feed: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    post: PostView,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostView {
    uri: String,
    author: Author,
    record: Record,
    indexed_at: String,
    #[serde(default)]
    like_count: i32,
    #[serde(default)]
    repost_count: i32,
    #[serde(default)]
    reply_count: i32,
}

#[derive(Debug, Deserialize)]
struct Author {
    did: String,
    handle: String,
}

#[derive(Debug, Deserialize)]
struct Record {
    text: String,
}

pub struct BlueskyAdapter {
    client: reqwest::Client,
}

impl BlueskyAdapter {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(
                settings().collection.request_timeout_secs,
            ))
            .build()
            .expect("reqwest client");
        Self { client }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(FetchError::from_request)?;

        if !response.status().is_success() {
            return Err(FetchError::from_response(response.status()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

impl Default for BlueskyAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn to_raw_post(view: PostView) -> RawPost {
    // rkey is the last segment of the at:// uri.
    let rkey = view.uri.rsplit('/').next().unwrap_or(&view.uri).to_string();
    let timestamp = DateTime::parse_from_rfc3339(&view.indexed_at)
        .map(|dt| dt.with_timezone(&Utc))
        .ok();
    let url = format!(
        "https://bsky.app/profile/{}/post/{}",
        view.author.handle, rkey
    );

    RawPost {
        platform: Platform::Bluesky,
        native_id: rkey,
        author_id: view.author.did.clone(),
        author_handle: view.author.handle.clone(),
        content: view.record.text.clone(),
        timestamp,
        url,
        likes: view.like_count,
        shares: view.repost_count,
        comments: view.reply_count,
        raw: serde_json::json!({
            "uri": view.uri,
            "author_did": view.author.did,
            "indexed_at": view.indexed_at,
            "like_count": view.like_count,
            "repost_count": view.repost_count,
            "reply_count": view.reply_count,
            "text": view.record.text,
        }),
    }
}

#[async_trait]
impl SourceAdapter for BlueskyAdapter {
    fn platform(&self) -> Platform {
        Platform::Bluesky
    }

    /// searchPosts applies the since bound server-side (inclusive).
    async fn search(
        &self,
        query: &str,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<RawPost>, FetchError> {
        let mut url = format!(
            "{}/app.bsky.feed.searchPosts?q={}&limit={}",
            PUBLIC_API_BASE,
            urlencoding::encode(query),
            limit.min(100)
        );
        if let Some(since) = since {
            url.push_str(&format!("&since={}", urlencoding::encode(&since.to_rfc3339())));
        }

        let response: SearchResponse = self.get_json(&url).await?;
        Ok(response.posts.into_iter().map(to_raw_post).collect())
    }

    /// getAuthorFeed has no since parameter; the bound is applied
    /// client-side (inclusive) over indexed_at.
    async fn feed(
        &self,
        source: &str,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<RawPost>, FetchError> {
        let url = format!(
            "{}/app.bsky.feed.getAuthorFeed?actor={}&limit={}",
            PUBLIC_API_BASE,
            urlencoding::encode(source),
            limit.min(100)
        );

        let response: AuthorFeedResponse = self.get_json(&url).await?;
        let posts = response
            .feed
            .into_iter()
            .map(|item| to_raw_post(item.post))
            .filter(|p| match (since, p.timestamp) {
                (Some(bound), Some(ts)) => ts >= bound,
                _ => true,
            })
            .collect();
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(json: serde_json::Value) -> PostView {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_post_view_maps_to_raw_post() {
        let raw = to_raw_post(view(serde_json::json!({
            "uri": "at://did:plc:abc/app.bsky.feed.post/3kxyz",
            "author": {"did": "did:plc:abc", "handle": "someone.bsky.social"},
            "record": {"text": "Reston rents keep climbing"},
            "indexedAt": "2026-08-01T12:00:00Z",
            "likeCount": 4,
            "repostCount": 1,
            "replyCount": 2
        })));

        assert_eq!(raw.native_id, "3kxyz");
        assert_eq!(raw.author_handle, "someone.bsky.social");
        assert_eq!(raw.likes, 4);
        assert_eq!(raw.shares, 1);
        assert_eq!(raw.comments, 2);
        assert_eq!(
            raw.url,
            "https://bsky.app/profile/someone.bsky.social/post/3kxyz"
        );
        assert!(raw.timestamp.is_some());
    }

    #[test]
    fn test_missing_counters_default_to_zero() {
        let raw = to_raw_post(view(serde_json::json!({
            "uri": "at://did:plc:abc/app.bsky.feed.post/3kxyz",
            "author": {"did": "did:plc:abc", "handle": "someone.bsky.social"},
            "record": {"text": "quiet post"},
            "indexedAt": "2026-08-01T12:00:00Z"
        })));

        assert_eq!(raw.likes, 0);
        assert_eq!(raw.shares, 0);
        assert_eq!(raw.comments, 0);
    }

    #[test]
    fn test_unparseable_timestamp_becomes_none() {
        let raw = to_raw_post(view(serde_json::json!({
            "uri": "at://did:plc:abc/app.bsky.feed.post/3kxyz",
            "author": {"did": "did:plc:abc", "handle": "someone.bsky.social"},
            "record": {"text": "odd timestamp"},
            "indexedAt": "not-a-date"
        })));

        assert!(raw.timestamp.is_none());
    }
}
