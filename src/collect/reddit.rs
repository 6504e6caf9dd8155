use crate::collect::adapter::{FetchError, Platform, RawPost, SourceAdapter};
use crate::settings::settings;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;

pub const API_BASE: &str = "https://www.reddit.com";
const USER_AGENT: &str = "district-pulse/0.1 (civic listening pipeline)";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    kind: String,
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Submission {
    id: String,
    author: Option<String>,
    title: String,
    #[serde(default)]
    selftext: String,
    created_utc: f64,
    permalink: String,
    #[serde(default)]
    score: i32,
    #[serde(default)]
    num_comments: i32,
    subreddit: String,
}

#[derive(Debug, Deserialize)]
struct Comment {
    id: String,
    author: Option<String>,
    body: String,
    created_utc: f64,
    permalink: String,
    #[serde(default)]
    score: i32,
}

pub struct RedditAdapter {
    client: reqwest::Client,
}

impl RedditAdapter {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
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

    /// Top-level comments of a submission become posts of their own,
    /// capped by `comments_per_submission`. Comment fetch failures are
    /// swallowed per item; the submission itself is already collected.
    async fn fetch_comments(&self, submission_id: &str) -> Result<Vec<RawPost>, FetchError> {
        let cap = settings().collection.comments_per_submission;
        let url = format!(
            "{}/comments/{}.json?limit={}&depth=1&raw_json=1",
            API_BASE, submission_id, cap
        );

        // The comments endpoint returns [submission listing, comment listing].
        let listings: Vec<Listing> = self.get_json(&url).await?;
        let Some(comments) = listings.into_iter().nth(1) else {
            return Ok(Vec::new());
        };

        let mut posts = Vec::new();
        for child in comments.data.children {
            if child.kind != "t1" {
                continue;
            }
            let Ok(comment) = serde_json::from_value::<Comment>(child.data) else {
                continue;
            };
            if !is_district_relevant(&comment.body) {
                continue;
            }
            posts.push(comment_to_raw_post(comment));
            if posts.len() >= cap {
                break;
            }
        }
        Ok(posts)
    }
}

impl Default for RedditAdapter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn is_district_relevant(text: &str) -> bool {
    let text_lower = text.to_lowercase();
    settings()
        .collection
        .district_keywords
        .iter()
        .any(|kw| text_lower.contains(kw.as_str()))
}

fn submission_to_raw_post(submission: Submission) -> RawPost {
    let author = submission.author.unwrap_or_else(|| "[deleted]".to_string());
    let content = if submission.selftext.is_empty() {
        submission.title.clone()
    } else {
        format!("{}\n\n{}", submission.title, submission.selftext)
    };

    RawPost {
        platform: Platform::Reddit,
        native_id: submission.id.clone(),
        author_id: author.clone(),
        author_handle: author,
        content,
        timestamp: Utc.timestamp_opt(submission.created_utc as i64, 0).single(),
        url: format!("{}{}", API_BASE, submission.permalink),
        likes: submission.score,
        shares: 0,
        comments: submission.num_comments,
        raw: serde_json::json!({
            "id": submission.id,
            "subreddit": submission.subreddit,
            "title": submission.title,
            "score": submission.score,
            "num_comments": submission.num_comments,
            "permalink": submission.permalink,
        }),
    }
}

fn comment_to_raw_post(comment: Comment) -> RawPost {
    let author = comment.author.unwrap_or_else(|| "[deleted]".to_string());

    RawPost {
        platform: Platform::Reddit,
        native_id: comment.id.clone(),
        author_id: author.clone(),
        author_handle: author,
        content: comment.body.clone(),
        timestamp: Utc.timestamp_opt(comment.created_utc as i64, 0).single(),
        url: format!("{}{}", API_BASE, comment.permalink),
        likes: comment.score,
        shares: 0,
        comments: 0,
        raw: serde_json::json!({
            "id": comment.id,
            "is_comment": true,
            "score": comment.score,
            "permalink": comment.permalink,
        }),
    }
}

fn parse_submissions(listing: Listing) -> Vec<Submission> {
    listing
        .data
        .children
        .into_iter()
        .filter(|c| c.kind == "t3")
        .filter_map(|c| serde_json::from_value(c.data).ok())
        .collect()
}

fn within(since: Option<DateTime<Utc>>, post: &RawPost) -> bool {
    match (since, post.timestamp) {
        (Some(bound), Some(ts)) => ts >= bound,
        _ => true,
    }
}

#[async_trait]
impl SourceAdapter for RedditAdapter {
    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    /// Reddit search has no usable since parameter; the bound is applied
    /// client-side (inclusive) over created_utc.
    async fn search(
        &self,
        query: &str,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<RawPost>, FetchError> {
        let url = format!(
            "{}/search.json?q={}&sort=new&limit={}&raw_json=1",
            API_BASE,
            urlencoding::encode(query),
            limit.min(100)
        );

        let listing: Listing = self.get_json(&url).await?;
        let posts = parse_submissions(listing)
            .into_iter()
            .map(submission_to_raw_post)
            .filter(|p| within(since, p))
            .collect();
        Ok(posts)
    }

    /// Subreddit listing. The listing is not query-scoped, so submissions
    /// are pre-filtered by the district keyword list before storage, and
    /// matched submissions contribute their top comments as well.
    async fn feed(
        &self,
        source: &str,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<RawPost>, FetchError> {
        let url = format!(
            "{}/r/{}/new.json?limit={}&raw_json=1",
            API_BASE,
            source,
            limit.min(100)
        );

        let listing: Listing = self.get_json(&url).await?;
        let mut posts = Vec::new();

        for submission in parse_submissions(listing) {
            let full_text = format!("{} {}", submission.title, submission.selftext);
            if !is_district_relevant(&full_text) {
                continue;
            }

            let submission_id = submission.id.clone();
            let post = submission_to_raw_post(submission);
            if !within(since, &post) {
                continue;
            }
            posts.push(post);

            if let Ok(comments) = self.fetch_comments(&submission_id).await {
                posts.extend(comments.into_iter().filter(|c| within(since, c)));
            }
        }

        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(json: serde_json::Value) -> Submission {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_submission_maps_title_and_body() {
        let raw = submission_to_raw_post(submission(serde_json::json!({
            "id": "1abc",
            "author": "nova_resident",
            "title": "FCPS budget hearing tonight",
            "selftext": "Anyone going to the Fairfax County meeting?",
            "created_utc": 1754042400.0,
            "permalink": "/r/nova/comments/1abc/fcps_budget/",
            "score": 42,
            "num_comments": 7,
            "subreddit": "nova"
        })));

        assert_eq!(raw.native_id, "1abc");
        assert_eq!(raw.likes, 42);
        assert_eq!(raw.comments, 7);
        assert!(raw.content.starts_with("FCPS budget hearing tonight\n\n"));
        assert_eq!(raw.url, "https://www.reddit.com/r/nova/comments/1abc/fcps_budget/");
    }

    #[test]
    fn test_deleted_author_placeholder() {
        let raw = submission_to_raw_post(submission(serde_json::json!({
            "id": "1abc",
            "author": null,
            "title": "Reston question",
            "selftext": "",
            "created_utc": 1754042400.0,
            "permalink": "/r/reston/comments/1abc/q/",
            "subreddit": "reston"
        })));

        assert_eq!(raw.author_handle, "[deleted]");
        assert_eq!(raw.content, "Reston question");
        assert_eq!(raw.likes, 0);
    }

    #[test]
    fn test_district_keyword_filter() {
        assert!(is_district_relevant("New bike lanes coming to Herndon"));
        assert!(is_district_relevant("FAIRFAX COUNTY schools closed"));
        assert!(!is_district_relevant("Best pizza in Brooklyn?"));
    }

    #[test]
    fn test_non_submission_children_are_skipped() {
        let listing: Listing = serde_json::from_value(serde_json::json!({
            "data": {"children": [
                {"kind": "t5", "data": {"display_name": "nova"}},
                {"kind": "t3", "data": {
                    "id": "1abc",
                    "author": "x",
                    "title": "t",
                    "selftext": "",
                    "created_utc": 1754042400.0,
                    "permalink": "/r/nova/comments/1abc/t/",
                    "subreddit": "nova"
                }}
            ]}
        }))
        .unwrap();

        assert_eq!(parse_submissions(listing).len(), 1);
    }
}
