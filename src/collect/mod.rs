pub mod adapter;
pub mod bluesky;
pub mod reddit;
pub mod watermark;

use crate::collect::adapter::{Platform, RawPost, SourceAdapter};
use crate::collect::watermark::{resolve_watermark, WatermarkMode};
use crate::ingest;
use crate::settings::settings;
use crate::utils::logs;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use diesel::sqlite::SqliteConnection;

/// What to pull from one platform: query-scoped searches plus listing
/// sources (author feeds on Bluesky, subreddits on Reddit).
#[derive(Debug, Clone)]
pub struct CollectionPlan {
    pub queries: Vec<String>,
    pub feeds: Vec<String>,
}

impl CollectionPlan {
    pub fn for_platform(platform: Platform) -> Self {
        let c = &settings().collection;
        match platform {
            Platform::Bluesky => CollectionPlan {
                queries: c.search_terms.clone(),
                feeds: c.tracked_accounts.clone(),
            },
            Platform::Reddit => CollectionPlan {
                queries: c.search_terms.clone(),
                feeds: c.subreddits.clone(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub platform: Platform,
    pub mode: WatermarkMode,
    pub since: DateTime<Utc>,
    pub found: usize,
    pub stored: usize,
    pub failed_sources: usize,
}

/// Best-effort collection: a transient failure on one query or feed is
/// logged and skipped, never all-or-nothing. Fatal adapter errors (bad
/// credentials) and storage errors abort the run.
pub async fn run_collection(
    conn: &mut SqliteConnection,
    source: &dyn SourceAdapter,
    plan: &CollectionPlan,
    backfill_days: i64,
) -> Result<CollectionReport> {
    let platform = source.platform();
    let limit = settings().collection.per_query_limit;

    let (since, mode) = resolve_watermark(conn, platform, backfill_days, Utc::now());
    logs::log_collect_start(platform, mode.label(), since);

    let mut found: Vec<RawPost> = Vec::new();
    let mut failed_sources = 0;

    for query in &plan.queries {
        match source.search(query, Some(since), limit).await {
            Ok(posts) => {
                logs::log_collect_source(query, posts.len());
                found.extend(posts);
            }
            Err(e) if e.is_transient() => {
                logs::log_collect_source_failed(query, &e.to_string());
                failed_sources += 1;
            }
            Err(e) => return Err(e).context(format!("{platform} search '{query}'")),
        }
    }

    for feed in &plan.feeds {
        match source.feed(feed, Some(since), limit).await {
            Ok(posts) => {
                logs::log_collect_source(feed, posts.len());
                found.extend(posts);
            }
            Err(e) if e.is_transient() => {
                logs::log_collect_source_failed(feed, &e.to_string());
                failed_sources += 1;
            }
            Err(e) => return Err(e).context(format!("{platform} feed '{feed}'")),
        }
    }

    let mut stored = 0;
    for raw in &found {
        // Duplicate post_ids are a no-op by design; storage errors abort.
        if ingest::ingest(conn, raw).context("storing collected post")? {
            stored += 1;
        }
    }

    let report = CollectionReport {
        platform,
        mode,
        since,
        found: found.len(),
        stored,
        failed_sources,
    };
    logs::log_collect_done(&report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::adapter::FetchError;
    use crate::db::test_connection;
    use async_trait::async_trait;

    struct FakeAdapter {
        fail_query: Option<(&'static str, fn() -> FetchError)>,
    }

    fn raw(native_id: &str) -> RawPost {
        RawPost {
            platform: Platform::Bluesky,
            native_id: native_id.to_string(),
            author_id: "did:plc:abc".to_string(),
            author_handle: "someone.bsky.social".to_string(),
            content: "Vienna VA town hall tonight".to_string(),
            timestamp: Some(Utc::now()),
            url: String::new(),
            likes: 1,
            shares: 0,
            comments: 0,
            raw: serde_json::json!({}),
        }
    }

    #[async_trait]
    impl SourceAdapter for FakeAdapter {
        fn platform(&self) -> Platform {
            Platform::Bluesky
        }

        async fn search(
            &self,
            query: &str,
            _since: Option<DateTime<Utc>>,
            _limit: u32,
        ) -> Result<Vec<RawPost>, FetchError> {
            if let Some((failing, make_err)) = &self.fail_query {
                if query == *failing {
                    return Err(make_err());
                }
            }
            Ok(vec![raw(&format!("id_{query}")), raw("shared")])
        }

        async fn feed(
            &self,
            _source: &str,
            _since: Option<DateTime<Utc>>,
            _limit: u32,
        ) -> Result<Vec<RawPost>, FetchError> {
            Ok(vec![raw("from_feed")])
        }
    }

    fn plan() -> CollectionPlan {
        CollectionPlan {
            queries: vec!["alpha".to_string(), "beta".to_string()],
            feeds: vec!["tracked".to_string()],
        }
    }

    #[tokio::test]
    async fn test_transient_failure_skips_query_and_continues() {
        let mut conn = test_connection();
        let adapter = FakeAdapter {
            fail_query: Some(("alpha", || FetchError::RateLimited)),
        };

        let report = run_collection(&mut conn, &adapter, &plan(), 0)
            .await
            .unwrap();

        // beta contributed 2, the feed 1; "shared" appears once.
        assert_eq!(report.failed_sources, 1);
        assert_eq!(report.found, 3);
        assert_eq!(report.stored, 3);
    }

    #[tokio::test]
    async fn test_fatal_failure_aborts_run() {
        let mut conn = test_connection();
        let adapter = FakeAdapter {
            fail_query: Some(("alpha", || FetchError::Auth("401".into()))),
        };

        let result = run_collection(&mut conn, &adapter, &plan(), 0).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rerun_stores_nothing_new() {
        let mut conn = test_connection();
        let adapter = FakeAdapter { fail_query: None };

        let first = run_collection(&mut conn, &adapter, &plan(), 0)
            .await
            .unwrap();
        // Both queries return the overlapping "shared" record.
        assert_eq!(first.found, 5);
        assert_eq!(first.stored, 4);

        let second = run_collection(&mut conn, &adapter, &plan(), 0)
            .await
            .unwrap();
        assert_eq!(second.found, 5);
        assert_eq!(second.stored, 0);
    }
}
