use crate::collect::adapter::{Platform, RawPost};
use crate::db::{self, NewPost};
use crate::settings::{settings, EngagementWeights};
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

pub fn weights_for(platform: Platform) -> &'static EngagementWeights {
    let s = settings();
    match platform {
        Platform::Bluesky => &s.engagement.bluesky,
        Platform::Reddit => &s.engagement.reddit,
    }
}

/// Cross-platform popularity metric: a linear weighting of the raw counters.
/// Pure function of the counters and the per-platform weights.
pub fn engagement_score(platform: Platform, likes: i32, shares: i32, comments: i32) -> f32 {
    let w = weights_for(platform);
    likes as f32 * w.like + shares as f32 * w.share + comments as f32 * w.comment
}

/// Map a raw record into the canonical stored shape. The post_id is
/// namespaced by platform and is the sole de-duplication key.
pub fn normalize(raw: &RawPost) -> NewPost {
    let now = Utc::now().timestamp();

    NewPost {
        post_id: format!("{}_{}", raw.platform, raw.native_id),
        platform: raw.platform.to_string(),
        author_id: raw.author_id.clone(),
        author_handle: raw.author_handle.clone(),
        content: raw.content.clone(),
        timestamp: raw.timestamp.map(|t| t.timestamp()).unwrap_or(now),
        url: raw.url.clone(),
        likes: raw.likes,
        shares: raw.shares,
        comments: raw.comments,
        engagement_score: engagement_score(raw.platform, raw.likes, raw.shares, raw.comments),
        raw_payload: raw.raw.to_string(),
        processed: false,
        created_at: now,
    }
}

/// Safe under at-least-once delivery: stored rows equal the count of
/// distinct post_ids ever seen. Returns true when a new row was created.
pub fn ingest(conn: &mut SqliteConnection, raw: &RawPost) -> QueryResult<bool> {
    let new_post = normalize(raw);
    db::insert_post(conn, &new_post)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use chrono::TimeZone;

    fn raw(native_id: &str) -> RawPost {
        RawPost {
            platform: Platform::Bluesky,
            native_id: native_id.to_string(),
            author_id: "did:plc:abc".to_string(),
            author_handle: "someone.bsky.social".to_string(),
            content: "Silver line delays again this morning".to_string(),
            timestamp: Some(Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()),
            url: "https://bsky.app/profile/someone/post/abc".to_string(),
            likes: 10,
            shares: 2,
            comments: 1,
            raw: serde_json::json!({"uri": "at://did:plc:abc/app.bsky.feed.post/abc"}),
        }
    }

    #[test]
    fn test_engagement_score_is_deterministic() {
        // Bluesky weights: like 1.0, repost 2.0, reply 1.5.
        let score = engagement_score(Platform::Bluesky, 10, 2, 1);
        assert!((score - 15.5).abs() < f32::EPSILON);

        // Reddit weights comments at 2.0.
        let reddit = engagement_score(Platform::Reddit, 10, 0, 3);
        assert!((reddit - 16.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_engagement_score_zero_counters() {
        assert_eq!(engagement_score(Platform::Reddit, 0, 0, 0), 0.0);
    }

    #[test]
    fn test_normalize_namespaces_post_id() {
        let post = normalize(&raw("3kxyz"));
        assert_eq!(post.post_id, "bluesky_3kxyz");
        assert_eq!(post.platform, "bluesky");
        assert!(!post.processed);
        assert!((post.engagement_score - 15.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_normalize_falls_back_to_now_without_timestamp() {
        let mut record = raw("3kxyz");
        record.timestamp = None;

        let before = Utc::now().timestamp();
        let post = normalize(&record);
        let after = Utc::now().timestamp();

        assert!(post.timestamp >= before && post.timestamp <= after);
    }

    #[test]
    fn test_ingest_twice_stores_once() {
        let mut conn = test_connection();

        assert!(ingest(&mut conn, &raw("3kxyz")).unwrap());
        assert!(!ingest(&mut conn, &raw("3kxyz")).unwrap());

        use crate::schema::posts::dsl::*;
        let count: i64 = posts.count().get_result(&mut conn).unwrap();
        assert_eq!(count, 1);
    }
}
