pub mod annotator;
pub mod topics;

use crate::analyze::annotator::{categorize, prepare_for_analysis, Annotator};
use crate::analyze::topics::match_topics;
use crate::db::{self, NewAssignment, NewSentimentResult};
use crate::settings::settings;
use crate::utils::logs;
use anyhow::{Context, Result};
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

/// A checkpoint interval of 0 disables progress logging instead of
/// dividing by zero.
fn at_checkpoint(processed: usize, every: usize) -> bool {
    every > 0 && processed % every == 0
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    pub selected: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Drive up to `limit` unprocessed posts through annotation and topic
/// matching. Per-post annotation failures leave the post unprocessed (it is
/// retried on the next run, indefinitely) and never abort the batch; storage
/// errors do.
///
/// Each post commits in its own transaction, so sentiment, assignments, and
/// the processed flag land together or not at all, and a crash mid-batch
/// loses only the in-flight post.
pub async fn run_batch(
    conn: &mut SqliteConnection,
    annotator: &dyn Annotator,
    limit: i64,
) -> Result<AnalysisReport> {
    let checkpoint_every = settings().analysis.checkpoint_every;
    let active = db::active_topics(conn).context("loading topics")?;
    let posts = db::unprocessed_posts(conn, limit).context("selecting batch")?;

    let mut report = AnalysisReport {
        selected: posts.len(),
        ..Default::default()
    };
    logs::log_analyze_start(posts.len());

    for post in &posts {
        // Defensive double-check: a result can exist while the flag is stale
        // (e.g. a crash between commits). Reconcile the flag, skip the work.
        if db::sentiment_exists(conn, &post.post_id)? {
            db::mark_processed(conn, &post.post_id)?;
            report.skipped += 1;
            continue;
        }

        let Some(prepared) = prepare_for_analysis(&post.content) else {
            report.skipped += 1;
            continue;
        };

        let annotation = match annotator.analyze(prepared).await {
            Ok(a) => a,
            Err(e) => {
                logs::log_analyze_post_failed(&post.post_id, &e.to_string());
                report.failed += 1;
                continue;
            }
        };

        let result = NewSentimentResult {
            post_id: post.post_id.clone(),
            sentiment_score: annotation.score,
            sentiment_magnitude: annotation.magnitude,
            sentiment_category: categorize(annotation.score).to_string(),
            entities: serde_json::to_string(&annotation.entities)?,
            categories: serde_json::to_string(&annotation.categories)?,
            analyzed_at: Utc::now().timestamp(),
            model_version: annotation.model_version.clone(),
        };

        let assignments: Vec<NewAssignment> =
            match_topics(&post.content, &annotation.entities, &active)
                .into_iter()
                .map(|m| NewAssignment {
                    post_id: post.post_id.clone(),
                    topic_id: m.topic_id,
                    relevance_score: m.relevance,
                })
                .collect();

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            // insert_or_ignore on the post_id key: if a concurrent batch got
            // here first, its result stands and ours is dropped.
            if db::insert_sentiment(conn, &result)? {
                db::insert_assignments(conn, &assignments)?;
            }
            db::mark_processed(conn, &post.post_id)?;
            Ok(())
        })
        .context("persisting analysis")?;

        report.processed += 1;
        if at_checkpoint(report.processed, checkpoint_every) {
            logs::log_analyze_progress(report.processed, posts.len());
        }
    }

    logs::log_analyze_done(&report);
    Ok(report)
}
