use anyhow::{bail, Result};
use district_pulse::analyze::{self, annotator::HttpAnnotator};
use district_pulse::collect::{
    self, adapter::Platform, bluesky::BlueskyAdapter, reddit::RedditAdapter, CollectionPlan,
};
use district_pulse::db::{configure_connection, establish_pool, run_migrations, seed_topics};
use district_pulse::settings::settings;
use district_pulse::utils::logs;
use std::env;
use std::process;

fn print_usage() {
    eprintln!("Usage: district-pulse [collect|analyze|run]");
    eprintln!();
    eprintln!("Modes:");
    eprintln!("  collect    pull new posts from all platforms and store them");
    eprintln!("  analyze    annotate unprocessed posts and assign topics");
    eprintln!("  run        collect, then analyze (default)");
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let mode = env::args().nth(1).unwrap_or_else(|| "run".to_string());
    if !matches!(mode.as_str(), "collect" | "analyze" | "run") {
        print_usage();
        process::exit(1);
    }

    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "pulse.db".to_string());
    let backfill_days: i64 = env::var("BACKFILL_DAYS")
        .ok()
        .and_then(|d| d.parse().ok())
        .unwrap_or(0);

    // Required config is checked before any work begins.
    let annotator_url = if mode == "analyze" || mode == "run" {
        match env::var("ANNOTATOR_URL") {
            Ok(url) => Some(url),
            Err(_) => {
                logs::log_config_error("ANNOTATOR_URL is not set; analysis needs the NLP endpoint");
                bail!("missing ANNOTATOR_URL");
            }
        }
    } else {
        None
    };

    logs::log_init(&database_url, &mode);

    let pool = establish_pool(&database_url);
    let mut conn = pool.get()?;
    configure_connection(&mut conn)?;
    run_migrations(&mut conn)?;
    logs::log_db_ready();

    let s = settings();
    let created = seed_topics(&mut conn, &s.topics)?;
    logs::log_topics_seeded(created, s.topics.len());

    if mode == "collect" || mode == "run" {
        let bluesky = BlueskyAdapter::new();
        let plan = CollectionPlan::for_platform(Platform::Bluesky);
        collect::run_collection(&mut conn, &bluesky, &plan, backfill_days).await?;

        let reddit = RedditAdapter::new();
        let plan = CollectionPlan::for_platform(Platform::Reddit);
        collect::run_collection(&mut conn, &reddit, &plan, backfill_days).await?;
    }

    if let Some(endpoint) = annotator_url {
        let annotator = HttpAnnotator::new(endpoint);
        analyze::run_batch(&mut conn, &annotator, s.analysis.batch_limit).await?;
    }

    Ok(())
}
