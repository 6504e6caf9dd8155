use crate::schema::{post_topic_assignments, posts, sentiment_results, topics};
use crate::settings::TopicSeed;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn establish_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .max_size(5)
        .build(manager)
        .expect("Failed to create pool")
}

pub fn configure_connection(conn: &mut SqliteConnection) -> QueryResult<()> {
    conn.batch_execute("PRAGMA busy_timeout = 2000;")?;
    conn.batch_execute("PRAGMA journal_mode = WAL;")?;
    conn.batch_execute("PRAGMA synchronous = NORMAL;")?;
    conn.batch_execute("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

pub fn run_migrations(conn: &mut SqliteConnection) -> anyhow::Result<()> {
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("migrations failed: {e}"))?;
    Ok(())
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = posts)]
pub struct Post {
    pub post_id: String,
    pub platform: String,
    pub author_id: String,
    pub author_handle: String,
    pub content: String,
    pub timestamp: i64,
    pub url: String,
    pub likes: i32,
    pub shares: i32,
    pub comments: i32,
    pub engagement_score: f32,
    pub raw_payload: String,
    pub processed: bool,
    pub created_at: i64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub post_id: String,
    pub platform: String,
    pub author_id: String,
    pub author_handle: String,
    pub content: String,
    pub timestamp: i64,
    pub url: String,
    pub likes: i32,
    pub shares: i32,
    pub comments: i32,
    pub engagement_score: f32,
    pub raw_payload: String,
    pub processed: bool,
    pub created_at: i64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = sentiment_results)]
pub struct NewSentimentResult {
    pub post_id: String,
    pub sentiment_score: f32,
    pub sentiment_magnitude: f32,
    pub sentiment_category: String,
    pub entities: String,
    pub categories: String,
    pub analyzed_at: i64,
    pub model_version: String,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = topics)]
pub struct Topic {
    pub topic_id: i32,
    pub name: String,
    pub category: String,
    pub keywords: String,
    pub active: bool,
}

impl Topic {
    /// Keywords are stored as a JSON array in a text column.
    pub fn keyword_list(&self) -> Vec<String> {
        serde_json::from_str(&self.keywords).unwrap_or_default()
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = topics)]
pub struct NewTopic {
    pub name: String,
    pub category: String,
    pub keywords: String,
    pub active: bool,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = post_topic_assignments)]
pub struct NewAssignment {
    pub post_id: String,
    pub topic_id: i32,
    pub relevance_score: f32,
}

/// Idempotent insert keyed by post_id. Returns true when a row was created,
/// false when the id already existed (original row wins, no merge).
pub fn insert_post(conn: &mut SqliteConnection, new_post: &NewPost) -> QueryResult<bool> {
    let inserted = diesel::insert_or_ignore_into(posts::table)
        .values(new_post)
        .execute(conn)?;
    Ok(inserted > 0)
}

pub fn latest_post_timestamp(
    conn: &mut SqliteConnection,
    platform_name: &str,
) -> QueryResult<Option<i64>> {
    use crate::schema::posts::dsl::*;

    posts
        .filter(platform.eq(platform_name))
        .select(diesel::dsl::max(timestamp))
        .first::<Option<i64>>(conn)
}

/// Unprocessed posts in insertion order, so repeated partial runs converge.
pub fn unprocessed_posts(conn: &mut SqliteConnection, limit: i64) -> QueryResult<Vec<Post>> {
    use crate::schema::posts::dsl::*;

    posts
        .filter(processed.eq(false))
        .order((created_at.asc(), post_id.asc()))
        .limit(limit)
        .load::<Post>(conn)
}

pub fn sentiment_exists(conn: &mut SqliteConnection, id: &str) -> QueryResult<bool> {
    use crate::schema::sentiment_results::dsl::*;

    let count: i64 = sentiment_results
        .filter(post_id.eq(id))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

/// post_id is the primary key, so a concurrent writer's duplicate insert is a
/// no-op rather than an error.
pub fn insert_sentiment(
    conn: &mut SqliteConnection,
    result: &NewSentimentResult,
) -> QueryResult<bool> {
    let inserted = diesel::insert_or_ignore_into(sentiment_results::table)
        .values(result)
        .execute(conn)?;
    Ok(inserted > 0)
}

pub fn insert_assignments(
    conn: &mut SqliteConnection,
    assignments: &[NewAssignment],
) -> QueryResult<usize> {
    if assignments.is_empty() {
        return Ok(0);
    }

    diesel::insert_or_ignore_into(post_topic_assignments::table)
        .values(assignments)
        .execute(conn)
}

pub fn mark_processed(conn: &mut SqliteConnection, id: &str) -> QueryResult<usize> {
    use crate::schema::posts::dsl::*;

    diesel::update(posts.filter(post_id.eq(id)))
        .set(processed.eq(true))
        .execute(conn)
}

/// Upsert-by-name topic seeding: create-if-absent, never overwrite. Safe to
/// run on every startup.
pub fn seed_topics(conn: &mut SqliteConnection, seeds: &[TopicSeed]) -> QueryResult<usize> {
    let mut created = 0;
    for topic_seed in seeds {
        let new_topic = NewTopic {
            name: topic_seed.name.clone(),
            category: topic_seed.category.clone(),
            keywords: serde_json::to_string(&topic_seed.keywords).unwrap_or_else(|_| "[]".into()),
            active: true,
        };
        created += diesel::insert_or_ignore_into(topics::table)
            .values(&new_topic)
            .execute(conn)?;
    }
    Ok(created)
}

pub fn active_topics(conn: &mut SqliteConnection) -> QueryResult<Vec<Topic>> {
    use crate::schema::topics::dsl::*;

    topics.filter(active.eq(true)).load::<Topic>(conn)
}

pub fn assignments_for_post(
    conn: &mut SqliteConnection,
    id: &str,
) -> QueryResult<Vec<(i32, f32)>> {
    use crate::schema::post_topic_assignments::dsl::*;

    post_topic_assignments
        .filter(post_id.eq(id))
        .select((topic_id, relevance_score))
        .load(conn)
}

#[cfg(test)]
pub fn test_connection() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:").expect("in-memory sqlite");
    conn.run_pending_migrations(MIGRATIONS).expect("migrations");
    conn
}
