pub mod analyze;
pub mod collect;
pub mod db;
pub mod ingest;
pub mod schema;
pub mod settings;
pub mod utils;
