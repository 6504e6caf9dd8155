use crate::analyze::AnalysisReport;
use crate::collect::adapter::Platform;
use crate::collect::CollectionReport;
use chrono::{DateTime, Utc};
use console::{measure_text_width, Style};

pub const TREE_BRANCH: char = '\u{251C}';
pub const TREE_END: char = '\u{2514}';
pub const TREE_HORIZ: char = '\u{2500}';

const VALUE_COLUMN: usize = 18;

fn tree_branch() -> String {
    dim()
        .apply_to(format!("{}{}{} ", TREE_BRANCH, TREE_HORIZ, TREE_HORIZ))
        .to_string()
}

fn tree_end() -> String {
    dim()
        .apply_to(format!("{}{}{} ", TREE_END, TREE_HORIZ, TREE_HORIZ))
        .to_string()
}

pub fn dim() -> Style {
    Style::new().dim()
}

fn blue() -> Style {
    Style::new().blue()
}

fn magenta() -> Style {
    Style::new().magenta()
}

fn cyan() -> Style {
    Style::new().cyan()
}

fn green() -> Style {
    Style::new().green()
}

fn red() -> Style {
    Style::new().red()
}

fn yellow() -> Style {
    Style::new().yellow()
}

fn bold() -> Style {
    Style::new().bold()
}

fn init_prefix() -> String {
    blue().apply_to("[INIT]").to_string()
}

fn db_prefix() -> String {
    blue().apply_to("[DB]").to_string()
}

fn collect_prefix() -> String {
    magenta().apply_to("[COLLECT]").to_string()
}

fn analyze_prefix() -> String {
    yellow().apply_to("[ANALYZE]").to_string()
}

pub fn pad_label(label: &str) -> String {
    let current_width = measure_text_width(label);
    if current_width < VALUE_COLUMN {
        format!("{}{}", label, " ".repeat(VALUE_COLUMN - current_width))
    } else {
        format!("{} ", label)
    }
}

pub fn log_init(database_url: &str, mode: &str) {
    println!(
        "{} starting district-pulse ({})...",
        init_prefix(),
        cyan().apply_to(mode)
    );
    println!(
        "{} database: {}",
        init_prefix(),
        dim().apply_to(database_url)
    );
}

pub fn log_db_ready() {
    println!("{} connection pool ready.", db_prefix());
}

pub fn log_topics_seeded(created: usize, total: usize) {
    println!(
        "{} topics seeded: {} new, {} configured",
        db_prefix(),
        bold().apply_to(created),
        dim().apply_to(total)
    );
}

pub fn log_config_error(message: &str) {
    eprintln!(
        "{} {}",
        red().apply_to("[CONFIG]"),
        red().apply_to(message)
    );
}

pub fn log_collect_start(platform: Platform, mode: &str, since: DateTime<Utc>) {
    println!(
        "{} {} in {} mode, since {}",
        collect_prefix(),
        cyan().apply_to(platform.to_string()),
        bold().apply_to(mode),
        dim().apply_to(since.to_rfc3339())
    );
}

pub fn log_collect_source(name: &str, found: usize) {
    println!(
        "{}{} {} posts",
        tree_branch(),
        pad_label(&cyan().apply_to(name).to_string()),
        bold().apply_to(found)
    );
}

pub fn log_collect_source_failed(name: &str, error: &str) {
    println!(
        "{}{} {}",
        tree_branch(),
        pad_label(&cyan().apply_to(name).to_string()),
        red().apply_to(error)
    );
}

pub fn log_collect_done(report: &CollectionReport) {
    let skipped_note = if report.failed_sources > 0 {
        format!(
            " ({} sources skipped)",
            yellow().apply_to(report.failed_sources)
        )
    } else {
        String::new()
    };
    println!(
        "{}{} stored of {} found{}",
        tree_end(),
        green().apply_to(report.stored),
        bold().apply_to(report.found),
        skipped_note
    );
}

pub fn log_analyze_start(selected: usize) {
    println!(
        "{} {} unprocessed posts selected",
        analyze_prefix(),
        bold().apply_to(selected)
    );
}

pub fn log_analyze_post_failed(post_id: &str, error: &str) {
    println!(
        "{}{} {}",
        tree_branch(),
        pad_label(&dim().apply_to(post_id).to_string()),
        red().apply_to(error)
    );
}

pub fn log_analyze_progress(processed: usize, total: usize) {
    println!(
        "{} progress: {}{}",
        analyze_prefix(),
        bold().apply_to(processed),
        dim().apply_to(format!("/{total}"))
    );
}

pub fn log_analyze_done(report: &AnalysisReport) {
    println!(
        "{}{} processed, {} skipped, {} failed",
        tree_end(),
        green().apply_to(report.processed),
        dim().apply_to(report.skipped),
        if report.failed > 0 {
            red().apply_to(report.failed)
        } else {
            dim().apply_to(report.failed)
        }
    );
}
