use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

static SETTINGS: OnceLock<Settings> = OnceLock::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub collection: Collection,
    pub engagement: Engagement,
    pub analysis: Analysis,
    pub matcher: Matcher,
    pub topics: Vec<TopicSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub search_terms: Vec<String>,
    pub tracked_accounts: Vec<String>,
    pub subreddits: Vec<String>,
    pub district_keywords: Vec<String>,
    pub per_query_limit: u32,
    pub first_run_days: i64,
    pub comments_per_submission: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engagement {
    pub bluesky: EngagementWeights,
    pub reddit: EngagementWeights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementWeights {
    pub like: f32,
    pub share: f32,
    pub comment: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub batch_limit: i64,
    pub checkpoint_every: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matcher {
    pub keyword_increment: f32,
    pub salience_weight: f32,
    pub relevance_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSeed {
    pub name: String,
    pub category: String,
    pub keywords: Vec<String>,
}

fn seed(name: &str, category: &str, keywords: &[&str]) -> TopicSeed {
    TopicSeed {
        name: name.to_string(),
        category: category.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            collection: Collection {
                search_terms: vec![
                    "Reston VA".into(),
                    "Fairfax County".into(),
                    "Herndon VA".into(),
                    "Vienna VA".into(),
                    "James Walkinshaw".into(),
                    "#VA11".into(),
                    "Northern Virginia".into(),
                ],
                tracked_accounts: vec!["repwalkinshaw.bsky.social".into()],
                subreddits: vec![
                    "nova".into(),
                    "fairfaxcounty".into(),
                    "reston".into(),
                    "Virginia".into(),
                ],
                district_keywords: vec![
                    "va-11".into(),
                    "virginia 11".into(),
                    "fairfax county".into(),
                    "reston".into(),
                    "herndon".into(),
                    "vienna".into(),
                    "oakton".into(),
                    "great falls".into(),
                    "mclean".into(),
                    "tysons".into(),
                    "walkinshaw".into(),
                    "virginia house".into(),
                ],
                per_query_limit: 100,
                first_run_days: 7,
                comments_per_submission: 5,
                request_timeout_secs: 15,
            },
            engagement: Engagement {
                bluesky: EngagementWeights {
                    like: 1.0,
                    share: 2.0,
                    comment: 1.5,
                },
                reddit: EngagementWeights {
                    like: 1.0,
                    share: 2.0,
                    comment: 2.0,
                },
            },
            analysis: Analysis {
                batch_limit: 200,
                checkpoint_every: 10,
            },
            matcher: Matcher {
                keyword_increment: 0.2,
                salience_weight: 0.5,
                relevance_threshold: 0.1,
            },
            topics: vec![
                seed(
                    "Housing & Affordability",
                    "housing",
                    &[
                        "housing",
                        "rent",
                        "mortgage",
                        "affordability",
                        "apartment",
                        "homeowner",
                        "zoning",
                        "development",
                    ],
                ),
                seed(
                    "Transportation & Infrastructure",
                    "transportation",
                    &[
                        "traffic",
                        "metro",
                        "road",
                        "route 7",
                        "dulles",
                        "silver line",
                        "bike lane",
                        "pedestrian",
                        "infrastructure",
                    ],
                ),
                seed(
                    "Education & Schools",
                    "education",
                    &[
                        "school",
                        "education",
                        "teacher",
                        "fcps",
                        "classroom",
                        "student",
                        "college",
                        "university",
                    ],
                ),
                seed(
                    "Healthcare",
                    "healthcare",
                    &[
                        "healthcare",
                        "hospital",
                        "insurance",
                        "medicaid",
                        "doctor",
                        "medical",
                        "health",
                    ],
                ),
                seed(
                    "Public Safety",
                    "safety",
                    &["police", "fire", "safety", "crime", "emergency", "security"],
                ),
                seed(
                    "Environment & Climate",
                    "environment",
                    &[
                        "climate",
                        "environment",
                        "pollution",
                        "green",
                        "sustainability",
                        "clean energy",
                        "solar",
                    ],
                ),
                seed(
                    "Economy & Jobs",
                    "economy",
                    &[
                        "jobs",
                        "employment",
                        "economy",
                        "business",
                        "unemployment",
                        "wages",
                        "workforce",
                    ],
                ),
                seed(
                    "Social Infrastructure",
                    "social",
                    &[
                        "community center",
                        "library",
                        "parks",
                        "recreation",
                        "third space",
                        "gathering",
                    ],
                ),
                seed(
                    "LGBTQ+ Rights",
                    "rights",
                    &[
                        "lgbtq",
                        "gay",
                        "lesbian",
                        "transgender",
                        "pride",
                        "equality",
                        "discrimination",
                    ],
                ),
                seed(
                    "Immigration",
                    "immigration",
                    &[
                        "immigrant",
                        "immigration",
                        "visa",
                        "citizenship",
                        "undocumented",
                        "refugee",
                    ],
                ),
                seed(
                    "Taxes & Budget",
                    "fiscal",
                    &["tax", "budget", "revenue", "spending", "fiscal", "property tax"],
                ),
                seed(
                    "Federal Workforce",
                    "employment",
                    &[
                        "federal worker",
                        "government employee",
                        "civil servant",
                        "federal job",
                        "usajobs",
                    ],
                ),
            ],
        }
    }
}

impl Settings {
    pub fn load() -> &'static Settings {
        SETTINGS.get_or_init(Self::load_from_files)
    }

    fn load_from_files() -> Settings {
        let default_path = Path::new("settings.default.ron");
        let override_path = Path::new("settings.ron");

        let mut settings = if default_path.exists() {
            fs::read_to_string(default_path)
                .ok()
                .and_then(|content| ron::from_str(&content).ok())
                .unwrap_or_default()
        } else {
            Settings::default()
        };

        if override_path.exists() {
            if let Ok(content) = fs::read_to_string(override_path) {
                if let Ok(overrides) = ron::from_str::<Settings>(&content) {
                    settings = overrides;
                }
            }
        }

        settings
    }
}

pub fn settings() -> &'static Settings {
    Settings::load()
}
