use crate::settings::settings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::Display;
use thiserror::Error;

/// Text shorter than this (after trimming) is never sent for annotation.
pub const MIN_TEXT_LENGTH: usize = 10;
/// Longer text is truncated, not rejected.
pub const MAX_TEXT_LENGTH: usize = 5000;

const POSITIVE_THRESHOLD: f32 = 0.25;
const NEGATIVE_THRESHOLD: f32 = -0.25;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub salience: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub name: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    pub score: f32,
    pub magnitude: f32,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default = "default_model_version")]
    pub model_version: String,
}

fn default_model_version() -> String {
    "external_nlp_v1".to_string()
}

/// All annotator failures are transient from the pipeline's point of view:
/// the post stays unprocessed and is retried on the next batch.
#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("annotator returned {0}")]
    Endpoint(String),

    #[error("malformed annotation: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait Annotator: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<Annotation, AnnotateError>;
}

/// The external NLP service, consumed as a black box with a fixed shape:
/// POST { text } -> { score, magnitude, entities[], categories[] }.
pub struct HttpAnnotator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnnotator {
    pub fn new(endpoint: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(
                settings().collection.request_timeout_secs,
            ))
            .build()
            .expect("reqwest client");
        Self { client, endpoint }
    }
}

#[async_trait]
impl Annotator for HttpAnnotator {
    async fn analyze(&self, text: &str) -> Result<Annotation, AnnotateError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnnotateError::Timeout
                } else {
                    AnnotateError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(AnnotateError::Endpoint(response.status().to_string()));
        }

        let annotation = response
            .json::<Annotation>()
            .await
            .map_err(|e| AnnotateError::Malformed(e.to_string()))?;
        validate_annotation(annotation)
    }
}

/// Stored sentiment scores are bounded to [-1, 1] with a non-negative
/// magnitude. A response outside those ranges is rejected, not persisted.
fn validate_annotation(annotation: Annotation) -> Result<Annotation, AnnotateError> {
    if !(-1.0..=1.0).contains(&annotation.score) {
        return Err(AnnotateError::Malformed(format!(
            "score out of range: {}",
            annotation.score
        )));
    }
    if annotation.magnitude < 0.0 || !annotation.magnitude.is_finite() {
        return Err(AnnotateError::Malformed(format!(
            "negative magnitude: {}",
            annotation.magnitude
        )));
    }
    Ok(annotation)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SentimentCategory {
    Positive,
    Negative,
    Neutral,
}

/// Deterministic mapping owned by the pipeline, not the NLP service.
pub fn categorize(score: f32) -> SentimentCategory {
    if score >= POSITIVE_THRESHOLD {
        SentimentCategory::Positive
    } else if score <= NEGATIVE_THRESHOLD {
        SentimentCategory::Negative
    } else {
        SentimentCategory::Neutral
    }
}

/// Guard against wasted calls: None means the text is too short to be worth
/// annotating and the post should be skipped outright. Long text is cut at
/// MAX_TEXT_LENGTH characters (on a char boundary).
pub fn prepare_for_analysis(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_TEXT_LENGTH {
        return None;
    }

    match trimmed.char_indices().nth(MAX_TEXT_LENGTH) {
        Some((byte_offset, _)) => Some(&trimmed[..byte_offset]),
        None => Some(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_thresholds() {
        assert_eq!(categorize(0.25), SentimentCategory::Positive);
        assert_eq!(categorize(-0.25), SentimentCategory::Negative);
        assert_eq!(categorize(0.0), SentimentCategory::Neutral);
        assert_eq!(categorize(0.2499), SentimentCategory::Neutral);
        assert_eq!(categorize(-0.2499), SentimentCategory::Neutral);
        assert_eq!(categorize(1.0), SentimentCategory::Positive);
        assert_eq!(categorize(-1.0), SentimentCategory::Negative);
    }

    #[test]
    fn test_category_string_form() {
        assert_eq!(categorize(0.9).to_string(), "positive");
    }

    #[test]
    fn test_short_text_is_skipped() {
        assert!(prepare_for_analysis("").is_none());
        assert!(prepare_for_analysis("   too shrt  ").is_none());
        assert!(prepare_for_analysis("exactly10!").is_some());
    }

    #[test]
    fn test_long_text_is_truncated_not_rejected() {
        let text = "a".repeat(MAX_TEXT_LENGTH + 500);
        let prepared = prepare_for_analysis(&text).unwrap();
        assert_eq!(prepared.chars().count(), MAX_TEXT_LENGTH);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let text = "é".repeat(MAX_TEXT_LENGTH + 10);
        let prepared = prepare_for_analysis(&text).unwrap();
        assert_eq!(prepared.chars().count(), MAX_TEXT_LENGTH);
    }

    #[test]
    fn test_out_of_range_annotations_are_rejected() {
        let annotation = |score: f32, magnitude: f32| Annotation {
            score,
            magnitude,
            entities: vec![],
            categories: vec![],
            model_version: "external_nlp_v1".to_string(),
        };

        assert!(validate_annotation(annotation(0.4, 0.9)).is_ok());
        assert!(validate_annotation(annotation(-1.0, 0.0)).is_ok());
        assert!(validate_annotation(annotation(1.0, 2.5)).is_ok());

        assert!(matches!(
            validate_annotation(annotation(1.5, 0.9)),
            Err(AnnotateError::Malformed(_))
        ));
        assert!(matches!(
            validate_annotation(annotation(-2.0, 0.9)),
            Err(AnnotateError::Malformed(_))
        ));
        assert!(matches!(
            validate_annotation(annotation(f32::NAN, 0.9)),
            Err(AnnotateError::Malformed(_))
        ));
        assert!(matches!(
            validate_annotation(annotation(0.4, -0.1)),
            Err(AnnotateError::Malformed(_))
        ));
    }

    #[test]
    fn test_annotation_defaults() {
        let annotation: Annotation = serde_json::from_value(serde_json::json!({
            "score": 0.4,
            "magnitude": 0.9
        }))
        .unwrap();

        assert!(annotation.entities.is_empty());
        assert!(annotation.categories.is_empty());
        assert_eq!(annotation.model_version, "external_nlp_v1");
    }
}
