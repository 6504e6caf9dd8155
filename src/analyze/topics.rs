use crate::analyze::annotator::Entity;
use crate::db::Topic;
use crate::settings::settings;

#[derive(Debug, Clone, PartialEq)]
pub struct TopicMatch {
    pub topic_id: i32,
    pub relevance: f32,
}

/// Keyword-driven topic classifier. Each keyword found as a substring of the
/// lower-cased text adds a fixed increment (containment, not occurrence
/// count); each entity whose name contains a keyword adds salience-weighted
/// confidence on top. Scores are clamped to 1.0 and only topics strictly
/// above the relevance threshold are emitted.
///
/// Deliberately not a learned classifier: topics are operator-configured and
/// have to stay auditable without retraining.
pub fn match_topics(text: &str, entities: &[Entity], topics: &[Topic]) -> Vec<TopicMatch> {
    let m = &settings().matcher;
    let text_lower = text.to_lowercase();
    let entity_names: Vec<(String, f32)> = entities
        .iter()
        .map(|e| (e.name.to_lowercase(), e.salience))
        .collect();

    let mut matches = Vec::new();

    for topic in topics {
        let keywords = topic.keyword_list();
        let mut relevance = 0.0_f32;

        for keyword in &keywords {
            let keyword_lower = keyword.to_lowercase();
            if text_lower.contains(&keyword_lower) {
                relevance += m.keyword_increment;
            }

            for (entity_name, salience) in &entity_names {
                if entity_name.contains(&keyword_lower) {
                    relevance += salience * m.salience_weight;
                }
            }
        }

        relevance = relevance.min(1.0);

        if relevance > m.relevance_threshold {
            matches.push(TopicMatch {
                topic_id: topic.topic_id,
                relevance,
            });
        }
    }

    matches
}
