//! Data models for articles, events, and the merged timeline.
//!
//! The lifecycle mirrors the pipeline stages:
//! - [`FeedEntry`]: a candidate article straight from the news feed
//! - [`Article`]: filled in by the resolver, extractor, and scorer in sequence;
//!   immutable once scored
//! - [`Chunk`]: a bounded slice of an article's text, discarded after event
//!   extraction
//! - [`Event`]: one factual occurrence extracted from a chunk; many events may
//!   describe the same real-world occurrence across articles
//! - [`Timeline`]: the merged, deduplicated, chronologically ordered result,
//!   one per run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A candidate article discovered in the news feed, before any fetching.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    /// Headline as published in the feed.
    pub title: String,
    /// Feed link, usually an aggregator redirect rather than the publisher page.
    pub url: String,
    /// Publication date string as the feed reported it (RFC 2822, usually).
    pub published: String,
    /// Publisher name as the feed reported it.
    pub publisher: String,
}

/// An article as it moves through the per-article stages.
///
/// Created from a [`FeedEntry`], then mutated by the resolver (sets
/// `resolved_url`), the extractor (sets `text`), and the scorer (sets
/// `credibility`), in that order. Once scored it is never mutated again.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub title: String,
    pub publisher: String,
    pub published: String,
    /// Original feed URL.
    pub url: String,
    /// Canonical publisher URL after redirect resolution. Every event's
    /// `source` field points at this.
    pub resolved_url: String,
    /// Plain article text.
    #[serde(skip_serializing)]
    pub text: String,
    pub credibility: Option<Credibility>,
}

/// A 0–100 trustworthiness rating with the model's rationale.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Credibility {
    #[serde(deserialize_with = "score_in_range")]
    pub score: u8,
    pub reason: String,
}

fn score_in_range<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= 100)
        .ok_or_else(|| serde::de::Error::custom(format!("credibility score {value} outside 0-100")))
}

/// A bounded-size slice of one article's text, sized for a single model call.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Resolved URL of the parent article.
    pub source: String,
    /// Position of this chunk within the article, starting at 0.
    pub ordinal: usize,
    pub text: String,
}

/// One factual occurrence extracted from an article chunk.
///
/// `timestamp` is kept as free text because articles mention partial and
/// ambiguous dates ("early 2023", "last Tuesday"); reconciling them is the
/// merger's judgment, not ours.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Event {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    pub description: String,
    /// Resolved URL of the article this event came from.
    pub source: String,
}

/// The merged, chronologically ordered event sequence for one run.
///
/// Immutable once produced; post-processors read it and return new artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    pub query: String,
    pub generated_at: DateTime<Utc>,
    pub events: Vec<Event>,
}

/// Structured report comparing how the run's sources covered the story.
#[derive(Debug, Deserialize, Serialize)]
pub struct SourceComparison {
    #[serde(default)]
    pub agreements: Vec<String>,
    #[serde(default)]
    pub differences: Vec<String>,
    #[serde(default)]
    pub unique_details: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article() -> Article {
        Article {
            title: "Quake strikes region".to_string(),
            publisher: "Example Times".to_string(),
            published: "Mon, 06 Feb 2023 04:30:00 GMT".to_string(),
            url: "https://news.example.com/rss/articles/abc".to_string(),
            resolved_url: "https://example.com/quake".to_string(),
            text: "A strong earthquake struck early Monday.".to_string(),
            credibility: None,
        }
    }

    #[test]
    fn credibility_accepts_in_range_score() {
        let c: Credibility =
            serde_json::from_str(r#"{"score": 87, "reason": "named officials and figures"}"#)
                .unwrap();
        assert_eq!(c.score, 87);
        assert_eq!(c.reason, "named officials and figures");
    }

    #[test]
    fn credibility_rejects_out_of_range_score() {
        let over: Result<Credibility, _> =
            serde_json::from_str(r#"{"score": 150, "reason": "x"}"#);
        assert!(over.is_err());

        let negative: Result<Credibility, _> =
            serde_json::from_str(r#"{"score": -3, "reason": "x"}"#);
        assert!(negative.is_err());
    }

    #[test]
    fn event_defaults_for_missing_fields() {
        let e: Event = serde_json::from_str(
            r#"{"description": "Rescue teams arrived", "source": "https://example.com/a"}"#,
        )
        .unwrap();
        assert!(e.timestamp.is_none());
        assert!(e.actors.is_empty());
        assert_eq!(e.description, "Rescue teams arrived");
    }

    #[test]
    fn event_round_trips() {
        let e = Event {
            timestamp: Some("2023-02-06 04:17".to_string()),
            actors: vec!["AFAD".to_string()],
            description: "First tremor recorded".to_string(),
            source: "https://example.com/quake".to_string(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn article_serialization_omits_body_text() {
        let article = sample_article();
        let json = serde_json::to_string(&article).unwrap();
        assert!(json.contains("example.com/quake"));
        assert!(!json.contains("strong earthquake"));
    }

    #[test]
    fn timeline_serializes_events_in_order() {
        let timeline = Timeline {
            query: "2023 earthquake".to_string(),
            generated_at: Utc::now(),
            events: vec![
                Event {
                    timestamp: Some("04:17".to_string()),
                    actors: vec![],
                    description: "first".to_string(),
                    source: "https://example.com/a".to_string(),
                },
                Event {
                    timestamp: Some("06:00".to_string()),
                    actors: vec![],
                    description: "second".to_string(),
                    source: "https://example.com/b".to_string(),
                },
            ],
        };
        let json = serde_json::to_string(&timeline).unwrap();
        let first = json.find("first").unwrap();
        let second = json.find("second").unwrap();
        assert!(first < second);
    }
}
