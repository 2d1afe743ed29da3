//! JSON run report for machine consumption.
//!
//! Serializes the merged timeline together with the scored source articles,
//! so downstream tooling can re-examine attribution and credibility without
//! re-running the pipeline.

use crate::error::Result;
use crate::models::{Article, Timeline};
use serde::Serialize;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub timeline: &'a Timeline,
    pub articles: &'a [Article],
}

/// Write the run report as JSON to the given path.
#[instrument(level = "info", skip(timeline, articles))]
pub async fn write_report(timeline: &Timeline, articles: &[Article], path: &str) -> Result<()> {
    let report = RunReport { timeline, articles };
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| crate::error::PipelineError::InvalidInput(format!("report encoding: {e}")))?;
    fs::write(path, json).await?;
    info!(path, articles = articles.len(), "Wrote JSON run report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Credibility, Event};
    use chrono::Utc;

    #[test]
    fn report_includes_scores_but_not_article_bodies() {
        let timeline = Timeline {
            query: "q".to_string(),
            generated_at: Utc::now(),
            events: vec![Event {
                timestamp: None,
                actors: vec![],
                description: "happened".to_string(),
                source: "https://example.com/a".to_string(),
            }],
        };
        let articles = vec![Article {
            title: "t".to_string(),
            publisher: "p".to_string(),
            published: "d".to_string(),
            url: "https://feed.example/x".to_string(),
            resolved_url: "https://example.com/a".to_string(),
            text: "the full body text".to_string(),
            credibility: Some(Credibility {
                score: 66,
                reason: "ok".to_string(),
            }),
        }];

        let report = RunReport {
            timeline: &timeline,
            articles: &articles,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"score\":66"));
        assert!(json.contains("happened"));
        assert!(!json.contains("the full body text"));
    }
}
