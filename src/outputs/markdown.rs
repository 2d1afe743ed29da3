//! Markdown report: source credibility cards followed by the timeline.

use crate::error::Result;
use crate::models::{Article, Timeline};
use std::fmt::Write;
use tokio::fs;
use tracing::{info, instrument};

/// Verbal band for a credibility score, mirroring the usual
/// green/amber/red traffic-light cut points.
pub fn credibility_band(score: u8) -> &'static str {
    if score >= 75 {
        "high"
    } else if score >= 50 {
        "medium"
    } else {
        "low"
    }
}

/// Render the full report as Markdown.
pub fn render_report(timeline: &Timeline, articles: &[Article]) -> String {
    let mut md = String::new();

    writeln!(md, "# Timeline: {}\n", timeline.query).unwrap();
    writeln!(
        md,
        "_Generated {} from {} source(s)._\n",
        timeline.generated_at.format("%Y-%m-%d %H:%M UTC"),
        articles.len()
    )
    .unwrap();

    writeln!(md, "## Sources\n").unwrap();
    for article in articles {
        writeln!(md, "### {}\n", article.title).unwrap();
        writeln!(md, "- Publisher: {}", article.publisher).unwrap();
        writeln!(md, "- Published: {}", article.published).unwrap();
        writeln!(md, "- URL: <{}>", article.resolved_url).unwrap();
        if let Some(credibility) = &article.credibility {
            writeln!(
                md,
                "- Credibility: **{}/100** ({})",
                credibility.score,
                credibility_band(credibility.score)
            )
            .unwrap();
            writeln!(md, "\n{}\n", credibility.reason).unwrap();
        } else {
            writeln!(md).unwrap();
        }
    }

    writeln!(md, "## Events\n").unwrap();
    for event in &timeline.events {
        let stamp = event.timestamp.as_deref().unwrap_or("undated");
        if event.actors.is_empty() {
            writeln!(md, "- **[{}]** {}", stamp, event.description).unwrap();
        } else {
            writeln!(
                md,
                "- **[{}]** {} ({})",
                stamp,
                event.description,
                event.actors.join(", ")
            )
            .unwrap();
        }
    }

    md
}

/// Write the Markdown report to the given path.
#[instrument(level = "info", skip(timeline, articles))]
pub async fn write_report(timeline: &Timeline, articles: &[Article], path: &str) -> Result<()> {
    fs::write(path, render_report(timeline, articles)).await?;
    info!(path, "Wrote Markdown report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Credibility, Event};
    use chrono::Utc;

    #[test]
    fn bands_follow_cut_points() {
        assert_eq!(credibility_band(90), "high");
        assert_eq!(credibility_band(75), "high");
        assert_eq!(credibility_band(74), "medium");
        assert_eq!(credibility_band(50), "medium");
        assert_eq!(credibility_band(49), "low");
        assert_eq!(credibility_band(0), "low");
    }

    #[test]
    fn report_contains_cards_and_events() {
        let timeline = Timeline {
            query: "2023 earthquake".to_string(),
            generated_at: Utc::now(),
            events: vec![Event {
                timestamp: Some("04:17".to_string()),
                actors: vec!["AFAD".to_string()],
                description: "First tremor recorded".to_string(),
                source: "https://example.com/quake".to_string(),
            }],
        };
        let articles = vec![Article {
            title: "Quake strikes region".to_string(),
            publisher: "Example Times".to_string(),
            published: "Mon, 06 Feb 2023".to_string(),
            url: "https://feed.example/x".to_string(),
            resolved_url: "https://example.com/quake".to_string(),
            text: "body".to_string(),
            credibility: Some(Credibility {
                score: 82,
                reason: "Named agencies and precise figures".to_string(),
            }),
        }];

        let md = render_report(&timeline, &articles);
        assert!(md.contains("# Timeline: 2023 earthquake"));
        assert!(md.contains("### Quake strikes region"));
        assert!(md.contains("**82/100** (high)"));
        assert!(md.contains("First tremor recorded"));
        assert!(md.contains("(AFAD)"));
    }
}
