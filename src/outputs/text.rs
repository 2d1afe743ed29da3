//! Plain-text timeline export.

use crate::error::Result;
use crate::models::Timeline;
use std::fmt::Write;
use tokio::fs;
use tracing::{info, instrument};

/// Render a timeline as plain text, one event per line.
pub fn render_timeline(timeline: &Timeline) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "Timeline for \"{}\" (generated {})",
        timeline.query,
        timeline.generated_at.format("%Y-%m-%d %H:%M UTC")
    )
    .unwrap();
    writeln!(out).unwrap();

    for event in &timeline.events {
        let stamp = event.timestamp.as_deref().unwrap_or("undated");
        writeln!(
            out,
            "- [{}] {} (source: {})",
            stamp, event.description, event.source
        )
        .unwrap();
    }

    out
}

/// Write the rendered timeline to the caller's chosen path.
#[instrument(level = "info", skip(timeline))]
pub async fn write_timeline(timeline: &Timeline, path: &str) -> Result<()> {
    fs::write(path, render_timeline(timeline)).await?;
    info!(path, events = timeline.events.len(), "Wrote timeline");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Event;
    use chrono::Utc;

    fn sample() -> Timeline {
        Timeline {
            query: "2023 earthquake".to_string(),
            generated_at: Utc::now(),
            events: vec![
                Event {
                    timestamp: Some("2023-02-06 04:17".to_string()),
                    actors: vec!["AFAD".to_string()],
                    description: "Magnitude 7.8 earthquake recorded".to_string(),
                    source: "https://example.com/quake".to_string(),
                },
                Event {
                    timestamp: None,
                    actors: vec![],
                    description: "Rescue teams deployed".to_string(),
                    source: "https://other.example/report".to_string(),
                },
            ],
        }
    }

    #[test]
    fn renders_one_line_per_event() {
        let text = render_timeline(&sample());
        assert!(text.contains(
            "- [2023-02-06 04:17] Magnitude 7.8 earthquake recorded (source: https://example.com/quake)"
        ));
        assert!(text.contains("- [undated] Rescue teams deployed"));
    }

    #[test]
    fn header_names_the_query() {
        let text = render_timeline(&sample());
        assert!(text.starts_with("Timeline for \"2023 earthquake\""));
    }

    #[test]
    fn empty_timeline_renders_header_only() {
        let timeline = Timeline {
            query: "quiet day".to_string(),
            generated_at: Utc::now(),
            events: vec![],
        };
        let text = render_timeline(&timeline);
        assert!(!text.contains("- ["));
    }
}
