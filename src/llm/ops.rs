//! Typed model operations: each call is an explicit input struct serialized
//! into the user message and an output schema validated on the way back, so a
//! malformed response surfaces as a `Validation` error instead of a silent
//! misparse.
//!
//! Attribution is never trusted to the model: extracted events are tagged
//! with the article's resolved URL here, and the merge prompt is required to
//! carry those tags through unchanged (the pipeline verifies that it did).

use super::{LlmClient, ask_json, ask_with_backoff};
use crate::error::{PipelineError, Result};
use crate::models::{Article, Chunk, Credibility, Event, SourceComparison};
use crate::utils::truncate_chars;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

fn request_body<T: Serialize>(input: &T, context: &str) -> Result<String> {
    serde_json::to_string_pretty(input)
        .map_err(|e| PipelineError::InvalidInput(format!("could not encode {context}: {e}")))
}

/// How much article body the scorer sees.
const SCORE_CONTENT_CHARS: usize = 1200;
/// How much of each article the source comparison sees.
const COMPARE_CONTENT_CHARS: usize = 1500;
/// Highlights are capped at the five most important events.
const MAX_HIGHLIGHTS: usize = 5;

const SCORE_SYSTEM: &str = r#"Analyze the credibility of the news article in the user message and give a score from 0 to 100.

Criteria:
- Reputed publisher
- Specific details (names, dates, numbers)
- Direct quotes
- Neutral language
- Internal consistency
- Avoids vague claims
- Completeness

Respond strictly with a JSON object: {"score": <number 0-100>, "reason": "<short explanation>"}"#;

const EVENTS_SYSTEM: &str = r#"Extract factual events from the article chunk in the user message. Use the metadata for context but report only events stated in the chunk itself.

Respond strictly with a JSON object:
{"events": [{"timestamp": "<time or date if known, else null>", "actors": ["<people or organizations involved>"], "description": "<one factual sentence>"}]}

Report an event only if the chunk states it. If the chunk contains no events, return {"events": []}."#;

const MERGE_SYSTEM: &str = r#"The events in the user message came from multiple articles about the same story. Each event carries the URL of its source article and that source's credibility score (0-100).

Your tasks:
1. Merge them into a single timeline
2. Remove duplicates describing the same occurrence
3. Resolve conflicting timestamps, preferring higher-credibility sources and published dates
4. Arrange in chronological order

Keep every event's "source" URL exactly as given; never invent events that are not in the input.

Respond strictly with a JSON object:
{"events": [{"timestamp": "<time or date if known, else null>", "actors": [...], "description": "...", "source": "<url from the input>"}]}"#;

const HIGHLIGHTS_SYSTEM: &str = r#"Extract the 5 most important events from the timeline in the user message.

Respond strictly with a JSON object: {"highlights": ["<one line per event>"]}"#;

const COMPARE_SYSTEM: &str = r#"Compare how the articles in the user message cover the same story.

Respond strictly with a JSON object:
{"agreements": ["<points the sources agree on>"],
 "differences": ["<points where they conflict>"],
 "unique_details": ["<details only one source reports>"]}"#;

#[derive(Debug, Serialize)]
struct ScoreInput<'a> {
    title: &'a str,
    publisher: &'a str,
    published: &'a str,
    content: &'a str,
}

/// Score an article's trustworthiness. Runs on the fast model with the body
/// capped at 1200 characters.
#[instrument(level = "info", skip_all, fields(url = %article.resolved_url))]
pub async fn score_article(client: &LlmClient, article: &Article) -> Result<Credibility> {
    let input = ScoreInput {
        title: &article.title,
        publisher: &article.publisher,
        published: &article.published,
        content: truncate_chars(&article.text, SCORE_CONTENT_CHARS),
    };
    let user = request_body(&input, "credibility request")?;
    let credibility: Credibility = ask_json(
        client,
        &client.fast_model,
        SCORE_SYSTEM,
        &user,
        "credibility judgement",
    )
    .await?;
    debug!(score = credibility.score, "Scored article");
    Ok(credibility)
}

#[derive(Debug, Serialize)]
struct EventExtractionInput<'a> {
    title: &'a str,
    publisher: &'a str,
    published: &'a str,
    url: &'a str,
    chunk_ordinal: usize,
    chunk: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExtractedEventList {
    #[serde(default)]
    events: Vec<ExtractedEvent>,
}

#[derive(Debug, Deserialize)]
struct ExtractedEvent {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    actors: Vec<String>,
    description: String,
}

/// Extract structured events from one chunk. Events come back tagged with the
/// parent article's resolved URL.
#[instrument(level = "info", skip_all, fields(url = %article.resolved_url, ordinal = chunk.ordinal))]
pub async fn extract_events(
    client: &LlmClient,
    article: &Article,
    chunk: &Chunk,
) -> Result<Vec<Event>> {
    let input = EventExtractionInput {
        title: &article.title,
        publisher: &article.publisher,
        published: &article.published,
        url: &article.resolved_url,
        chunk_ordinal: chunk.ordinal,
        chunk: &chunk.text,
    };
    let user = request_body(&input, "event extraction request")?;
    let extracted: ExtractedEventList = ask_json(
        client,
        &client.fast_model,
        EVENTS_SYSTEM,
        &user,
        "event list",
    )
    .await?;

    let events: Vec<Event> = extracted
        .events
        .into_iter()
        .map(|e| Event {
            timestamp: e.timestamp,
            actors: e.actors.into_iter().unique().collect(),
            description: e.description,
            source: chunk.source.clone(),
        })
        .collect();
    debug!(count = events.len(), "Extracted events from chunk");
    Ok(events)
}

/// An event plus its source article's credibility score, ready for the merge.
#[derive(Debug, Clone, Serialize)]
pub struct MergeCandidate {
    pub timestamp: Option<String>,
    pub actors: Vec<String>,
    pub description: String,
    pub source: String,
    pub credibility: u8,
}

#[derive(Debug, Serialize)]
struct MergeInput<'a> {
    query: &'a str,
    events: &'a [MergeCandidate],
}

#[derive(Debug, Deserialize)]
struct MergedEventList {
    #[serde(default)]
    events: Vec<MergedEvent>,
}

#[derive(Debug, Deserialize)]
struct MergedEvent {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    actors: Vec<String>,
    description: String,
    source: String,
}

/// Merge credibility-tagged events into one deduplicated, chronologically
/// ordered list. Runs on the smart model.
#[instrument(level = "info", skip_all, fields(count = candidates.len()))]
pub async fn merge_events(
    client: &LlmClient,
    query: &str,
    candidates: &[MergeCandidate],
) -> Result<Vec<Event>> {
    let input = MergeInput {
        query,
        events: candidates,
    };
    let user = request_body(&input, "merge request")?;
    let merged: MergedEventList = ask_json(
        client,
        &client.smart_model,
        MERGE_SYSTEM,
        &user,
        "merged timeline",
    )
    .await?;

    Ok(merged
        .events
        .into_iter()
        .map(|e| Event {
            timestamp: e.timestamp,
            actors: e.actors,
            description: e.description,
            source: e.source,
        })
        .collect())
}

/// Translate rendered timeline text into the target language.
#[instrument(level = "info", skip_all, fields(target_lang = %target_lang))]
pub async fn translate_timeline(
    client: &LlmClient,
    timeline_text: &str,
    target_lang: &str,
) -> Result<String> {
    let system = format!(
        "Translate the timeline in the user message into {target_lang}. \
         Keep the line structure and the source URLs untranslated."
    );
    ask_with_backoff(client, &client.fast_model, &system, timeline_text, false).await
}

#[derive(Debug, Deserialize)]
struct HighlightList {
    #[serde(default)]
    highlights: Vec<String>,
}

/// Pull the five most important events out of a rendered timeline.
#[instrument(level = "info", skip_all)]
pub async fn extract_highlights(client: &LlmClient, timeline_text: &str) -> Result<Vec<String>> {
    let list: HighlightList = ask_json(
        client,
        &client.fast_model,
        HIGHLIGHTS_SYSTEM,
        timeline_text,
        "highlight list",
    )
    .await?;
    Ok(list.highlights.into_iter().take(MAX_HIGHLIGHTS).collect())
}

#[derive(Debug, Serialize)]
struct CompareInput<'a> {
    articles: Vec<CompareArticle<'a>>,
}

#[derive(Debug, Serialize)]
struct CompareArticle<'a> {
    publisher: &'a str,
    title: &'a str,
    content: &'a str,
}

/// Compare how the run's sources covered the story. Runs on the smart model
/// with each article capped at 1500 characters.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn compare_sources(
    client: &LlmClient,
    articles: &[Article],
) -> Result<SourceComparison> {
    let input = CompareInput {
        articles: articles
            .iter()
            .map(|a| CompareArticle {
                publisher: &a.publisher,
                title: &a.title,
                content: truncate_chars(&a.text, COMPARE_CONTENT_CHARS),
            })
            .collect(),
    };
    let user = request_body(&input, "comparison request")?;
    ask_json(
        client,
        &client.smart_model,
        COMPARE_SYSTEM,
        &user,
        "source comparison",
    )
    .await
}
