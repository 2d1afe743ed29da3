//! The pipeline coordinator.
//!
//! Stages run linearly per article (resolve, extract, then credibility
//! scoring concurrently with chunking and per-chunk event extraction), with
//! articles processed in parallel under a configurable concurrency limit.
//! Results fan in at the merge, the single serialization point: every
//! surviving article's events, tagged with that article's credibility score,
//! go to the merger in batches, and every event the merger returns must
//! reference a known article.
//!
//! A failed article is logged and excluded; the run only fails when the feed
//! returns nothing, every article fails, or the merge itself does.

use crate::browser::BrowserClient;
use crate::chunker;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::extract;
use crate::llm::ops::{self, MergeCandidate};
use crate::llm::LlmClient;
use crate::models::{Article, Event, FeedEntry, Timeline};
use crate::resolver;
use crate::sources::google_news;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// An article that survived every per-article stage, with its events.
#[derive(Debug)]
pub struct ProcessedArticle {
    pub article: Article,
    pub events: Vec<Event>,
}

/// Everything a run produces: the merged timeline plus the scored articles
/// it was built from, for reports and post-processing.
#[derive(Debug)]
pub struct RunResult {
    pub timeline: Timeline,
    pub articles: Vec<Article>,
}

pub struct Pipeline {
    config: Config,
    llm: LlmClient,
    http: reqwest::Client,
    browser: Option<BrowserClient>,
    max_articles: usize,
    region: String,
    lang: String,
}

impl Pipeline {
    pub fn new(
        config: Config,
        api_key: &str,
        max_articles: usize,
        region: String,
        lang: String,
    ) -> Result<Self> {
        let page_timeout = Duration::from_secs(config.page_timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(page_timeout)
            .user_agent(APP_USER_AGENT)
            .build()?;
        let browser = match &config.browser_service {
            Some(service) => Some(BrowserClient::new(service, page_timeout)?),
            None => None,
        };
        let llm = LlmClient::new(&config, api_key)?;
        Ok(Self {
            config,
            llm,
            http,
            browser,
            max_articles,
            region,
            lang,
        })
    }

    /// Run the full pipeline for a query and return the merged timeline
    /// together with its source articles.
    #[instrument(level = "info", skip(self))]
    pub async fn run(&self, query: &str) -> Result<RunResult> {
        let entries =
            google_news::search(&self.http, query, &self.region, &self.lang).await?;
        if entries.is_empty() {
            return Err(PipelineError::NoResults {
                query: query.to_string(),
            });
        }

        let candidates: Vec<FeedEntry> =
            entries.into_iter().take(self.max_articles).collect();
        let total = candidates.len();
        info!(total, query, "Processing candidate articles");

        let processed: Vec<ProcessedArticle> = stream::iter(candidates)
            .map(|entry| self.process_entry(entry))
            .buffer_unordered(self.config.concurrency)
            .filter_map(std::future::ready)
            .collect()
            .await;

        if processed.is_empty() {
            return Err(PipelineError::AllArticlesFailed { total });
        }
        info!(
            total,
            successful = processed.len(),
            failed = total - processed.len(),
            "Completed per-article stages"
        );

        let timeline = self.merge(query, &processed).await?;
        let articles = processed.into_iter().map(|p| p.article).collect();
        Ok(RunResult { timeline, articles })
    }

    /// The model client, for post-processing calls made by the caller.
    pub fn llm(&self) -> &LlmClient {
        &self.llm
    }

    async fn process_entry(&self, entry: FeedEntry) -> Option<ProcessedArticle> {
        let url = entry.url.clone();
        match self.process_entry_inner(entry).await {
            Ok(processed) => Some(processed),
            Err(e) => {
                warn!(%url, error = %e, "Excluding article from the run");
                None
            }
        }
    }

    async fn process_entry_inner(&self, entry: FeedEntry) -> Result<ProcessedArticle> {
        let resolved =
            resolver::resolve(&self.http, self.browser.as_ref(), &entry.url).await?;
        let text = extract::extract_text(&self.http, &resolved).await?;

        let mut article = Article {
            title: entry.title,
            publisher: entry.publisher,
            published: entry.published,
            url: entry.url,
            resolved_url: resolved,
            text,
            credibility: None,
        };

        let (credibility, events) = futures::join!(
            ops::score_article(&self.llm, &article),
            self.extract_article_events(&article),
        );
        let credibility = credibility.map_err(|e| PipelineError::Score {
            url: article.resolved_url.clone(),
            source: Box::new(e),
        })?;
        let events = events?;

        article.credibility = Some(credibility);
        debug!(
            url = %article.resolved_url,
            events = events.len(),
            "Article processed"
        );
        Ok(ProcessedArticle { article, events })
    }

    async fn extract_article_events(&self, article: &Article) -> Result<Vec<Event>> {
        let chunks = chunker::chunk_article(article, self.config.max_words_per_chunk)?;
        let mut events = Vec::new();
        for chunk in &chunks {
            events.extend(ops::extract_events(&self.llm, article, chunk).await?);
        }
        Ok(events)
    }

    /// Assemble merge input, run the merge in rolling batches, and validate
    /// that every returned event traces back to a run article.
    async fn merge(&self, query: &str, processed: &[ProcessedArticle]) -> Result<Timeline> {
        let scores = credibility_by_source(processed);
        let candidates = assemble_candidates(processed, &scores);

        if candidates.is_empty() {
            warn!("No events extracted from any article; timeline is empty");
            return Ok(Timeline {
                query: query.to_string(),
                generated_at: Utc::now(),
                events: Vec::new(),
            });
        }
        info!(events = candidates.len(), "Merging events into a timeline");

        let mut merged: Vec<Event> = Vec::new();
        for batch in candidates.chunks(self.config.merge_batch_size) {
            // Carry the running timeline into the next call so later batches
            // merge against what is already settled.
            let mut input: Vec<MergeCandidate> = merged
                .drain(..)
                .map(|e| {
                    let credibility = scores.get(e.source.as_str()).copied().unwrap_or(50);
                    MergeCandidate {
                        timestamp: e.timestamp,
                        actors: e.actors,
                        description: e.description,
                        source: e.source,
                        credibility,
                    }
                })
                .collect();
            input.extend(batch.iter().cloned());
            merged = ops::merge_events(&self.llm, query, &input).await?;
        }

        let known: HashSet<&str> = processed
            .iter()
            .map(|p| p.article.resolved_url.as_str())
            .collect();
        validate_sources(&merged, &known)?;

        Ok(Timeline {
            query: query.to_string(),
            generated_at: Utc::now(),
            events: merged,
        })
    }
}

/// Credibility score per resolved article URL.
fn credibility_by_source(processed: &[ProcessedArticle]) -> HashMap<&str, u8> {
    processed
        .iter()
        .map(|p| {
            let score = p.article.credibility.as_ref().map_or(50, |c| c.score);
            (p.article.resolved_url.as_str(), score)
        })
        .collect()
}

/// Flatten all articles' events into credibility-tagged merge candidates,
/// deduplicated on (source, description).
fn assemble_candidates(
    processed: &[ProcessedArticle],
    scores: &HashMap<&str, u8>,
) -> Vec<MergeCandidate> {
    processed
        .iter()
        .flat_map(|p| p.events.iter())
        .unique_by(|e| (e.source.clone(), e.description.clone()))
        .map(|e| MergeCandidate {
            timestamp: e.timestamp.clone(),
            actors: e.actors.clone(),
            description: e.description.clone(),
            source: e.source.clone(),
            credibility: scores.get(e.source.as_str()).copied().unwrap_or(50),
        })
        .collect()
}

/// Every merged event must reference an article the run actually fetched.
fn validate_sources(events: &[Event], known: &HashSet<&str>) -> Result<()> {
    for event in events {
        if !known.contains(event.source.as_str()) {
            return Err(PipelineError::MergeIntegrity {
                reference: event.source.clone(),
            });
        }
    }
    Ok(())
}
