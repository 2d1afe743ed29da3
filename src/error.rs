//! Typed errors for every pipeline stage.
//!
//! Per-article errors ([`Resolve`](PipelineError::Resolve),
//! [`Extract`](PipelineError::Extract), [`Score`](PipelineError::Score)) are
//! recovered by excluding the article and continuing the run. Run-level errors
//! ([`NoResults`](PipelineError::NoResults),
//! [`AllArticlesFailed`](PipelineError::AllArticlesFailed),
//! [`MergeIntegrity`](PipelineError::MergeIntegrity)) abort the run and are
//! surfaced to the caller with enough context to retry manually.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The news feed returned zero articles for the query.
    #[error("no articles found for query \"{query}\"")]
    NoResults { query: String },

    /// A redirect URL could not be resolved to a publisher page.
    #[error("failed to resolve {url}: {reason}")]
    Resolve { url: String, reason: String },

    /// The page yielded no readable article text.
    #[error("no readable article text at {url}")]
    Extract { url: String },

    /// Credibility scoring failed for an article.
    #[error("credibility scoring failed for {url}")]
    Score {
        url: String,
        #[source]
        source: Box<PipelineError>,
    },

    /// The merger returned an event that no fetched article accounts for.
    #[error("merged event references unknown source \"{reference}\"")]
    MergeIntegrity { reference: String },

    /// Every candidate article failed before the merge could run.
    #[error("all {total} candidate articles failed before the merge")]
    AllArticlesFailed { total: usize },

    /// A caller-supplied value is unusable (empty text, zero chunk width, bad config).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The model's output did not match the expected schema.
    #[error("model returned non-conforming {context}")]
    Validation {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// An external API responded with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse error: {0}")]
    Feed(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
