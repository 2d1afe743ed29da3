//! Plain-text extraction from publisher article pages.
//!
//! Paragraphs inside `<article>` win, then `<main>`, then any `<p>` on the
//! page. A page that yields fewer than 50 words is treated as unreadable.

use crate::error::{PipelineError, Result};
use crate::utils::{normalize_whitespace, word_count};
use scraper::{Html, Selector};
use tracing::{info, instrument, warn};

const MIN_ARTICLE_WORDS: usize = 50;

/// Fetch a page and pull out its article text.
///
/// Any failure along the way (network, HTTP status, unreadable body) is an
/// [`PipelineError::Extract`] for this URL; the caller excludes the article
/// and moves on.
#[instrument(level = "info", skip(http))]
pub async fn extract_text(http: &reqwest::Client, url: &str) -> Result<String> {
    let resp = http.get(url).send().await.map_err(|e| {
        warn!(%url, error = %e, "article fetch failed");
        PipelineError::Extract {
            url: url.to_string(),
        }
    })?;

    if !resp.status().is_success() {
        warn!(%url, status = %resp.status(), "article fetch returned error status");
        return Err(PipelineError::Extract {
            url: url.to_string(),
        });
    }

    let body = resp.text().await.map_err(|e| {
        warn!(%url, error = %e, "article body read failed");
        PipelineError::Extract {
            url: url.to_string(),
        }
    })?;

    match article_text(&body) {
        Some(text) => {
            info!(%url, words = word_count(&text), "Extracted article text");
            Ok(text)
        }
        None => Err(PipelineError::Extract {
            url: url.to_string(),
        }),
    }
}

/// Pull readable text out of an article page. `None` when no scope yields
/// enough words.
pub fn article_text(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);

    for scope in ["article p", "main p", "p"] {
        let selector = Selector::parse(scope).unwrap();
        let paragraphs: Vec<String> = doc
            .select(&selector)
            .map(|el| normalize_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
            .filter(|t| !t.is_empty())
            .collect();
        let joined = paragraphs.join("\n");
        if word_count(&joined) >= MIN_ARTICLE_WORDS {
            return Some(joined);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(n: usize) -> String {
        format!("<p>{}</p>", (0..n).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" "))
    }

    #[test]
    fn prefers_article_scope_over_page_noise() {
        let html = format!(
            "<html><body><nav><p>menu menu menu</p></nav>\
             <article>{}{}</article>\
             <footer>{}</footer></body></html>",
            paragraph(40),
            paragraph(40),
            paragraph(60),
        );
        let text = article_text(&html).unwrap();
        assert!(text.contains("word39"));
        assert!(!text.contains("menu"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn falls_back_to_main_then_any_paragraph() {
        let html = format!("<html><body><main>{}</main></body></html>", paragraph(80));
        assert!(article_text(&html).is_some());

        let bare = format!("<html><body>{}</body></html>", paragraph(80));
        assert!(article_text(&bare).is_some());
    }

    #[test]
    fn thin_pages_are_rejected() {
        let html = "<html><body><article><p>Too short to be an article.</p></article></body></html>";
        assert!(article_text(html).is_none());
    }

    #[test]
    fn pages_without_paragraphs_are_rejected() {
        let html = "<html><body><div>plenty of text but not in paragraph tags, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated, repeated</div></body></html>";
        assert!(article_text(html).is_none());
    }

    #[test]
    fn nested_markup_is_flattened() {
        let html = format!(
            "<html><body><article><p>Officials <b>confirmed</b> the <a href=\"#\">toll</a> rose.</p>{}</article></body></html>",
            paragraph(50),
        );
        let text = article_text(&html).unwrap();
        assert!(text.starts_with("Officials confirmed the toll rose."));
    }
}
