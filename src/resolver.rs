//! Redirect resolution: aggregator URL to canonical publisher URL.
//!
//! HTTP-level redirects are followed by the client; when the landing page is
//! still on the aggregator host, the page itself (rendered through the
//! browser service when one is configured) is inspected for a meta-refresh
//! target, a canonical link, or the first external anchor. When nothing can
//! be found the landing URL is kept and extraction gets to decide whether
//! the page is readable.

use crate::browser::BrowserClient;
use crate::error::{PipelineError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

static REFRESH_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)url\s*=\s*['"]?([^'">\s]+)"#).unwrap());

/// Resolve a feed URL to the publisher page it points at.
///
/// Fails with [`PipelineError::Resolve`] only when the redirect page cannot
/// be fetched at all; a fetched page that hides its target falls back to the
/// landing URL.
#[instrument(level = "info", skip(http, browser))]
pub async fn resolve(
    http: &reqwest::Client,
    browser: Option<&BrowserClient>,
    url: &str,
) -> Result<String> {
    let resp = http.get(url).send().await.map_err(|e| PipelineError::Resolve {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let landed = resp.url().clone();

    if !is_aggregator_host(&landed) {
        debug!(from = %url, to = %landed, "Redirects led off the aggregator");
        return Ok(landed.to_string());
    }

    // Still on the aggregator: the page body has to tell us where to go.
    let mut html = resp.text().await.unwrap_or_default();
    if let Some(browser) = browser {
        match browser.content(landed.as_str()).await {
            Ok(rendered) => html = rendered,
            Err(e) => {
                warn!(url = %landed, error = %e, "browser render failed; using plain body")
            }
        }
    }

    match find_redirect_target(&html, &landed) {
        Some(target) => {
            debug!(from = %url, to = %target, "Found publisher URL in page");
            Ok(target)
        }
        None => {
            warn!(%url, "could not find a publisher URL behind the aggregator page");
            Ok(landed.to_string())
        }
    }
}

fn is_aggregator_host(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|h| h == "news.google.com" || h.ends_with(".news.google.com"))
}

/// Look for the redirect destination in an aggregator interstitial page.
fn find_redirect_target(html: &str, base: &Url) -> Option<String> {
    let doc = Html::parse_document(html);
    let meta_refresh = Selector::parse(r#"meta[http-equiv="refresh"]"#).unwrap();
    let canonical = Selector::parse(r#"link[rel="canonical"]"#).unwrap();
    let anchor = Selector::parse("a[href]").unwrap();

    for meta in doc.select(&meta_refresh) {
        if let Some(content) = meta.value().attr("content") {
            if let Some(cap) = REFRESH_URL.captures(content) {
                if let Ok(joined) = base.join(&cap[1]) {
                    if !is_aggregator_host(&joined) {
                        return Some(joined.to_string());
                    }
                }
            }
        }
    }

    for link in doc.select(&canonical) {
        if let Some(target) = external_target(link.value().attr("href"), base) {
            return Some(target);
        }
    }

    for a in doc.select(&anchor) {
        if let Some(target) = external_target(a.value().attr("href"), base) {
            return Some(target);
        }
    }

    None
}

fn external_target(href: Option<&str>, base: &Url) -> Option<String> {
    let href = href?;
    let joined = base.join(href).ok()?;
    match joined.scheme() {
        "http" | "https" => {}
        _ => return None,
    }
    if is_aggregator_host(&joined) {
        return None;
    }
    Some(joined.to_string())
}
