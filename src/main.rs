//! # Newsline
//!
//! A pipeline that turns a news query into a chronological event timeline:
//! it searches a news feed for coverage, resolves aggregator redirects to
//! publisher pages, extracts article text, scores each source's credibility,
//! extracts structured events from bounded text chunks, and merges everything
//! into one deduplicated timeline with per-event source attribution.
//!
//! ## Usage
//!
//! ```sh
//! newsline "2023 earthquake" -o timeline.txt
//! ```
//!
//! ## Architecture
//!
//! The pipeline is staged and linear per article, fanning in at the merge:
//! 1. **Search**: discover candidate article URLs from the news feed
//! 2. **Resolve**: turn aggregator redirects into publisher URLs
//! 3. **Extract**: pull plain article text out of each page
//! 4. **Score + Extract events**: credibility scoring runs concurrently with
//!    chunking and per-chunk event extraction
//! 5. **Merge**: all events, credibility-tagged, become one timeline
//! 6. **Post-process** (optional): translation, highlights, source comparison
//!
//! A failed article is excluded and the run continues; the run only fails
//! when no articles survive.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod browser;
mod chunker;
mod cli;
mod config;
mod error;
mod extract;
mod llm;
mod models;
mod outputs;
mod pipeline;
mod resolver;
mod sources;
mod utils;

use cli::Cli;
use config::Config;
use llm::ops;
use pipeline::Pipeline;
use utils::ensure_parent_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("newsline starting up");

    let args = Cli::parse();
    debug!(query = %args.query, output = %args.output, "Parsed CLI arguments");

    let config = Config::load(args.config.as_deref())?;
    debug!(?config, "Loaded configuration");

    // Early check: every requested output location must be writable before
    // the run spends money on model calls.
    for path in std::iter::once(&args.output)
        .chain(args.json_output.iter())
        .chain(args.markdown_output.iter())
    {
        if let Err(e) = ensure_parent_dir(path).await {
            error!(%path, error = %e, "Output location is not writable (fix perms or choose a different path)");
            return Err(e.into());
        }
    }

    // ---- Run the pipeline ----
    let pipeline = Pipeline::new(
        config,
        &args.api_key,
        args.max_articles,
        args.region.clone(),
        args.lang.clone(),
    )?;

    let result = pipeline.run(&args.query).await?;
    let (timeline, articles) = (result.timeline, result.articles);
    info!(
        events = timeline.events.len(),
        sources = articles.len(),
        "Timeline generated"
    );

    // ---- Outputs ----
    outputs::text::write_timeline(&timeline, &args.output).await?;

    if let Some(path) = &args.json_output {
        if let Err(e) = outputs::json::write_report(&timeline, &articles, path).await {
            error!(%path, error = %e, "Failed to write JSON report");
        }
    }
    if let Some(path) = &args.markdown_output {
        if let Err(e) = outputs::markdown::write_report(&timeline, &articles, path).await {
            error!(%path, error = %e, "Failed to write Markdown report");
        }
    }

    // ---- Post-processors (each failure reported, timeline untouched) ----
    let timeline_text = outputs::text::render_timeline(&timeline);

    if let Some(lang) = &args.translate {
        match ops::translate_timeline(pipeline.llm(), &timeline_text, lang).await {
            Ok(translated) => {
                println!("\n=== Timeline ({lang}) ===\n{translated}");
            }
            Err(e) => warn!(%lang, error = %e, "Translation failed"),
        }
    }

    if args.highlights {
        match ops::extract_highlights(pipeline.llm(), &timeline_text).await {
            Ok(highlights) => {
                println!("\n=== Key highlights ===");
                for line in &highlights {
                    println!("- {line}");
                }
            }
            Err(e) => warn!(error = %e, "Highlight extraction failed"),
        }
    }

    if args.compare {
        match ops::compare_sources(pipeline.llm(), &articles).await {
            Ok(report) => {
                println!("\n=== Source comparison ===");
                print_section("Agreements", &report.agreements);
                print_section("Differences", &report.differences);
                print_section("Unique details", &report.unique_details);
            }
            Err(e) => warn!(error = %e, "Source comparison failed"),
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        events = timeline.events.len(),
        "Execution complete"
    );

    Ok(())
}

fn print_section(title: &str, lines: &[String]) {
    println!("{title}:");
    if lines.is_empty() {
        println!("  (none)");
    }
    for line in lines {
        println!("  - {line}");
    }
}
