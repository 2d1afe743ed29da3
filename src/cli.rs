//! Command-line interface definitions.

use clap::Parser;

/// Command-line arguments.
///
/// The query is positional; everything else has a default or an environment
/// fallback.
///
/// # Examples
///
/// ```sh
/// # Basic usage: timeline written to timeline.txt
/// newsline "2023 earthquake"
///
/// # Extra artifacts and post-processing
/// newsline "2023 earthquake" -o quake.txt --markdown-output quake.md \
///     --translate Tamil --highlights --compare
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// News topic to build a timeline for
    pub query: String,

    /// Output path for the plain-text timeline
    #[arg(short, long, default_value = "timeline.txt")]
    pub output: String,

    /// Optional output path for a JSON run report
    #[arg(long)]
    pub json_output: Option<String>,

    /// Optional output path for a Markdown report
    #[arg(long)]
    pub markdown_output: Option<String>,

    /// Maximum number of articles to process
    #[arg(long, default_value_t = 10)]
    pub max_articles: usize,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// API key for the model endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// News feed region code
    #[arg(long, default_value = "IN")]
    pub region: String,

    /// News feed language code
    #[arg(long, default_value = "en-IN")]
    pub lang: String,

    /// Also translate the timeline into this language
    #[arg(long, value_name = "LANGUAGE")]
    pub translate: Option<String>,

    /// Also print the top five highlights
    #[arg(long)]
    pub highlights: bool,

    /// Also print a comparison of how the sources covered the story
    #[arg(long)]
    pub compare: bool,
}
