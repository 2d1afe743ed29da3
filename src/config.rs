//! Runtime configuration loaded from an optional YAML file.
//!
//! Every field has a default, so the pipeline runs without any file present.
//! The fast/smart model split follows the workload: scoring, per-chunk event
//! extraction, translation, and highlights use the fast model; the merge and
//! source comparison, which reason over everything at once, use the smart one.

use crate::error::{PipelineError, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of an OpenAI-compatible chat completions API.
    pub api_base: String,
    /// Model for per-chunk and per-article calls.
    pub fast_model: String,
    /// Model for whole-run calls (merge, source comparison).
    pub smart_model: String,
    /// Upper bound on concurrent per-article tasks.
    pub concurrency: usize,
    /// Timeout for page and feed fetches, in seconds.
    pub page_timeout_secs: u64,
    /// Timeout for a single model call, in seconds.
    pub llm_timeout_secs: u64,
    /// Maximum words per chunk sent to the event extractor.
    pub max_words_per_chunk: usize,
    /// Maximum events per merge call; larger runs merge in rolling batches.
    pub merge_batch_size: usize,
    /// Optional headless-browser rendering service for redirect resolution.
    pub browser_service: Option<BrowserService>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserService {
    pub base_url: String,
    pub token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            fast_model: "gpt-4.1-mini".to_string(),
            smart_model: "gpt-4.1".to_string(),
            concurrency: 4,
            page_timeout_secs: 30,
            llm_timeout_secs: 120,
            max_words_per_chunk: 300,
            merge_batch_size: 120,
            browser_service: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, or defaults when no path is given.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)?;
                serde_yaml::from_str(&raw)
                    .map_err(|e| PipelineError::InvalidInput(format!("config {p}: {e}")))
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.max_words_per_chunk, 300);
        assert!(config.concurrency >= 1);
        assert!(config.merge_batch_size >= 1);
        assert!(config.browser_service.is_none());
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let config: Config =
            serde_yaml::from_str("concurrency: 8\nfast_model: local-mini\n").unwrap();
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.fast_model, "local-mini");
        assert_eq!(config.smart_model, Config::default().smart_model);
    }

    #[test]
    fn browser_service_parses() {
        let config: Config = serde_yaml::from_str(
            "browser_service:\n  base_url: http://localhost:3000\n  token: secret\n",
        )
        .unwrap();
        let svc = config.browser_service.unwrap();
        assert_eq!(svc.base_url, "http://localhost:3000");
        assert_eq!(svc.token.as_deref(), Some("secret"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_yaml::from_str::<Config>("concurency: 8\n").is_err());
    }
}
