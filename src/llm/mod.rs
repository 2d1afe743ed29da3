//! LLM transport with exponential backoff retry logic.
//!
//! [`LlmClient`] speaks the OpenAI-compatible chat completions protocol over
//! `reqwest`. The retry machinery is trait-based:
//! - [`AskAsync`]: core trait for a single model call
//! - [`ChatCall`]: binds a client, model, and system prompt to one call shape
//! - [`RetryAsk`]: decorator adding exponential backoff to any [`AskAsync`]
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd
//!
//! Structured calls go through [`ask_json`], which strips markdown code
//! fences, re-asks once when the response looks truncated, and surfaces a
//! schema mismatch as [`PipelineError::Validation`] instead of a silent
//! misparse.

pub mod ops;

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::utils::{looks_truncated, truncate_for_log};
use rand::{Rng, rng};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

/// Trait for a single async model call.
pub trait AskAsync {
    type Response;

    async fn ask(&self, text: &str) -> Result<Self::Response>;
}

/// Decorator that adds exponential backoff retry logic to any [`AskAsync`]
/// implementation.
///
/// The delay between retries follows:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync,
{
    type Response = T::Response;

    async fn ask(&self, text: &str) -> Result<Self::Response> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Client for an OpenAI-compatible chat completions API.
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    pub fast_model: String,
    pub smart_model: String,
}

impl fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmClient")
            .field("base_url", &self.base_url)
            .field("fast_model", &self.fast_model)
            .field("smart_model", &self.smart_model)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl LlmClient {
    pub fn new(config: &Config, api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(config.llm_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            fast_model: config.fast_model.clone(),
            smart_model: config.smart_model.clone(),
        })
    }

    #[instrument(level = "debug", skip_all, fields(model = %model))]
    async fn chat(&self, model: &str, system: &str, user: &str, json_mode: bool) -> Result<String> {
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(PipelineError::Api { status, message });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| PipelineError::Api {
                status: 200,
                message: "response contained no choices".to_string(),
            })
    }
}

/// Binds a client, model choice, and system prompt into one [`AskAsync`] call.
pub struct ChatCall<'a> {
    pub client: &'a LlmClient,
    pub model: &'a str,
    pub system: &'a str,
    pub json_mode: bool,
}

impl AskAsync for ChatCall<'_> {
    type Response = String;

    async fn ask(&self, text: &str) -> Result<String> {
        let t0 = Instant::now();
        let res = self
            .client
            .chat(self.model, self.system, text, self.json_mode)
            .await;
        if let Err(e) = &res {
            warn!(elapsed_ms = t0.elapsed().as_millis() as u128, error = %e, "model call failed");
        }
        res
    }
}

/// Call the model with backoff and return the raw response text.
#[instrument(level = "info", skip_all, fields(model = %model))]
pub async fn ask_with_backoff(
    client: &LlmClient,
    model: &str,
    system: &str,
    user: &str,
    json_mode: bool,
) -> Result<String> {
    let call = ChatCall {
        client,
        model,
        system,
        json_mode,
    };
    let api = RetryAsk::new(call, 5, StdDuration::from_secs(1));
    api.ask(user).await
}

/// Call the model and parse its output against a typed schema.
///
/// Truncated responses (EOF while parsing) get exactly one re-ask; anything
/// else that fails the schema becomes a [`PipelineError::Validation`] carrying
/// `context` for the log line.
pub async fn ask_json<T: DeserializeOwned>(
    client: &LlmClient,
    model: &str,
    system: &str,
    user: &str,
    context: &'static str,
) -> Result<T> {
    let mut raw = ask_with_backoff(client, model, system, user, true).await?;
    let mut parsed = serde_json::from_str::<T>(strip_code_fences(&raw));

    if matches!(&parsed, Err(e) if looks_truncated(e)) {
        warn!(context, "EOF while parsing; re-asking once");
        raw = ask_with_backoff(client, model, system, user, true).await?;
        parsed = serde_json::from_str::<T>(strip_code_fences(&raw));
    }

    parsed.map_err(|e| {
        warn!(
            context,
            error = %e,
            response_preview = %truncate_for_log(&raw, 300),
            "model returned non-conforming JSON"
        );
        PipelineError::Validation { context, source: e }
    })
}

/// Strip markdown code fences some models wrap around JSON output.
pub fn strip_code_fences(s: &str) -> &str {
    s.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}
