//! Completion API client
//!
//! Thin client for the Anthropic messages API used by the AI-agent
//! endpoints. One request per endpoint call; the response text is passed
//! through to the caller unmodified.

use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;

use crm_common::config::{resolve_api_key, TomlConfig};
use crm_common::Error;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Messages API request body
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// Messages API response body (only the fields we read)
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Completion API client
///
/// Rate limited to 2 requests/second so a burst of agent requests cannot
/// exhaust the upstream quota.
pub struct LlmClient {
    /// HTTP client with configured timeouts
    client: Client,
    /// Base URL for the completion API
    base_url: String,
    /// API key sent in the x-api-key header
    api_key: String,
    /// Model identifier echoed back in agent responses
    model: String,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl LlmClient {
    /// Create new client with an API key
    ///
    /// # Panics
    /// Panics if the HTTP client cannot be built (should not happen with
    /// valid config)
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");

        let rate_limiter =
            RateLimiter::direct(Quota::per_second(NonZeroU32::new(2).expect("2 is non-zero")));

        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            rate_limiter,
        }
    }

    /// Create client from configuration sources
    ///
    /// Returns None when no API key is available (env var or TOML config).
    pub fn from_config(toml_config: &TomlConfig) -> Option<Self> {
        resolve_api_key(toml_config).map(Self::new)
    }

    /// Model identifier reported in agent responses
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a completion for a single user prompt
    ///
    /// # Errors
    /// Returns an error if the request fails, the API returns a non-success
    /// status, or the response carries no text content.
    pub async fn complete(&self, prompt: &str, max_tokens: u32) -> crm_common::Result<String> {
        // Wait for a rate limiter permit
        self.rate_limiter.until_ready().await;

        let url = format!("{}/v1/messages", self.base_url);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            temperature: 0.7,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!("Calling completion API (prompt {} chars)", prompt.len());

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Internal(format!("Completion API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Internal(format!(
                "Completion API returned status {}: {}",
                status, body
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("Failed to parse completion response: {}", e)))?;

        let text: String = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(Error::Internal(
                "Completion response carried no text content".to_string(),
            ));
        }

        Ok(text)
    }
}
