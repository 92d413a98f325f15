//! Summaries generated by an OpenAI-compatible chat completions API.
//!
//! The summarizer makes exactly one request per call. Failures are surfaced to the caller and
//! never retried here; the request handler treats any error as fatal for the request.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed instruction sent as the system message of every summarization request.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You summarize and analyze text supplied by the user. \
Respond in exactly this format:\n\
Summary: <two or three sentences covering the main points>\n\
Analysis: <a short assessment of the claims, tone, and any missing context>";

/// Errors surfaced while attempting summarization.
#[derive(Debug, Error)]
pub enum SummarizationError {
    /// No credential was configured, so the provider cannot be called.
    #[error("Summarization provider not configured: missing OPENAI_API_KEY")]
    MissingApiKey,
    /// Request never produced an HTTP response (connect failure, timeout, body read error).
    #[error("Failed to reach summarization provider: {0}")]
    Transport(#[from] reqwest::Error),
    /// Provider answered with a non-success status.
    #[error("Summarization provider returned {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Response body, for diagnostics.
        body: String,
    },
    /// Provider response could not be decoded.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
    /// Provider returned no usable text.
    #[error("empty summary")]
    EmptySummary,
}

/// Interface implemented by summarization backends.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Produce a summary for non-empty, preprocessed text.
    async fn summarize(&self, text: &str) -> Result<String, SummarizationError>;
}

/// Chat-completions client for OpenAI and API-compatible providers.
pub struct OpenAiSummarizationClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

impl OpenAiSummarizationClient {
    /// Build a client from configuration, applying the outbound request timeout.
    pub fn new(config: &Config) -> reqwest::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("contentlens/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;
        tracing::debug!(
            base_url = %config.openai_base_url,
            model = %config.openai_model,
            max_tokens = config.max_tokens,
            has_api_key = config.openai_api_key.is_some(),
            "Initialized summarization client"
        );
        Ok(Self {
            http,
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
    /// Legacy completions payloads carry the text here instead of in `message`.
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, or `""` when the provider returned nothing usable.
    fn first_text(&self) -> &str {
        let Some(choice) = self.choices.first() else {
            return "";
        };
        choice
            .message
            .as_ref()
            .and_then(|message| message.content.as_deref())
            .or(choice.text.as_deref())
            .unwrap_or("")
    }
}

#[async_trait]
impl SummarizationClient for OpenAiSummarizationClient {
    async fn summarize(&self, text: &str) -> Result<String, SummarizationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SummarizationError::MissingApiKey)?;

        let payload = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SUMMARY_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationError::UnexpectedStatus { status, body });
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|error| SummarizationError::InvalidResponse(error.to_string()))?;

        let summary = parsed.first_text().trim();
        if summary.is_empty() {
            return Err(SummarizationError::EmptySummary);
        }
        tracing::debug!(model = %self.model, bytes = summary.len(), "Summary generated");
        Ok(summary.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileConfig;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn client_for(server: &MockServer, api_key: Option<&str>) -> OpenAiSummarizationClient {
        let base_url = server.base_url();
        let api_key = api_key.map(str::to_string);
        let config = Config::from_sources(FileConfig::default(), move |key| match key {
            "OPENAI_BASE_URL" => Some(base_url.clone()),
            "OPENAI_API_KEY" => api_key.clone(),
            "REQUEST_TIMEOUT_SECS" => Some("5".into()),
            _ => None,
        })
        .expect("config");
        OpenAiSummarizationClient::new(&config).expect("client")
    }

    #[tokio::test]
    async fn sends_fixed_prompt_and_returns_trimmed_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer test-key")
                    .json_body(json!({
                        "model": "gpt-4",
                        "messages": [
                            {"role": "system", "content": SUMMARY_SYSTEM_PROMPT},
                            {"role": "user", "content": "Some article"}
                        ],
                        "max_tokens": 150
                    }));
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": "  This is a summary.\n"}}]
                }));
            })
            .await;

        let summary = client_for(&server, Some("test-key"))
            .summarize("Some article")
            .await
            .expect("summary");

        mock.assert_async().await;
        assert_eq!(summary, "This is a summary.");
    }

    #[tokio::test]
    async fn accepts_legacy_text_choices() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200)
                    .json_body(json!({"choices": [{"text": "Legacy summary"}]}));
            })
            .await;

        let summary = client_for(&server, Some("test-key"))
            .summarize("text")
            .await
            .expect("summary");
        assert_eq!(summary, "Legacy summary");
    }

    #[tokio::test]
    async fn empty_content_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200)
                    .json_body(json!({"choices": [{"message": {"content": "   "}}]}));
            })
            .await;

        let error = client_for(&server, Some("test-key"))
            .summarize("text")
            .await
            .expect_err("empty summary");
        assert!(matches!(error, SummarizationError::EmptySummary));
        assert_eq!(error.to_string(), "empty summary");
    }

    #[tokio::test]
    async fn missing_choices_or_null_content_is_empty() {
        for body in [
            json!({}),
            json!({"choices": []}),
            json!({"choices": [{"message": {"content": null}}]}),
        ] {
            let server = MockServer::start_async().await;
            server
                .mock_async(|when, then| {
                    when.method(POST).path("/chat/completions");
                    then.status(200).json_body(body.clone());
                })
                .await;

            let error = client_for(&server, Some("test-key"))
                .summarize("text")
                .await
                .expect_err("empty summary");
            assert!(matches!(error, SummarizationError::EmptySummary), "{body}");
        }
    }

    #[tokio::test]
    async fn error_status_is_surfaced_once() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(500).body("boom");
            })
            .await;

        let error = client_for(&server, Some("test-key"))
            .summarize("text")
            .await
            .expect_err("error response");

        mock.assert_hits_async(1).await;
        assert!(matches!(
            error,
            SummarizationError::UnexpectedStatus { status, ref body }
                if status == StatusCode::INTERNAL_SERVER_ERROR && body == "boom"
        ));
    }

    #[tokio::test]
    async fn malformed_payload_is_invalid_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).body("<html>");
            })
            .await;

        let error = client_for(&server, Some("test-key"))
            .summarize("text")
            .await
            .expect_err("malformed");
        assert!(matches!(error, SummarizationError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_calling_provider() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200);
            })
            .await;

        let error = client_for(&server, None)
            .summarize("text")
            .await
            .expect_err("no key");

        assert!(matches!(error, SummarizationError::MissingApiKey));
        mock.assert_hits_async(0).await;
    }
}
