//! OpenAI-compatible HTTP oracle
//!
//! Works with any chat-completions endpoint (OpenAI, Azure OpenAI, Ollama,
//! vLLM). Requests JSON-object output and strips code fences from replies.

use crate::config::OracleConfig;
use crate::error::{Result, TailorError};
use crate::llm::prompts::PromptTemplates;
use crate::llm::{Oracle, OracleTask};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const MAX_BACKOFF_DOUBLINGS: u32 = 6;

pub struct HttpOracle {
    client: Client,
    config: OracleConfig,
    api_key: Option<String>,
    prompts: PromptTemplates,
    backoff_base: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl HttpOracle {
    /// Build a client from configuration; the API key is read from the
    /// configured environment variable.
    pub fn new(config: OracleConfig) -> Result<Self> {
        let api_key = config.api_key();
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: OracleConfig, api_key: Option<String>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TailorError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        if api_key.is_none() {
            warn!(
                "No API key found in ${}; requests are sent unauthenticated",
                config.api_key_env
            );
        }

        Ok(Self {
            client,
            config,
            api_key,
            prompts: PromptTemplates::default(),
            backoff_base: Duration::from_millis(1000),
        })
    }

    pub fn with_prompts(mut self, prompts: PromptTemplates) -> Self {
        self.prompts = prompts;
        self
    }

    /// Base delay of the exponential backoff between retries.
    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// POST a chat request, retrying on 429 and 5xx with exponential backoff.
    async fn send(&self, request: &ChatRequest<'_>) -> Result<ChatResponse> {
        let attempts = self.config.max_retries.max(1);
        let mut last_error: Option<TailorError> = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = backoff_delay(self.backoff_base, attempt);
                warn!(
                    "Oracle call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut http_request = self.client.post(self.chat_completions_url());
            if let Some(key) = &self.api_key {
                http_request = http_request.header(header::AUTHORIZATION, format!("Bearer {}", key));
            }

            let response = match http_request.json(request).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(e.into());
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Oracle API returned {}: {}", status, body);
                last_error = Some(TailorError::OracleApi {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(TailorError::OracleApi {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let chat_response: ChatResponse = response.json().await?;
            if let Some(usage) = &chat_response.usage {
                debug!(
                    "Oracle call succeeded: prompt_tokens={}, completion_tokens={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }
            return Ok(chat_response);
        }

        Err(last_error.unwrap_or_else(|| TailorError::Oracle("no attempts were made".to_string())))
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    fn id(&self) -> &str {
        &self.config.suggestions.model
    }

    async fn generate(&self, task: OracleTask, payload: &Value) -> Result<Value> {
        let prompt = self.prompts.render(task, payload)?;
        let settings = self.config.task(task);

        let request = ChatRequest {
            model: &settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: settings.temperature,
            max_tokens: self.config.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        debug!("Sending {} request to {}", task, settings.model);
        let response = self.send(&request).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TailorError::contract(task.label(), "response has no content"))?;

        parse_json_reply(task, &content)
    }
}

/// Delay before retry `attempt` (1-based): `base * 2^(attempt - 1)`, with
/// the exponent capped at [`MAX_BACKOFF_DOUBLINGS`].
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let doublings = attempt.saturating_sub(1).min(MAX_BACKOFF_DOUBLINGS);
    base.saturating_mul(1u32 << doublings)
}

/// Parse the reply text of `task` as JSON, tolerating markdown fences.
pub fn parse_json_reply(task: OracleTask, text: &str) -> Result<Value> {
    serde_json::from_str(strip_json_fences(text))
        .map_err(|e| TailorError::contract(task.label(), format!("reply is not valid JSON: {}", e)))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let stripped = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));

    match stripped {
        Some(inner) => inner
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(inner.trim_start()),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_backoff_delay_is_capped() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(400));
        assert_eq!(backoff_delay(base, 7), Duration::from_millis(6400));
        assert_eq!(backoff_delay(base, 40), Duration::from_millis(6400));
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        assert_eq!(strip_json_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_reply_rejects_prose() {
        let err = parse_json_reply(OracleTask::ScoreMatch, "Sure! Here is the analysis.").unwrap_err();
        assert!(matches!(err, TailorError::OracleContract { ref task, .. } if task == "match_scoring"));
    }

    #[test]
    fn test_url_ignores_trailing_slash() {
        let mut config = Config::default().oracle;
        config.base_url = "http://localhost:11434/v1/".to_string();
        let oracle = HttpOracle::with_api_key(config, None).unwrap();
        assert_eq!(oracle.chat_completions_url(), "http://localhost:11434/v1/chat/completions");
        assert_eq!(oracle.id(), "gpt-4o-mini");
    }
}
