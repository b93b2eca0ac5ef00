use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::{AiClient, AiError};

/// OpenAI-compatible chat-completions client (OpenRouter by default).
pub struct OpenRouterClient {
    base_url: String,
    model: String,
    api_key: Zeroizing<String>,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenRouterClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Zeroizing<String>,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AiError::Connection(format!("HTTP client init failed: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Request body for /chat/completions
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response body from /chat/completions
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn first_content(parsed: ChatResponse) -> Result<String, AiError> {
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(AiError::EmptyResponse)
}

#[async_trait]
impl AiClient for OpenRouterClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AiError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_prompt },
            ],
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    AiError::Connection(self.base_url.clone())
                } else {
                    AiError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::ResponseParsing(e.to_string()))?;

        first_content(parsed)
    }
}
