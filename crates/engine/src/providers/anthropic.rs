//! Anthropic messages API client.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{CompletionRequest, Provider, api_key};
use crate::error::{EngineError, Result};

const ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

pub struct AnthropicProvider;

impl AnthropicProvider {
    pub fn new() -> Self {
        Self
    }

    fn payload(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": request.model,
            "max_tokens": MAX_TOKENS,
            "system": request.system,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": request.text },
                        { "type": "text", "text": request.prompt },
                    ],
                },
            ],
        })
    }
}

impl Default for AnthropicProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn id(&self) -> &str {
        "anthropic"
    }

    fn key_var(&self) -> Option<&'static str> {
        Some("ANTHROPIC_API_KEY")
    }

    async fn complete(
        &self,
        http: &reqwest::Client,
        request: &CompletionRequest,
    ) -> Result<String> {
        let response = http
            .post(ENDPOINT)
            .header("x-api-key", api_key("ANTHROPIC_API_KEY")?)
            .header("anthropic-version", API_VERSION)
            .json(&self.payload(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Provider {
                provider: "anthropic".to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let body: Value = response.json().await?;
        parse_content(&body)
    }
}

fn parse_content(body: &Value) -> Result<String> {
    body["content"][0]["text"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| EngineError::BadResponse {
            message: format!("no content in reply: {body}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_system_and_max_tokens() {
        let request = CompletionRequest {
            model: "claude-sonnet".to_string(),
            system: "sys".to_string(),
            prompt: "rewrite".to_string(),
            text: "<string>thee</string>".to_string(),
        };
        let payload = AnthropicProvider::new().payload(&request);

        assert_eq!(payload["system"], "sys");
        assert_eq!(payload["max_tokens"], MAX_TOKENS);
        assert_eq!(payload["messages"][0]["content"][0]["text"], "<string>thee</string>");
    }

    #[test]
    fn parse_content_reads_the_first_block() {
        let body = json!({
            "content": [ { "type": "text", "text": "you" } ]
        });
        assert_eq!(parse_content(&body).unwrap(), "you");
    }

    #[test]
    fn parse_content_rejects_error_bodies() {
        let body = json!({ "type": "error", "error": { "message": "rate limited" } });
        assert!(matches!(
            parse_content(&body),
            Err(EngineError::BadResponse { .. })
        ));
    }
}
