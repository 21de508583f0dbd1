//! OpenAI-style chat completions client.
//!
//! Also serves DeepSeek, Together, and any custom endpoint that speaks
//! the same wire format.

use async_trait::async_trait;
use serde_json::{Value, json};
use url::Url;

use super::{CompletionRequest, Provider, api_key};
use crate::error::{EngineError, Result};

pub struct OpenAiProvider {
    id: &'static str,
    endpoint: String,
    key_var: Option<&'static str>,
}

impl OpenAiProvider {
    pub fn openai() -> Self {
        Self {
            id: "openai",
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            key_var: Some("OPENAI_API_KEY"),
        }
    }

    pub fn deepseek() -> Self {
        Self {
            id: "deepseek",
            endpoint: "https://api.deepseek.com/chat/completions".to_string(),
            key_var: Some("DEEPSEEK_API_KEY"),
        }
    }

    pub fn together() -> Self {
        Self {
            id: "together",
            endpoint: "https://api.together.xyz/v1/chat/completions".to_string(),
            key_var: Some("TOGETHER_API_KEY"),
        }
    }

    /// A custom OpenAI-compatible endpoint (local server, proxy). No key
    /// is required; such servers usually run unauthenticated.
    pub fn compatible(endpoint: Url) -> Self {
        Self {
            id: "custom",
            endpoint: endpoint.to_string(),
            key_var: None,
        }
    }

    fn payload(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system },
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

#[async_trait]
impl Provider for OpenAiProvider {
    fn id(&self) -> &str {
        self.id
    }

    fn key_var(&self) -> Option<&'static str> {
        self.key_var
    }

    async fn complete(
        &self,
        http: &reqwest::Client,
        request: &CompletionRequest,
    ) -> Result<String> {
        let mut builder = http.post(&self.endpoint).json(&self.payload(request));
        if let Some(var) = self.key_var {
            builder = builder.bearer_auth(api_key(var)?);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Provider {
                provider: self.id.to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let body: Value = response.json().await?;
        parse_content(&body)
    }
}

fn parse_content(body: &Value) -> Result<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| EngineError::BadResponse {
            message: format!("no choices in reply: {body}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o-mini".to_string(),
            system: "sys".to_string(),
            prompt: "rewrite".to_string(),
            text: "<string>hark</string>".to_string(),
        }
    }

    #[test]
    fn payload_has_model_and_both_text_parts() {
        let payload = OpenAiProvider::openai().payload(&request());

        assert_eq!(payload["model"], "gpt-4o-mini");
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(
            payload["messages"][1]["content"][0]["text"],
            "<string>hark</string>"
        );
        assert_eq!(payload["messages"][1]["content"][1]["text"], "rewrite");
    }

    #[test]
    fn parse_content_reads_the_first_choice() {
        let body = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "listen" } }
            ]
        });
        assert_eq!(parse_content(&body).unwrap(), "listen");
    }

    #[test]
    fn parse_content_rejects_empty_replies() {
        let body = json!({ "error": { "message": "overloaded" } });
        assert!(matches!(
            parse_content(&body),
            Err(EngineError::BadResponse { .. })
        ));
    }

    #[test]
    fn custom_endpoint_needs_no_key() {
        let url = Url::parse("http://localhost:8080/v1/chat/completions").unwrap();
        let provider = OpenAiProvider::compatible(url);
        assert!(provider.is_configured());
        assert_eq!(provider.id(), "custom");
    }
}
