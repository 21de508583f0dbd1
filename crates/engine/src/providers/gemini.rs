//! Google Gemini generateContent client.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{CompletionRequest, Provider, api_key};
use crate::error::{EngineError, Result};

const BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiProvider;

impl GeminiProvider {
    pub fn new() -> Self {
        Self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{BASE}/{model}:generateContent")
    }

    fn payload(&self, request: &CompletionRequest) -> Value {
        json!({
            "systemInstruction": {
                "parts": [ { "text": request.system } ],
            },
            "contents": [
                {
                    "parts": [
                        { "text": request.prompt },
                        { "text": format!("<input>{}</input>", request.text) },
                    ],
                },
            ],
        })
    }
}

impl Default for GeminiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn id(&self) -> &str {
        "gemini"
    }

    fn key_var(&self) -> Option<&'static str> {
        Some("GEMINI_API_KEY")
    }

    async fn complete(
        &self,
        http: &reqwest::Client,
        request: &CompletionRequest,
    ) -> Result<String> {
        let response = http
            .post(self.endpoint(&request.model))
            .query(&[("key", api_key("GEMINI_API_KEY")?)])
            .json(&self.payload(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Provider {
                provider: "gemini".to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }

        let body: Value = response.json().await?;
        parse_content(&body)
    }
}

fn parse_content(body: &Value) -> Result<String> {
    body["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| EngineError::BadResponse {
            message: format!("no candidates in reply: {body}"),
        })
}
