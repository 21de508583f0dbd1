//! Retrying LLM client.
//!
//! Wraps a provider with the shared rate limiter, transient-failure
//! retry with exponential backoff, and the count-verified segment
//! rewrite protocol.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{EngineError, Result};
use crate::limiter::RateLimiter;
use crate::prompt::{
    CLASSIFY_SYSTEM, REWRITE_SYSTEM, classify_prompt, correction_note, extract_strings,
    parse_should_rewrite, rewrite_prompt, wrap_segments,
};
use crate::providers::{CompletionRequest, Provider};

/// Tunables for one client.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Attempts per request for transient failures.
    pub attempts: u32,
    /// First backoff delay; doubles per attempt.
    pub base_delay: Duration,
    /// Attempts to coax the model into the right segment count.
    pub count_retries: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            attempts: 3,
            base_delay: Duration::from_millis(500),
            count_retries: 3,
        }
    }
}

pub struct LlmClient {
    http: reqwest::Client,
    provider: Arc<dyn Provider>,
    model: String,
    limiter: Arc<RateLimiter>,
    settings: ClientSettings,
}

impl LlmClient {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        limiter: Arc<RateLimiter>,
        settings: ClientSettings,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            http,
            provider,
            model: model.into(),
            limiter,
            settings,
        })
    }

    pub fn provider_id(&self) -> &str {
        self.provider.id()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One completion, retried with exponential backoff on transient
    /// failures. The rate-limiter permit is released before sleeping.
    async fn complete(&self, system: &str, prompt: String, text: String) -> Result<String> {
        let request = CompletionRequest {
            model: self.model.clone(),
            system: system.to_string(),
            prompt,
            text,
        };

        let attempts = self.settings.attempts.max(1);
        let mut delay = self.settings.base_delay;
        for attempt in 1..=attempts {
            let result = {
                let _permit = self.limiter.acquire().await;
                self.provider.complete(&self.http, &request).await
            };
            match result {
                Ok(reply) => return Ok(reply),
                Err(error) if attempt < attempts && is_transient(&error) => {
                    tracing::warn!(
                        provider = self.provider.id(),
                        attempt,
                        %error,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(error) => return Err(error),
            }
        }
        unreachable!("retry loop always returns")
    }

    /// Ask whether a batch is prose worth rewriting.
    pub async fn should_rewrite(&self, wrapped: &str) -> Result<bool> {
        let reply = self
            .complete(CLASSIFY_SYSTEM, classify_prompt(), wrapped.to_string())
            .await?;
        Ok(parse_should_rewrite(&reply))
    }

    /// Rewrite a batch of segments, verifying the model returns exactly
    /// one `<string>` per input. Wrong counts are re-asked with the
    /// previous reply attached as feedback.
    pub async fn rewrite_segments(&self, texts: &[String]) -> Result<Vec<String>> {
        let wrapped = wrap_segments(texts);
        let mut correction: Option<String> = None;
        let mut last_got = 0;

        for _ in 0..self.settings.count_retries.max(1) {
            let prompt = rewrite_prompt(texts.len(), correction.as_deref());
            let reply = self
                .complete(REWRITE_SYSTEM, prompt, wrapped.clone())
                .await?;
            let strings = extract_strings(&reply);

            if strings.len() == texts.len() {
                return Ok(strings);
            }

            tracing::warn!(
                provider = self.provider.id(),
                expected = texts.len(),
                got = strings.len(),
                "segment count mismatch, re-asking"
            );
            last_got = strings.len();
            let note = correction_note(&reply, texts.len(), strings.len());
            correction = Some(match correction {
                Some(previous) => format!("{previous}{note}"),
                None => note,
            });
        }

        Err(EngineError::CountMismatch {
            expected: texts.len(),
            got: last_got,
        })
    }
}

fn is_transient(error: &EngineError) -> bool {
    matches!(
        error,
        EngineError::Http(_) | EngineError::Provider { .. } | EngineError::BadResponse { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;

    fn client(provider: MockProvider) -> LlmClient {
        LlmClient::new(
            Arc::new(provider),
            "test-model",
            Arc::new(RateLimiter::new(1000, 8)),
            ClientSettings {
                base_delay: Duration::from_millis(1),
                ..ClientSettings::default()
            },
        )
        .unwrap()
    }

    fn wrapped(reply: &[&str]) -> String {
        reply
            .iter()
            .map(|t| format!("<string>{t}</string>"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn rewrite_returns_one_string_per_segment() {
        let provider = MockProvider::with_replies(vec![Ok(wrapped(&["new one", "new two"]))]);
        let client = client(provider);

        let texts = vec!["old one".to_string(), "old two".to_string()];
        let rewritten = client.rewrite_segments(&texts).await.unwrap();

        assert_eq!(rewritten, vec!["new one", "new two"]);
    }

    #[tokio::test]
    async fn transient_errors_are_retried() {
        let provider = MockProvider::with_replies(vec![
            Err(EngineError::Provider {
                provider: "mock".to_string(),
                message: "HTTP 429".to_string(),
            }),
            Ok(wrapped(&["recovered"])),
        ]);
        let client = client(provider);

        let rewritten = client
            .rewrite_segments(&["text".to_string()])
            .await
            .unwrap();
        assert_eq!(rewritten, vec!["recovered"]);
    }

    #[tokio::test]
    async fn missing_key_is_not_retried() {
        let provider = MockProvider::with_replies(vec![
            Err(EngineError::MissingApiKey {
                var: "OPENAI_API_KEY",
            }),
            Ok(wrapped(&["should not be reached"])),
        ]);
        let client = client(provider);

        let result = client.rewrite_segments(&["text".to_string()]).await;
        assert!(matches!(result, Err(EngineError::MissingApiKey { .. })));
    }

    #[tokio::test]
    async fn wrong_count_is_reasked_with_feedback() {
        let provider = Arc::new(MockProvider::with_replies(vec![
            Ok(wrapped(&["only one"])),
            Ok(wrapped(&["one", "two"])),
        ]));
        let client = LlmClient::new(
            provider.clone(),
            "test-model",
            Arc::new(RateLimiter::new(1000, 8)),
            ClientSettings::default(),
        )
        .unwrap();

        let texts = vec!["a.".to_string(), "b.".to_string()];
        let rewritten = client.rewrite_segments(&texts).await.unwrap();
        assert_eq!(rewritten, vec!["one", "two"]);

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(!requests[0].prompt.contains("<attempt>"));
        assert!(requests[1].prompt.contains("<attempt>"));
        assert!(requests[1].prompt.contains("only one"));
    }

    #[tokio::test]
    async fn persistent_wrong_count_surfaces_a_mismatch() {
        let provider = MockProvider::with_replies(vec![
            Ok(wrapped(&["one"])),
            Ok(wrapped(&["one"])),
            Ok(wrapped(&["one"])),
        ]);
        let client = client(provider);

        let texts = vec!["a.".to_string(), "b.".to_string()];
        let result = client.rewrite_segments(&texts).await;
        assert!(matches!(
            result,
            Err(EngineError::CountMismatch {
                expected: 2,
                got: 1
            })
        ));
    }

    #[tokio::test]
    async fn classification_parses_false() {
        let provider = MockProvider::with_replies(vec![Ok(
            "<should_rewrite>false</should_rewrite>".to_string()
        )]);
        let client = client(provider);

        let verdict = client
            .should_rewrite("<string>1801, 1802, 1803</string>")
            .await
            .unwrap();
        assert!(!verdict);
    }
}
