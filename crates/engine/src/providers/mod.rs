//! LLM provider clients.
//!
//! Each vendor gets a [`Provider`] implementation; the registry maps
//! provider ids to clients and resolves custom OpenAI-compatible
//! endpoints given as URLs.

mod anthropic;
mod gemini;
mod openai;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::error::{EngineError, Result};

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// One completion request, provider-agnostic.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model name, passed through verbatim.
    pub model: String,
    /// System instruction.
    pub system: String,
    /// Task instruction.
    pub prompt: String,
    /// The wrapped segment text the instruction applies to.
    pub text: String,
}

/// A single LLM vendor client.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable identifier ("openai", "anthropic", ...).
    fn id(&self) -> &str;

    /// Environment variable holding the API key, if the provider needs one.
    fn key_var(&self) -> Option<&'static str>;

    /// Whether the required API key is present in the environment.
    fn is_configured(&self) -> bool {
        match self.key_var() {
            Some(var) => std::env::var(var).map(|v| !v.is_empty()).unwrap_or(false),
            None => true,
        }
    }

    /// Send one completion request and return the reply text.
    async fn complete(&self, http: &reqwest::Client, request: &CompletionRequest)
    -> Result<String>;
}

/// Read a provider's API key from the environment.
pub(crate) fn api_key(var: &'static str) -> Result<String> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(EngineError::MissingApiKey { var })
}

/// Registry of known providers, keyed by id.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider under its id.
    pub fn register<P: Provider + 'static>(&mut self, provider: P) {
        self.providers
            .insert(provider.id().to_string(), Arc::new(provider));
    }

    /// Look up a provider by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(id).cloned()
    }

    /// Known provider ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.providers.keys().map(|k| k.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Resolve a provider spec: a registered id, or an `http(s)` URL
    /// treated as an OpenAI-compatible chat completions endpoint.
    pub fn resolve(&self, spec: &str) -> Result<Arc<dyn Provider>> {
        if let Some(provider) = self.get(spec) {
            return Ok(provider);
        }
        if spec.starts_with("http://") || spec.starts_with("https://") {
            let url = Url::parse(spec).map_err(|_| EngineError::UnknownProvider {
                spec: spec.to_string(),
            })?;
            return Ok(Arc::new(OpenAiProvider::compatible(url)));
        }
        Err(EngineError::UnknownProvider {
            spec: spec.to_string(),
        })
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry with every built-in provider registered.
pub fn default_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(OpenAiProvider::openai());
    registry.register(OpenAiProvider::deepseek());
    registry.register(OpenAiProvider::together());
    registry.register(AnthropicProvider::new());
    registry.register(GeminiProvider::new());
    registry
}

/// Scripted provider for tests.
#[cfg(test)]
pub(crate) struct MockProvider {
    pub replies: std::sync::Mutex<Vec<Result<String>>>,
    pub requests: std::sync::Mutex<Vec<CompletionRequest>>,
}

#[cfg(test)]
impl MockProvider {
    pub fn with_replies(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Provider for MockProvider {
    fn id(&self) -> &str {
        "mock"
    }

    fn key_var(&self) -> Option<&'static str> {
        None
    }

    async fn complete(
        &self,
        _http: &reqwest::Client,
        request: &CompletionRequest,
    ) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(EngineError::BadResponse {
                message: "mock provider ran out of replies".to_string(),
            });
        }
        replies.remove(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_knows_all_vendors() {
        let registry = default_registry();
        assert_eq!(
            registry.ids(),
            vec!["anthropic", "deepseek", "gemini", "openai", "together"]
        );
    }

    #[test]
    fn resolve_accepts_registered_ids() {
        let registry = default_registry();
        assert_eq!(registry.resolve("anthropic").unwrap().id(), "anthropic");
    }

    #[test]
    fn resolve_accepts_custom_endpoints() {
        let registry = default_registry();
        let provider = registry.resolve("http://localhost:11434/v1/chat/completions");
        assert_eq!(provider.unwrap().id(), "custom");
    }

    #[test]
    fn resolve_rejects_unknown_specs() {
        let registry = default_registry();
        let result = registry.resolve("clippy");
        assert!(matches!(result, Err(EngineError::UnknownProvider { .. })));
    }
}
