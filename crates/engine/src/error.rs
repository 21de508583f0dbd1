//! Error types for the rewrite engine.

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced while rewriting document text through an LLM provider.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The HTTP request itself failed (connect, timeout, decode).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The selected provider needs an API key that is not in the environment.
    #[error("Missing API key: set the {var} environment variable")]
    MissingApiKey { var: &'static str },

    /// The provider spec is neither a known id nor a usable endpoint URL.
    #[error("Unknown provider: '{spec}'")]
    UnknownProvider { spec: String },

    /// The provider answered with a non-success status.
    #[error("Provider '{provider}' returned an error: {message}")]
    Provider { provider: String, message: String },

    /// The provider answered 2xx but the body had no completion in it.
    #[error("Could not parse provider response: {message}")]
    BadResponse { message: String },

    /// The model kept returning the wrong number of rewritten segments.
    #[error("Rewrite returned {got} segments, expected {expected}")]
    CountMismatch { expected: usize, got: usize },

    /// Streaming HTML rewrite failed.
    #[error("Document rewrite failed: {message}")]
    Rewrite { message: String },
}

impl From<lol_html::errors::RewritingError> for EngineError {
    fn from(error: lol_html::errors::RewritingError) -> Self {
        EngineError::Rewrite {
            message: error.to_string(),
        }
    }
}
