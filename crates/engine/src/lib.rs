//! Rewrite engine for the retold project.
//!
//! This crate turns archaic prose into modern English one document at a
//! time: it walks paragraph text nodes, batches them at sentence
//! boundaries, drives a provider-agnostic LLM client with rate limiting
//! and retry, and splices the replies back into the markup.

pub mod batch;
pub mod client;
pub mod engine;
pub mod error;
pub mod limiter;
pub mod prompt;
pub mod providers;
pub mod segment;
pub mod types;

pub use client::{ClientSettings, LlmClient};
pub use engine::RewriteEngine;
pub use error::{EngineError, Result};
pub use limiter::RateLimiter;
pub use providers::{CompletionRequest, Provider, ProviderRegistry, default_registry};
pub use segment::{Segment, extract_segments};
pub use types::{BookReport, DocumentReport, EngineOptions};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
