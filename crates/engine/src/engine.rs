//! Document rewrite orchestration.
//!
//! Pipeline per document: extract segments → batch → (classify) →
//! rewrite → substitute. A batch that fails after retries and the
//! optional fallback provider either aborts the run (`strict`) or keeps
//! its original text; the document is never partially garbled.

use crate::batch::batch_segments;
use crate::client::LlmClient;
use crate::error::Result;
use crate::prompt::wrap_segments;
use crate::segment::{apply_replacements, extract_segments};
use crate::types::{DocumentReport, EngineOptions};

pub struct RewriteEngine {
    client: LlmClient,
    fallback: Option<LlmClient>,
    options: EngineOptions,
}

impl RewriteEngine {
    pub fn new(client: LlmClient, fallback: Option<LlmClient>, options: EngineOptions) -> Self {
        Self {
            client,
            fallback,
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Rewrite one XHTML content document, returning the new markup and
    /// the outcome counts.
    pub async fn rewrite_document(&self, html: &str) -> Result<(String, DocumentReport)> {
        let segments = extract_segments(html)?;
        let mut report = DocumentReport::new(segments.len());
        let mut replacements: Vec<Option<String>> = vec![None; segments.len()];

        for batch in batch_segments(segments, self.options.chunk_size) {
            let texts: Vec<String> = batch.iter().map(|s| s.text.clone()).collect();

            if self.options.classify && !self.batch_is_prose(&texts).await {
                report.segments_skipped += batch.len();
                continue;
            }

            match self.rewrite_batch(&texts).await {
                Ok(rewritten) => {
                    for (segment, text) in batch.iter().zip(rewritten) {
                        let decoded = html_escape::decode_html_entities(&text).into_owned();
                        replacements[segment.index] = Some(decoded);
                    }
                    report.segments_rewritten += batch.len();
                }
                Err(error) if self.options.strict => return Err(error),
                Err(error) => {
                    tracing::warn!(
                        %error,
                        segments = batch.len(),
                        "batch failed, keeping original text"
                    );
                    report.segments_failed += batch.len();
                }
            }
        }

        let html = apply_replacements(html, &replacements)?;
        Ok((html, report))
    }

    /// Classifier gate. An error here means we rewrite anyway rather
    /// than silently dropping content.
    async fn batch_is_prose(&self, texts: &[String]) -> bool {
        let wrapped = wrap_segments(texts);
        match self.client.should_rewrite(&wrapped).await {
            Ok(verdict) => verdict,
            Err(error) => {
                tracing::debug!(%error, "classification failed, rewriting anyway");
                true
            }
        }
    }

    async fn rewrite_batch(&self, texts: &[String]) -> Result<Vec<String>> {
        match self.client.rewrite_segments(texts).await {
            Ok(rewritten) => Ok(rewritten),
            Err(error) => match &self.fallback {
                Some(fallback) => {
                    tracing::warn!(
                        %error,
                        provider = fallback.provider_id(),
                        "primary provider failed, trying fallback"
                    );
                    fallback.rewrite_segments(texts).await
                }
                None => Err(error),
            },
        }
    }
}
