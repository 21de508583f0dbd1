use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use eyre::{Context, Result};
use retold_engine::{
    BookReport, ClientSettings, EngineOptions, LlmClient, Provider, RateLimiter, RewriteEngine,
    default_registry, extract_segments,
};
use retold_epub::Epub;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::utils::default_output_path;

#[allow(clippy::too_many_arguments)]
pub async fn handle_rewrite_command(
    input: PathBuf,
    output: Option<PathBuf>,
    provider: Option<String>,
    model: Option<String>,
    fallback_provider: Option<String>,
    fallback_model: Option<String>,
    strict: bool,
    no_classify: bool,
    include_nav: bool,
    config: &Config,
    dry_run: bool,
) -> Result<()> {
    let output = output.unwrap_or_else(|| default_output_path(&input));
    let provider_spec = provider.unwrap_or_else(|| config.rewrite.provider.clone());
    let model = model.unwrap_or_else(|| config.rewrite.model.clone());

    let mut epub = Epub::open(&input)
        .wrap_err_with(|| format!("Failed to open EPUB: {}", input.display()))?;

    let documents: Vec<_> = epub
        .documents()?
        .into_iter()
        .filter(|d| include_nav || !d.nav)
        .collect();

    // Read everything up front so a malformed document fails the run
    // before the first API call.
    let mut contents = Vec::with_capacity(documents.len());
    let mut total_segments = 0usize;
    for document in &documents {
        let html = epub.read_document(&document.name)?;
        let segments = extract_segments(&html)?.len();
        total_segments += segments;
        contents.push((document.name.clone(), html, segments));
    }

    println!(
        "📖 {}",
        epub.metadata().title.as_deref().unwrap_or("(untitled)")
    );
    println!("  Documents: {}", contents.len());
    println!("  Segments: {}", total_segments);

    if dry_run {
        println!("Would rewrite with {} ({})", provider_spec, model);
        for (name, _, segments) in &contents {
            println!("  {} ({} segments)", name, segments);
        }
        println!("Would write to: {}", output.display());
        return Ok(());
    }

    let registry = default_registry();
    let provider = registry.resolve(&provider_spec)?;
    if !provider.is_configured() {
        let var = provider.key_var().unwrap_or("the provider's API key");
        eyre::bail!(
            "Provider '{}' is not configured. Set the {} environment variable \
             (a .env file next to the project works too).",
            provider.id(),
            var
        );
    }

    let limiter = Arc::new(RateLimiter::new(
        config.limits.calls_per_minute,
        config.limits.max_parallel,
    ));
    let settings = ClientSettings {
        timeout: Duration::from_secs(config.limits.request_timeout_secs),
        attempts: config.limits.retries,
        ..ClientSettings::default()
    };

    let client = LlmClient::new(provider, model.clone(), limiter.clone(), settings.clone())?;

    let fallback_spec = fallback_provider.or_else(|| config.rewrite.fallback_provider.clone());
    let fallback = match fallback_spec {
        Some(spec) => {
            let provider = registry.resolve(&spec)?;
            if !provider.is_configured() {
                let var = provider.key_var().unwrap_or("the provider's API key");
                eyre::bail!(
                    "Fallback provider '{}' is not configured. Set the {} environment variable.",
                    provider.id(),
                    var
                );
            }
            let fallback_model = fallback_model
                .or_else(|| config.rewrite.fallback_model.clone())
                .unwrap_or_else(|| model.clone());
            Some(LlmClient::new(provider, fallback_model, limiter, settings)?)
        }
        None => None,
    };

    let options = EngineOptions {
        chunk_size: config.rewrite.chunk_size,
        classify: config.rewrite.classify && !no_classify,
        strict,
    };
    tracing::debug!(?options, "engine options");
    let engine = Arc::new(RewriteEngine::new(client, fallback, options));

    println!("✍️  Rewriting with {} ({})...", provider_spec, model);
    let start_time = Utc::now();

    let mut tasks = JoinSet::new();
    for (index, (name, html, _)) in contents.iter().enumerate() {
        let engine = engine.clone();
        let name = name.clone();
        let html = html.clone();
        tasks.spawn(async move {
            let result = engine.rewrite_document(&html).await;
            (index, name, result)
        });
    }

    let mut rewritten: Vec<Option<String>> = vec![None; contents.len()];
    let mut report = BookReport::new();
    let mut done = 0usize;

    while let Some(joined) = tasks.join_next().await {
        let (index, name, result) = joined.wrap_err("Rewrite task panicked")?;
        match result {
            Ok((html, doc_report)) => {
                done += 1;
                println!(
                    "  ✅ [{}/{}] {} ({}/{} segments rewritten)",
                    done,
                    contents.len(),
                    name,
                    doc_report.segments_rewritten,
                    doc_report.segments_total
                );
                if doc_report.segments_failed > 0 {
                    println!(
                        "     ⚠️ {} segments kept their original text",
                        doc_report.segments_failed
                    );
                }
                report.add(&doc_report);
                rewritten[index] = Some(html);
            }
            Err(e) => {
                tasks.abort_all();
                return Err(e).wrap_err_with(|| format!("Failed to rewrite {}", name));
            }
        }
    }
    report.duration = Utc::now().signed_duration_since(start_time);

    for ((name, _, _), html) in contents.iter().zip(rewritten) {
        let html = html.ok_or_else(|| eyre::eyre!("Missing rewrite result for {}", name))?;
        epub.replace_document(name, html)?;
    }
    epub.write_to(&output)
        .wrap_err_with(|| format!("Failed to write EPUB: {}", output.display()))?;

    println!("\n📊 Rewrite complete:");
    println!("  📄 Documents: {}", report.documents);
    println!(
        "  ✅ Rewritten: {}/{} segments",
        report.segments_rewritten, report.segments_total
    );
    if report.segments_skipped > 0 {
        println!("  ⏭️ Skipped (not prose): {}", report.segments_skipped);
    }
    if report.segments_failed > 0 {
        println!("  ⚠️ Kept original: {}", report.segments_failed);
    }
    println!("  ⏱️ Time: {}s", report.duration.num_seconds());
    println!("✅ Written to: {}", output.display());

    Ok(())
}
