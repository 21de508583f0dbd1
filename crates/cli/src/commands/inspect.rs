use std::path::PathBuf;

use eyre::{Context, Result};
use retold_engine::extract_segments;
use retold_epub::Epub;

pub async fn handle_inspect_command(input: PathBuf) -> Result<()> {
    let epub = Epub::open(&input)
        .wrap_err_with(|| format!("Failed to open EPUB: {}", input.display()))?;

    let metadata = epub.metadata();
    println!("📖 {}", metadata.title.as_deref().unwrap_or("(untitled)"));
    if !metadata.creators.is_empty() {
        println!("Authors: {}", metadata.creators.join(", "));
    }
    if let Some(language) = &metadata.language {
        println!("Language: {}", language);
    }
    if let Some(identifier) = &metadata.identifier {
        println!("Identifier: {}", identifier);
    }
    println!("Entries: {}", epub.entry_names().count());

    let documents = epub.documents()?;
    println!("\n📄 Spine documents ({}):", documents.len());

    let mut total_segments = 0usize;
    for document in &documents {
        let html = epub.read_document(&document.name)?;
        let segments = extract_segments(&html)?.len();
        total_segments += segments;

        let marker = if document.nav { " (nav)" } else { "" };
        println!("  {} - {} segments{}", document.name, segments, marker);
    }
    println!("\n📊 {} rewritable segments in total", total_segments);

    Ok(())
}
