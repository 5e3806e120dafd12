use std::path::Path;

use anyhow::Result;

use readaloud::content::ExtractionMethod;
use readaloud::export::write_plain_text;

use super::load_and_extract;

pub fn cmd_extract(
    path: &Path,
    method: ExtractionMethod,
    json: bool,
    output: Option<&Path>,
) -> Result<()> {
    let (doc, result) = load_and_extract(path, method)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        result.into_result()?;
        return Ok(());
    }

    let result = result.into_result()?;
    eprintln!(
        "📄 {}: {} ({}) via {} in {:.1}ms, {} chunks",
        doc.meta().name,
        result.quality,
        result.quality.label(),
        result.tier.map_or_else(|| "-".to_string(), |t| t.to_string()),
        result.elapsed_ms,
        result.chunks.len()
    );
    if let Some(pages) = result.page_count {
        eprintln!("   Pages: {pages}");
    }

    match output {
        Some(path) => {
            write_plain_text(path, &result.text)?;
            eprintln!("💾 Saved {} bytes to {}", result.text.len(), path.display());
        }
        None => println!("{}", result.text),
    }

    Ok(())
}

pub fn cmd_chunks(path: &Path, method: ExtractionMethod) -> Result<()> {
    let (_, result) = load_and_extract(path, method)?;
    let result = result.into_result()?;

    for (i, chunk) in result.chunks.iter().enumerate() {
        println!("{:>4}. {chunk}", i + 1);
    }
    eprintln!("({} chunks, quality: {})", result.chunks.len(), result.quality);

    Ok(())
}
