pub mod extract;
pub mod read;

use std::path::Path;

use anyhow::{Context, Result};

use readaloud::content::{ExtractionMethod, ExtractionOrchestrator, ExtractionResult, RawDocument};

/// Read `path` and run the extraction pipeline on it.
pub fn load_and_extract(
    path: &Path,
    method: ExtractionMethod,
) -> Result<(RawDocument, ExtractionResult)> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    );

    let doc = RawDocument::open(name, None, bytes, method)?;
    let result = ExtractionOrchestrator::new().extract_document(&doc);
    Ok((doc, result))
}
