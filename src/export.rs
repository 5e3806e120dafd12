//! Plain-text export of extracted text.

use std::path::Path;

use tracing::info;

use crate::error::Result;

const FALLBACK_FILE_NAME: &str = "extracted_text.txt";

/// `report.pdf` becomes `report_text.txt`; no name gives `extracted_text.txt`.
pub fn plain_text_file_name(source_name: Option<&str>) -> String {
    let stem = source_name
        .map(|name| Path::new(name.trim()))
        .and_then(Path::file_stem)
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty());

    match stem {
        Some(stem) => format!("{stem}_text.txt"),
        None => FALLBACK_FILE_NAME.to_string(),
    }
}

/// Write `text` to `path` as UTF-8.
pub fn write_plain_text(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text)?;
    info!(path = %path.display(), bytes = text.len(), "exported text");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_from_source() {
        assert_eq!(plain_text_file_name(Some("report.pdf")), "report_text.txt");
        assert_eq!(
            plain_text_file_name(Some("/tmp/papers/My Paper.PDF")),
            "My Paper_text.txt"
        );
        assert_eq!(plain_text_file_name(Some("notes")), "notes_text.txt");
        // only the last extension is dropped
        assert_eq!(plain_text_file_name(Some("a.b.pdf")), "a.b_text.txt");
        assert_ne!(plain_text_file_name(Some("report.pdf")), "report.pdf_text.txt");
    }

    #[test]
    fn file_name_fallback() {
        assert_eq!(plain_text_file_name(None), "extracted_text.txt");
        assert_eq!(plain_text_file_name(Some("  ")), "extracted_text.txt");
    }

    #[test]
    fn writes_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(plain_text_file_name(Some("doc.pdf")));
        write_plain_text(&path, "Hello world.\nSecond line.").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Hello world.\nSecond line."
        );
    }

    #[test]
    fn write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        assert!(write_plain_text(&path, "text").is_err());
    }
}
