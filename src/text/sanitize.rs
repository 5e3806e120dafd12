//! Strip PDF syntax residue from extracted text.

use once_cell::sync::Lazy;
use regex::Regex;

use super::is_speakable;

/// Noise patterns, applied in order.
static NOISE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // numeric operands and encoded fragments: "1.4", "#2F", "+Ab3="
        r#"[#0-9+][A-Za-z0-9+/=_:;,(){}\[\]!"'?.\-]+\s*"#,
        r"stream.*?endstream",
        r"obj.*?endobj",
        r"(?s)xref.*?trailer",
        r"\b[A-Za-z0-9+/=]{20,}\b",
        r"\b[0-9]{10,}\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid noise regex"))
    .collect()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static SENTENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Z][^.!?]*[.!?]").expect("valid sentence regex")
});

/// Reduce extracted text to speakable prose.
///
/// Noise removal and character filtering repeat until the text stops
/// changing, then the text is re-assembled from its capitalised sentences.
/// When no sentence is found the filtered text is returned as-is.
///
/// Text after the last sentence terminator is dropped whenever at least one
/// sentence exists.
///
/// ```rust
/// use readaloud::text::sanitize;
///
/// let clean = sanitize("xref 1 2 3 trailer Hello World stream abc endstream");
/// assert_eq!(clean, "Hello World");
/// assert_eq!(sanitize(&clean), clean);
/// ```
pub fn sanitize(text: &str) -> String {
    let mut current = filter_pass(text);
    loop {
        let next = filter_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }

    let sentences: Vec<&str> = SENTENCE.find_iter(&current).map(|m| m.as_str()).collect();
    if sentences.is_empty() {
        current
    } else {
        sentences.join(" ")
    }
}

fn filter_pass(text: &str) -> String {
    let mut out = text.to_string();
    for pattern in NOISE.iter() {
        out = pattern.replace_all(&out, "").into_owned();
    }

    let speakable: String = out.chars().map(|c| if is_speakable(c) { c } else { ' ' }).collect();
    WHITESPACE.replace_all(&speakable, " ").trim().to_string()
}
