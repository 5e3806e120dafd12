//! Pattern scan: literal strings inside `BT ... ET` text objects.
//!
//! No content-stream grammar is applied. `BT`/`ET` are treated as opaque
//! delimiters and every parenthesised literal between them is a candidate.
//! Compressed streams yield nothing here, which is what the cascade expects.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ExtractionStrategy, StrategyOutput, Tier};
use crate::error::Result;

static TEXT_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\bBT\s+(.*?)\bET\b").expect("valid text object regex"));

/// Extracts parenthesised literals from text objects.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternStrategy;

impl PatternStrategy {
    /// Scan `content` and join accepted literals with single spaces.
    pub fn scan(content: &str) -> String {
        let mut accepted: Vec<String> = Vec::new();

        for caps in TEXT_OBJECT.captures_iter(content) {
            let Some(body) = caps.get(1) else { continue };
            for literal in literals(body.as_str()) {
                let text = unescape(literal);
                if text.chars().count() > 2 && text.chars().any(|c| c.is_ascii_alphabetic()) {
                    accepted.push(text);
                }
            }
        }

        accepted.join(" ").trim().to_string()
    }
}

impl ExtractionStrategy for PatternStrategy {
    fn tier(&self) -> Tier {
        Tier::Pattern
    }

    fn extract(&self, bytes: &[u8]) -> Result<StrategyOutput> {
        let content = String::from_utf8_lossy(bytes);
        Ok(StrategyOutput::text(Self::scan(&content)))
    }
}

/// Parenthesised literal bodies in `body`, honouring nesting and backslash escapes.
fn literals(body: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut escaped = false;

    for (idx, ch) in body.char_indices() {
        if depth == 0 {
            if ch == '(' {
                depth = 1;
                start = idx + 1;
            }
            continue;
        }

        if escaped {
            escaped = false;
            continue;
        }

        match ch {
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    found.push(&body[start..idx]);
                }
            }
            _ => {}
        }
    }

    found
}

/// Resolve `\n`, `\r`, `\t`, `\\` and generic `\X` escapes.
fn unescape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}
