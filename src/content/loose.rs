//! Loose scan: runs of plausible natural-language characters, line by line.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ExtractionStrategy, StrategyOutput, Tier};
use crate::error::Result;

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").expect("valid line regex"));

static READABLE_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[A-Za-z0-9\s.,!?;:()\-'"]{4,}"#).expect("valid readable-run regex")
});

/// Keeps any line fragment that reads like prose, whatever object it sits in.
#[derive(Debug, Default, Clone, Copy)]
pub struct LooseStrategy;

impl LooseStrategy {
    pub fn scan(content: &str) -> String {
        let mut kept: Vec<&str> = Vec::new();

        for line in LINE_BREAKS.split(content) {
            for m in READABLE_RUN.find_iter(line) {
                let trimmed = m.as_str().trim();
                if trimmed.chars().count() > 3 {
                    kept.push(trimmed);
                }
            }
        }

        kept.join(" ")
    }
}

impl ExtractionStrategy for LooseStrategy {
    fn tier(&self) -> Tier {
        Tier::Loose
    }

    fn extract(&self, bytes: &[u8]) -> Result<StrategyOutput> {
        let content = String::from_utf8_lossy(bytes);
        Ok(StrategyOutput::text(Self::scan(&content)))
    }
}
