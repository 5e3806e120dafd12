//! Raw byte scan, the always-available last resort.
//!
//! Walks every byte and keeps whatever is printable. Cannot fail.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ExtractionStrategy, StrategyOutput, Tier};
use crate::error::Result;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Width of the window decoded at each non-ASCII byte.
const DECODE_WINDOW: usize = 4;

#[derive(Debug, Default, Clone, Copy)]
pub struct RawStrategy;

impl RawStrategy {
    pub fn scan(bytes: &[u8]) -> String {
        let mut text = String::with_capacity(bytes.len() / 2);

        for (i, &byte) in bytes.iter().enumerate() {
            match byte {
                0x20..=0x7e | b'\n' | b'\r' => text.push(char::from(byte)),
                // collapse NUL padding
                0x00 if text.ends_with(' ') => {}
                0x7f..=0xff => {
                    if let Some(ch) = decode_window(&bytes[i..bytes.len().min(i + DECODE_WINDOW)]) {
                        text.push(ch);
                    }
                }
                _ => {}
            }
        }

        let stripped: String = text
            .chars()
            .map(|c| {
                if c.is_control() && !matches!(c, '\t' | '\n' | '\r') {
                    ' '
                } else {
                    c
                }
            })
            .collect();

        WHITESPACE.replace_all(&stripped, " ").trim().to_string()
    }
}

/// Strictly decode `window` as UTF-8; keep its first character when the
/// decoded text contains something alphanumeric or whitespace.
fn decode_window(window: &[u8]) -> Option<char> {
    let decoded = std::str::from_utf8(window).ok()?;
    if decoded
        .chars()
        .any(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
    {
        decoded.chars().next()
    } else {
        None
    }
}

impl ExtractionStrategy for RawStrategy {
    fn tier(&self) -> Tier {
        Tier::Raw
    }

    fn extract(&self, bytes: &[u8]) -> Result<StrategyOutput> {
        Ok(StrategyOutput::text(Self::scan(bytes)))
    }
}
