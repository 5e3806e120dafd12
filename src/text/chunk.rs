//! Sentence chunking for playback.

use std::ops::Index;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?]*[.!?]+").expect("valid chunk regex"));

/// Candidates at or below this many characters are dropped.
const MIN_CHUNK_CHARS: usize = 5;

/// Ordered, read-only list of sentence chunks.
///
/// Every chunk is longer than five characters, contains an ASCII letter and
/// ends in `.`, `!` or `?`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChunkSequence(Vec<String>);

impl ChunkSequence {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Chunks joined one per line.
    pub fn to_plain_text(&self) -> String {
        self.0.join("\n")
    }
}

impl Index<usize> for ChunkSequence {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a ChunkSequence {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Split `text` into sentence chunks.
///
/// ```rust
/// use readaloud::text::chunk;
///
/// let chunks = chunk("Hello world. This is a test! Is it working?");
/// assert_eq!(chunks.as_slice(), ["Hello world.", "This is a test!", "Is it working?"]);
/// ```
pub fn chunk(text: &str) -> ChunkSequence {
    let mut candidates: Vec<&str> = CANDIDATE.find_iter(text).map(|m| m.as_str()).collect();
    if candidates.is_empty() {
        candidates.push(text);
    }

    let chunks = candidates
        .into_iter()
        .map(str::trim)
        .filter(|c| {
            c.chars().count() > MIN_CHUNK_CHARS && c.chars().any(|ch| ch.is_ascii_alphabetic())
        })
        .map(|c| {
            if c.ends_with(['.', '!', '?']) {
                c.to_string()
            } else {
                format!("{c}.")
            }
        })
        .collect();

    ChunkSequence(chunks)
}
