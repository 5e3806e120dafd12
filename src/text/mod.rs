//! Text cleanup and sentence chunking.
//!
//! Extraction output is noisy: stream fragments, cross-reference tables,
//! base64 runs. [`sanitize`] reduces it to speakable prose and [`chunk`]
//! splits that prose into the sentence units the playback engine walks.

pub mod chunk;
pub mod sanitize;

pub use chunk::{chunk, ChunkSequence};
pub use sanitize::sanitize;

/// Characters that survive cleanup: ASCII letters and digits, space, and `.,!?;:()-'"`.
pub fn is_speakable(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, ' ' | '.' | ',' | '!' | '?' | ';' | ':' | '(' | ')' | '-' | '\'' | '"')
}
