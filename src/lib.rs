//! `readaloud` - PDF text extraction and sentence-by-sentence playback
//!
//! # Features
//!
//! - **Cascading extraction**: page-model decoding, `BT ... ET` literal scans,
//!   loose natural-language scans and a printable-byte fallback, graded by tier
//! - **Speakable text**: sanitisation of PDF syntax noise and sentence chunking
//! - **Playback**: a chunk-addressable state machine driving a system speech
//!   synthesizer with play, pause, stop, skip and seek
//! - **Summaries**: cancellable consumption of streamed chat-completion tokens
//!
//! # Example
//!
//! ```rust
//! use readaloud::{ExtractionMethod, ExtractionOrchestrator, QualityGrade};
//!
//! let pdf = b"%PDF-1.4\nstream\nBT (The first sentence is here.) Tj (And then a second one.) Tj ET\nendstream";
//! let result = ExtractionOrchestrator::new().extract(pdf, ExtractionMethod::Auto);
//! assert_eq!(result.quality, QualityGrade::Fair);
//! assert_eq!(result.chunks.len(), 2);
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod export;
pub mod playback;
pub mod summary;
pub mod text;

pub use config::ReaderConfig;
pub use content::{
    ExtractionMethod, ExtractionOrchestrator, ExtractionResult, QualityGrade, RawDocument,
    StrategyHint, Tier,
};
pub use error::{ReaderError, Result};
pub use playback::{
    CommandSpeechBackend, PlaybackDriver, PlaybackEngine, PlaybackSnapshot, PlaybackState,
    SpeechBackend, SpeechParams,
};
pub use summary::{consume_stream, summarize, SummaryRequest, TokenSource};
pub use text::{chunk, sanitize, ChunkSequence};

/// Version of readaloud
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
