//! Error taxonomy for extraction, playback and streaming.
//!
//! Strategy-level failures never escape the orchestrator: they are logged and
//! the cascade moves on. Everything else is surfaced to the caller as a
//! [`ReaderError`].

use thiserror::Error;

use crate::content::Tier;

/// Errors surfaced by the reader pipeline.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// The selected file is not a PDF. Rejected before any extraction.
    #[error("Unsupported input: {0} is not a PDF file")]
    UnsupportedInput(String),

    /// Every strategy together produced fewer than the minimum viable characters.
    #[error("Insufficient text extracted: {0}")]
    ExtractionInsufficientText(String),

    /// A single extraction tier failed. Absorbed by the orchestrator.
    #[error("{tier} extraction failed: {reason}")]
    StrategyInternalFailure { tier: Tier, reason: String },

    /// No speech engine is available in this environment.
    #[error("Text-to-speech is not supported: {0}")]
    PlaybackUnsupported(String),

    /// The speech engine reported a failure mid-utterance.
    #[error("Speech engine error: {0}")]
    PlaybackCollaboratorError(String),

    #[error("Nothing to play: load a document with readable text first")]
    NothingToPlay,

    /// The caller cancelled an in-flight streaming operation.
    #[error("Stream cancelled")]
    StreamCancelled,

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Playback driver has shut down")]
    DriverClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReaderError {
    /// `true` for caller-initiated cancellation, which UIs should not show as a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::StreamCancelled)
    }
}

pub type Result<T> = std::result::Result<T, ReaderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_distinct_from_failures() {
        assert!(ReaderError::StreamCancelled.is_cancellation());
        assert!(!ReaderError::Stream("reset by peer".into()).is_cancellation());
        assert!(!ReaderError::PlaybackCollaboratorError("boom".into()).is_cancellation());
    }

    #[test]
    fn strategy_failure_names_the_tier() {
        let err = ReaderError::StrategyInternalFailure {
            tier: Tier::Structured,
            reason: "bad xref".into(),
        };
        assert_eq!(err.to_string(), "structured extraction failed: bad xref");
    }

    #[test]
    fn io_errors_convert() {
        fn open_missing() -> Result<Vec<u8>> {
            Ok(std::fs::read("/nonexistent/readaloud/input.pdf")?)
        }
        let err = open_missing().unwrap_err();
        assert!(matches!(err, ReaderError::Io(_)));
        assert!(err.to_string().starts_with("IO error: "));
    }
}
