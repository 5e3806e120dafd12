//! Cascading PDF text extraction.
//!
//! Raw document bytes are routed through up to four independent
//! [`ExtractionStrategy`] tiers, ranked by how much document structure they
//! understand. The [`ExtractionOrchestrator`] owns the fallback policy and
//! grades the result by the tier that produced it.
//!
//! # Tiers
//!
//! | Tier | Strategy | Grade |
//! |------|----------|-------|
//! | structured | [`StructuredStrategy`] (page model + reading order) | `good` |
//! | pattern | [`PatternStrategy`] (`BT ... ET` literals) | `fair` |
//! | loose | [`LooseStrategy`] (natural-language runs) | `basic` |
//! | raw | [`RawStrategy`] (printable bytes) | `raw` |
//!
//! # Example
//!
//! ```rust
//! use readaloud::content::{ExtractionMethod, ExtractionOrchestrator, QualityGrade};
//!
//! let orchestrator = ExtractionOrchestrator::new();
//! let bytes = b"%PDF-1.4\nBT (Hello there, reader.) Tj (This line is readable.) Tj ET";
//! let result = orchestrator.extract(bytes, ExtractionMethod::Pattern);
//! assert_eq!(result.quality, QualityGrade::Fair);
//! assert!(result.text.contains("Hello there, reader."));
//! ```

pub mod loose;
pub mod orchestrator;
pub mod pattern;
pub mod raw;
pub mod sampler;
pub mod structured;
pub mod types;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ReaderError, Result};
use crate::text::ChunkSequence;

pub use loose::LooseStrategy;
pub use orchestrator::{ExtractionOrchestrator, MIN_VIABLE_TEXT_LEN};
pub use pattern::PatternStrategy;
pub use raw::RawStrategy;
pub use sampler::{sample_hint, StrategyHint};
pub use structured::{LopdfDecoder, PageDecoder, PageSource, StructuredStrategy};
pub use types::PositionedGlyphRun;

/// One of the four extraction algorithms, in descending order of reliability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Structured,
    Pattern,
    Loose,
    Raw,
}

impl Tier {
    /// All tiers in cascade order.
    pub const CASCADE: [Tier; 4] = [Tier::Structured, Tier::Pattern, Tier::Loose, Tier::Raw];

    /// Grade awarded when this tier produces the accepted text.
    pub fn grade(self) -> QualityGrade {
        match self {
            Self::Structured => QualityGrade::Good,
            Self::Pattern => QualityGrade::Fair,
            Self::Loose => QualityGrade::Basic,
            Self::Raw => QualityGrade::Raw,
        }
    }

    /// Tiers from `self` down to (and including) the raw tier.
    pub fn descending(self) -> impl Iterator<Item = Tier> {
        Self::CASCADE.into_iter().filter(move |t| *t >= self)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Structured => "structured",
            Self::Pattern => "pattern",
            Self::Loose => "loose",
            Self::Raw => "raw",
        })
    }
}

/// Extraction method requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Pick the starting tier from a byte sample, then cascade.
    #[default]
    Auto,
    Structured,
    Pattern,
    Loose,
    Raw,
}

impl ExtractionMethod {
    /// The single tier forced by this method, or `None` for [`ExtractionMethod::Auto`].
    pub fn forced_tier(self) -> Option<Tier> {
        match self {
            Self::Auto => None,
            Self::Structured => Some(Tier::Structured),
            Self::Pattern => Some(Tier::Pattern),
            Self::Loose => Some(Tier::Loose),
            Self::Raw => Some(Tier::Raw),
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.forced_tier() {
            Some(tier) => tier.fmt(f),
            None => f.write_str("auto"),
        }
    }
}

impl FromStr for ExtractionMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "structured" => Ok(Self::Structured),
            "pattern" => Ok(Self::Pattern),
            "loose" => Ok(Self::Loose),
            "raw" => Ok(Self::Raw),
            other => Err(format!(
                "unknown extraction method '{other}' (expected auto, structured, pattern, loose or raw)"
            )),
        }
    }
}

/// Quality grade attached to an extraction result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityGrade {
    Good,
    Fair,
    Basic,
    Raw,
    Failed,
}

impl QualityGrade {
    /// Human-readable label shown next to the grade.
    pub fn label(self) -> &'static str {
        match self {
            Self::Good => "Excellent extraction with proper formatting",
            Self::Fair => "Good extraction with minor formatting issues",
            Self::Basic => "Readable text recovered with basic cleanup",
            Self::Raw => "Text recovered but may need manual review",
            Self::Failed => "Extraction failed",
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Basic => "basic",
            Self::Raw => "raw",
            Self::Failed => "failed",
        })
    }
}

/// Metadata about the selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
    /// Declared MIME type, if the source provided one.
    pub content_type: Option<String>,
}

/// An immutable PDF byte buffer plus the extraction method requested for it.
#[derive(Debug, Clone)]
pub struct RawDocument {
    meta: FileMeta,
    bytes: Vec<u8>,
    method: ExtractionMethod,
}

impl RawDocument {
    /// Accept a selected file, rejecting anything that is not a PDF.
    ///
    /// A file passes when its declared type is `application/pdf`, when it has
    /// no declared type but a `.pdf` name, or when the bytes carry the `%PDF-`
    /// header.
    pub fn open(
        name: impl Into<String>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
        method: ExtractionMethod,
    ) -> Result<Self> {
        let name = name.into();
        let declared = content_type.map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or(ct)
                .trim()
                .to_lowercase()
        });

        let looks_like_pdf = match declared.as_deref() {
            Some("application/pdf") => true,
            Some(_) => false,
            None => name.to_lowercase().ends_with(".pdf"),
        } || bytes.starts_with(b"%PDF-");

        if !looks_like_pdf {
            return Err(ReaderError::UnsupportedInput(name));
        }

        Ok(Self {
            meta: FileMeta {
                name,
                size: bytes.len() as u64,
                content_type: declared,
            },
            bytes,
            method,
        })
    }

    pub fn meta(&self) -> &FileMeta {
        &self.meta
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn method(&self) -> ExtractionMethod {
        self.method
    }

    /// Same bytes, different forced method (for the retry affordance).
    #[must_use]
    pub fn with_method(mut self, method: ExtractionMethod) -> Self {
        self.method = method;
        self
    }
}

/// Best-effort text produced by a single tier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyOutput {
    pub text: String,
    /// Total pages processed, when the tier understands pages.
    pub page_count: Option<usize>,
}

impl StrategyOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page_count: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Turns raw document bytes into best-effort text.
///
/// Implementations are stateless: calling [`extract`](Self::extract) twice
/// with the same bytes yields the same output and leaves nothing behind.
pub trait ExtractionStrategy: Send + Sync {
    /// The tier this strategy occupies in the cascade.
    fn tier(&self) -> Tier;

    /// Extract text from the raw bytes. Errors are absorbed by the orchestrator.
    fn extract(&self, bytes: &[u8]) -> Result<StrategyOutput>;
}

/// Outcome of a full extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Sanitized document text (empty when the grade is `failed`).
    pub text: String,
    pub quality: QualityGrade,
    pub page_count: Option<usize>,
    /// Tier whose output was accepted, if any ran to completion.
    pub tier: Option<Tier>,
    /// Explanation for a `failed` grade.
    pub error: Option<String>,
    /// Sentence-sized playback units derived from `text`.
    pub chunks: ChunkSequence,
    /// Extraction time in milliseconds.
    pub elapsed_ms: f64,
}

impl ExtractionResult {
    pub fn is_failed(&self) -> bool {
        self.quality == QualityGrade::Failed
    }

    /// Convert a `failed` grade into [`ReaderError::ExtractionInsufficientText`].
    pub fn into_result(self) -> Result<Self> {
        if self.is_failed() {
            let reason = self
                .error
                .clone()
                .unwrap_or_else(|| "no readable text".to_string());
            return Err(ReaderError::ExtractionInsufficientText(reason));
        }
        Ok(self)
    }
}
