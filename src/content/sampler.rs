//! Byte-prefix sampling to choose the starting extraction tier.

use super::Tier;

/// Number of leading bytes inspected.
pub const SAMPLE_SIZE: usize = 10_000;

/// Likely internal encoding of the document, judged from its first bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyHint {
    /// Content objects are present. Literal text inside them is usually
    /// readable, so the pattern scanner goes first.
    StructuredObjectsPresent,
    /// Filter declarations suggest compressed content that defeats naive
    /// parsing; favour the loose scanner.
    Compressed,
    /// Nothing conclusive; attempt a full page-model decode.
    PlainLayout,
}

impl StrategyHint {
    /// First tier to run in auto mode.
    pub fn starting_tier(self) -> Tier {
        match self {
            Self::StructuredObjectsPresent => Tier::Pattern,
            Self::Compressed => Tier::Loose,
            Self::PlainLayout => Tier::Structured,
        }
    }
}

/// Classify a document from at most [`SAMPLE_SIZE`] leading bytes.
pub fn sample_hint(bytes: &[u8]) -> StrategyHint {
    let sample = &bytes[..bytes.len().min(SAMPLE_SIZE)];
    let text = String::from_utf8_lossy(sample);

    if text.contains("stream") && text.contains("endstream") {
        StrategyHint::StructuredObjectsPresent
    } else if text.contains("/Filter") || text.contains("/FlateDecode") {
        StrategyHint::Compressed
    } else {
        StrategyHint::PlainLayout
    }
}
