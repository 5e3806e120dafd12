//! Fallback policy across the extraction tiers.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{debug, info, warn};

use super::sampler::sample_hint;
use super::structured::PageDecoder;
use super::{
    ExtractionMethod, ExtractionResult, ExtractionStrategy, LooseStrategy, PatternStrategy,
    QualityGrade, RawDocument, RawStrategy, StrategyOutput, StructuredStrategy, Tier,
};
use crate::text::{chunk, sanitize, ChunkSequence};

/// Sanitized text shorter than this (in characters) grades as `failed`.
pub const MIN_VIABLE_TEXT_LEN: usize = 10;

const INSUFFICIENT_TEXT: &str =
    "insufficient text: the PDF may be image-based, encrypted, or corrupted";

/// Runs the extraction tiers in order and grades the outcome.
///
/// Holds one strategy per tier. Strategies are stateless, so a single
/// orchestrator can serve any number of documents.
pub struct ExtractionOrchestrator {
    strategies: [Box<dyn ExtractionStrategy>; 4],
}

impl ExtractionOrchestrator {
    pub fn new() -> Self {
        Self::with_structured(StructuredStrategy::new())
    }

    /// Use `decoder` for the structured tier.
    pub fn with_decoder(decoder: impl PageDecoder + 'static) -> Self {
        Self::with_structured(StructuredStrategy::with_decoder(decoder))
    }

    fn with_structured(structured: StructuredStrategy) -> Self {
        Self {
            strategies: [
                Box::new(structured),
                Box::new(PatternStrategy),
                Box::new(LooseStrategy),
                Box::new(RawStrategy),
            ],
        }
    }

    fn strategy(&self, tier: Tier) -> &dyn ExtractionStrategy {
        let index = match tier {
            Tier::Structured => 0,
            Tier::Pattern => 1,
            Tier::Loose => 2,
            Tier::Raw => 3,
        };
        self.strategies[index].as_ref()
    }

    /// Tiers to attempt for `method`, in order. The raw tier always closes the plan.
    pub fn plan(bytes: &[u8], method: ExtractionMethod) -> Vec<Tier> {
        match method.forced_tier() {
            Some(Tier::Raw) => vec![Tier::Raw],
            Some(tier) => vec![tier, Tier::Raw],
            None => {
                let hint = sample_hint(bytes);
                debug!(?hint, start = %hint.starting_tier(), "sampled document");
                hint.starting_tier().descending().collect()
            }
        }
    }

    /// Extract, sanitize and chunk `bytes`. Never fails; see [`ExtractionResult::into_result`].
    pub fn extract(&self, bytes: &[u8], method: ExtractionMethod) -> ExtractionResult {
        let start = Instant::now();
        let mut page_count = None;
        let mut accepted = None;

        for tier in Self::plan(bytes, method) {
            let output = self.run_tier(tier, bytes);
            if tier == Tier::Structured {
                page_count = output.page_count;
            }
            if tier == Tier::Raw || !output.is_empty() {
                accepted = Some((tier, output.text));
                break;
            }
        }

        let (tier, raw_text) = accepted.unwrap_or((Tier::Raw, String::new()));
        let text = sanitize(&raw_text);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        if text.chars().count() < MIN_VIABLE_TEXT_LEN {
            warn!(%tier, chars = text.chars().count(), "extraction produced too little text");
            return ExtractionResult {
                text: String::new(),
                quality: QualityGrade::Failed,
                page_count,
                tier: Some(tier),
                error: Some(INSUFFICIENT_TEXT.to_string()),
                chunks: ChunkSequence::default(),
                elapsed_ms,
            };
        }

        let chunks = chunk(&text);
        info!(
            %tier,
            quality = %tier.grade(),
            chars = text.len(),
            chunks = chunks.len(),
            elapsed_ms,
            "extraction complete"
        );

        ExtractionResult {
            text,
            quality: tier.grade(),
            page_count,
            tier: Some(tier),
            error: None,
            chunks,
            elapsed_ms,
        }
    }

    /// [`extract`](Self::extract) with the document's requested method.
    pub fn extract_document(&self, doc: &RawDocument) -> ExtractionResult {
        info!(
            file = %doc.meta().name,
            size = doc.meta().size,
            method = %doc.method(),
            "extracting document"
        );
        self.extract(doc.bytes(), doc.method())
    }

    /// Run one tier, turning errors and panics into empty output.
    fn run_tier(&self, tier: Tier, bytes: &[u8]) -> StrategyOutput {
        let strategy = self.strategy(tier);
        match panic::catch_unwind(AssertUnwindSafe(|| strategy.extract(bytes))) {
            Ok(Ok(output)) => {
                debug!(
                    %tier,
                    chars = output.text.len(),
                    empty = output.is_empty(),
                    "tier finished"
                );
                output
            }
            Ok(Err(e)) => {
                warn!(%tier, error = %e, "tier failed, falling back");
                StrategyOutput::default()
            }
            Err(_) => {
                warn!(%tier, "tier panicked, falling back");
                StrategyOutput::default()
            }
        }
    }
}

impl Default for ExtractionOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
