//! Structured decode: page model to reading-ordered text.
//!
//! A [`PageDecoder`] collaborator turns the document into per-page
//! [`PositionedGlyphRun`]s. This module puts those runs back into reading
//! order and renders each page as `Page N:` followed by its text.
//!
//! # Pipeline
//!
//! ```text
//! PDF bytes → page decoder → positioned runs → line grouping → page text
//! ```

use std::fmt::Display;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, warn};

use super::types::PositionedGlyphRun;
use super::{ExtractionStrategy, StrategyOutput, Tier};
use crate::error::{ReaderError, Result};
use crate::text::is_speakable;

/// Runs whose baselines differ by at most this many points share a line.
pub const LINE_TOLERANCE: f32 = 5.0;

/// Parses a document into pages of positioned text.
pub trait PageDecoder: Send + Sync {
    fn load(&self, bytes: &[u8]) -> Result<Box<dyn PageSource>>;
}

/// A loaded document, queried one page at a time.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Runs on the page at `index` (0-based), in arbitrary order.
    fn page_runs(&self, index: usize) -> Result<Vec<PositionedGlyphRun>>;
}

/// Pages decoded up front. A page that failed to decode keeps its error.
#[derive(Debug, Default, Clone)]
pub struct MemoryPages {
    pages: Vec<std::result::Result<Vec<PositionedGlyphRun>, String>>,
}

impl MemoryPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, runs: Vec<PositionedGlyphRun>) {
        self.pages.push(Ok(runs));
    }

    pub fn push_failed(&mut self, reason: impl Into<String>) {
        self.pages.push(Err(reason.into()));
    }
}

impl PageSource for MemoryPages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_runs(&self, index: usize) -> Result<Vec<PositionedGlyphRun>> {
        match self.pages.get(index) {
            Some(Ok(runs)) => Ok(runs.clone()),
            Some(Err(reason)) => Err(decode_failure(reason)),
            None => Err(decode_failure(format!("page {} out of range", index + 1))),
        }
    }
}

/// Highest-fidelity tier: full page-model decode with line reconstruction.
pub struct StructuredStrategy {
    decoder: Box<dyn PageDecoder>,
}

impl StructuredStrategy {
    pub fn new() -> Self {
        Self::with_decoder(LopdfDecoder)
    }

    pub fn with_decoder(decoder: impl PageDecoder + 'static) -> Self {
        Self {
            decoder: Box::new(decoder),
        }
    }

    /// Reconstruct one page's reading order.
    ///
    /// 1. Drop runs with no visible text and clean the rest.
    /// 2. Sort by Y descending (top-to-bottom), then X ascending.
    /// 3. Group runs within [`LINE_TOLERANCE`] of the line's first baseline.
    /// 4. Join runs of a line, then lines, with single spaces.
    pub fn reconstruct_page(runs: Vec<PositionedGlyphRun>) -> String {
        let mut runs: Vec<PositionedGlyphRun> = runs
            .into_iter()
            .filter(|run| !run.text.trim().is_empty())
            .filter_map(|mut run| {
                run.text = clean_run_text(&run.text);
                (!run.text.is_empty()).then_some(run)
            })
            .collect();

        runs.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

        let mut lines: Vec<Vec<PositionedGlyphRun>> = Vec::new();
        for run in runs {
            match lines.last_mut() {
                Some(line) if (line[0].y - run.y).abs() <= LINE_TOLERANCE => line.push(run),
                _ => lines.push(vec![run]),
            }
        }

        lines
            .iter_mut()
            .map(|line| {
                line.sort_by(|a, b| a.x.total_cmp(&b.x));
                line.iter()
                    .map(|run| run.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for StructuredStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionStrategy for StructuredStrategy {
    fn tier(&self) -> Tier {
        Tier::Structured
    }

    fn extract(&self, bytes: &[u8]) -> Result<StrategyOutput> {
        let source = self.decoder.load(bytes)?;
        let page_count = source.page_count();
        let mut pages = Vec::new();

        for index in 0..page_count {
            let page_number = index + 1;
            match source.page_runs(index) {
                Ok(runs) => {
                    let text = Self::reconstruct_page(runs);
                    if text.is_empty() {
                        debug!(page = page_number, "page has no text layer");
                    } else {
                        pages.push(format!("Page {page_number}:\n{text}"));
                    }
                }
                Err(e) => warn!(page = page_number, error = %e, "skipping undecodable page"),
            }
        }

        Ok(StrategyOutput {
            text: pages.join("\n\n"),
            page_count: Some(page_count),
        })
    }
}

/// Strip control characters, blank out anything unspeakable, collapse whitespace.
fn clean_run_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(*c, '\u{0}'..='\u{1f}' | '\u{7f}'..='\u{9f}'))
        .map(|c| if is_speakable(c) { c } else { ' ' })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_failure(reason: impl Display) -> ReaderError {
    ReaderError::StrategyInternalFailure {
        tier: Tier::Structured,
        reason: reason.to_string(),
    }
}

// ─── lopdf decoder ───────────────────────────────────────────────────────────

/// Pure-Rust page decoder built on `lopdf`.
///
/// Interprets the text operators of each page's content stream to place
/// every shown string. Font metrics are not loaded; run widths are estimated
/// from the font size.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfDecoder;

struct LopdfPages {
    doc: Document,
    page_ids: Vec<ObjectId>,
}

impl PageDecoder for LopdfDecoder {
    fn load(&self, bytes: &[u8]) -> Result<Box<dyn PageSource>> {
        if bytes.windows(b"/Encrypt".len()).any(|w| w == b"/Encrypt") {
            return Err(decode_failure("encrypted PDFs are not supported"));
        }

        let doc = Document::load_mem(bytes)
            .map_err(|e| decode_failure(format!("failed to parse PDF: {e}")))?;
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        debug!(pages = page_ids.len(), "loaded page tree");

        Ok(Box::new(LopdfPages { doc, page_ids }))
    }
}

impl PageSource for LopdfPages {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_runs(&self, index: usize) -> Result<Vec<PositionedGlyphRun>> {
        let page_id = *self
            .page_ids
            .get(index)
            .ok_or_else(|| decode_failure(format!("page {} out of range", index + 1)))?;
        let data = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| decode_failure(format!("failed to read page content: {e}")))?;
        let content = Content::decode(&data)
            .map_err(|e| decode_failure(format!("failed to decode content stream: {e}")))?;

        let mut state = TextState::default();
        for op in &content.operations {
            state.apply(&op.operator, &op.operands);
        }
        Ok(state.runs)
    }
}

/// Affine text matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Self = Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translate(self, tx: f32, ty: f32) -> Self {
        let [a, b, c, d, e, f] = self.0;
        Self([a, b, c, d, e + tx * a + ty * c, f + tx * b + ty * d])
    }

    fn horizontal_scale(self) -> f32 {
        let [a, b, ..] = self.0;
        (a * a + b * b).sqrt()
    }

    fn vertical_scale(self) -> f32 {
        let [_, _, c, d, ..] = self.0;
        (c * c + d * d).sqrt()
    }
}

/// Text-state machine over content-stream operators.
#[derive(Debug)]
struct TextState {
    line: Matrix,
    text: Matrix,
    font_size: f32,
    leading: f32,
    runs: Vec<PositionedGlyphRun>,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            line: Matrix::IDENTITY,
            text: Matrix::IDENTITY,
            font_size: 12.0,
            leading: 0.0,
            runs: Vec::new(),
        }
    }
}

/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE: f32 = 0.5;

/// `TJ` adjustments below this (thousandths of an em) read as word gaps.
const TJ_WORD_GAP: f32 = -200.0;

impl TextState {
    fn apply(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "BT" => {
                self.line = Matrix::IDENTITY;
                self.text = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(size) = operands.get(1).and_then(number) {
                    self.font_size = size.abs();
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    self.leading = leading;
                }
            }
            "Td" | "TD" => {
                let (Some(tx), Some(ty)) = (
                    operands.first().and_then(number),
                    operands.get(1).and_then(number),
                ) else {
                    return;
                };
                if operator == "TD" {
                    self.leading = -ty;
                }
                self.move_line(tx, ty);
            }
            "Tm" => {
                let values: Vec<f32> = operands.iter().filter_map(number).collect();
                if let [a, b, c, d, e, f] = values[..] {
                    self.line = Matrix([a, b, c, d, e, f]);
                    self.text = self.line;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(text) = operands.first().and_then(string) {
                    self.show(&text);
                }
            }
            "'" => {
                self.next_line();
                if let Some(text) = operands.first().and_then(string) {
                    self.show(&text);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(text) = operands.get(2).and_then(string) {
                    self.show(&text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let mut text = String::new();
                    for item in items {
                        if let Some(s) = string(item) {
                            text.push_str(&s);
                        } else if number(item).is_some_and(|adj| adj < TJ_WORD_GAP) {
                            text.push(' ');
                        }
                    }
                    self.show(&text);
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line = self.line.translate(tx, ty);
        self.text = self.line;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn show(&mut self, text: &str) {
        let [.., x, y] = self.text.0;
        let advance = text.chars().count() as f32 * self.font_size * GLYPH_ADVANCE;

        self.runs.push(
            PositionedGlyphRun::new(text, x, y).with_size(
                advance * self.text.horizontal_scale(),
                self.font_size * self.text.vertical_scale(),
            ),
        );
        self.text = self.text.translate(advance, 0.0);
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Decode a string operand: UTF-16BE with a byte-order mark, Latin-1 otherwise.
fn string(obj: &Object) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };

    if let Some(body) = bytes.strip_prefix(&[0xfe, 0xff]) {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&units));
    }

    Some(bytes.iter().map(|&b| char::from(b)).collect())
}

// ─── pdfium decoder ──────────────────────────────────────────────────────────

#[cfg(feature = "pdfium")]
pub mod pdfium_backend {
    //! Page decoding via `pdfium-render` (Chromium's PDF library).
    //!
    //! pdfium reports individual characters; they are grouped into word runs
    //! before reading-order reconstruction.

    use pdfium_render::prelude::*;

    use super::{decode_failure, MemoryPages, PageDecoder, PageSource, PositionedGlyphRun};
    use crate::error::Result;

    #[derive(Debug, Default, Clone, Copy)]
    pub struct PdfiumDecoder;

    impl PageDecoder for PdfiumDecoder {
        fn load(&self, bytes: &[u8]) -> Result<Box<dyn PageSource>> {
            let pdfium = Pdfium::default();
            let doc = pdfium
                .load_pdf_from_byte_slice(bytes, None)
                .map_err(|e| decode_failure(format!("failed to parse PDF: {e}")))?;

            let mut pages = MemoryPages::new();
            for page in doc.pages().iter() {
                match page.text() {
                    Ok(text) => pages.push(word_runs(&text)),
                    Err(e) => pages.push_failed(format!("failed to extract text from page: {e}")),
                }
            }
            Ok(Box::new(pages))
        }
    }

    /// Group consecutive characters into runs, breaking at whitespace and baseline jumps.
    #[allow(deprecated)] // PdfRect field access deprecated in 0.8.28, removed in 0.9.0
    fn word_runs(text: &PdfPageText) -> Vec<PositionedGlyphRun> {
        let mut runs = Vec::new();
        let mut current: Option<PositionedGlyphRun> = None;

        for ch in text.chars().iter() {
            let (Some(unicode_ch), Ok(rect)) = (ch.unicode_char(), ch.tight_bounds()) else {
                continue;
            };
            let x = rect.left.value;
            let y = rect.bottom.value;
            let width = (rect.right.value - rect.left.value).abs();
            let height = (rect.top.value - rect.bottom.value).abs();

            if unicode_ch.is_whitespace() {
                runs.extend(current.take());
                continue;
            }

            match current.as_mut() {
                Some(run) if (run.y - y).abs() < run.height.max(height) * 0.4 => {
                    run.text.push(unicode_ch);
                    run.width = (x + width) - run.x;
                }
                _ => {
                    runs.extend(current.take());
                    let run = PositionedGlyphRun::new(unicode_ch.to_string(), x, y);
                    current = Some(run.with_size(width, height));
                }
            }
        }

        runs.extend(current);
        runs
    }
}
