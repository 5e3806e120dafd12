//! Positioned text produced by page-model decoders.
//!
//! Kept separate from `structured.rs` so decoder backends (lopdf, pdfium)
//! and the reading-order reconstruction share one type.

/// A run of text placed on a page by the document's content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedGlyphRun {
    pub text: String,
    /// Left edge in PDF points (1pt = 1/72 inch).
    pub x: f32,
    /// Baseline Y position (bottom-up coordinate system).
    pub y: f32,
    pub width: f32,
    /// Font size approximation (glyph height).
    pub height: f32,
}

impl PositionedGlyphRun {
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width: 0.0,
            height: 0.0,
        }
    }

    #[must_use]
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}
