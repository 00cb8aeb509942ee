//! Invoice field extraction: layout-based engine with a text-only fallback.

mod layout;
pub mod rules;
mod text;

pub use layout::LayoutExtractor;
pub use text::TextExtractor;

use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::invoice::ExtractedInvoice;
use crate::ocr::OcrCapture;

/// One way of turning an OCR capture into invoice fields.
///
/// Two implementations exist: [`LayoutExtractor`] works from token geometry,
/// [`TextExtractor`] from the flattened transcription alone. The orchestrator
/// selects between them per call; a field either extractor cannot recover is
/// `None`, never an error.
pub trait FieldExtractor {
    /// Extract invoice fields from one capture.
    fn extract(&self, capture: &OcrCapture) -> ExtractedInvoice;
}

/// Extract invoice fields from one OCR capture.
///
/// With usable token geometry the layout extractor runs first and the text
/// extractor fills whatever it left unresolved; without geometry the text
/// extractor is the whole story. The choice is deterministic for identical
/// input, and nothing here retains state between calls.
pub fn extract_invoice(capture: &OcrCapture, config: &ExtractionConfig) -> ExtractedInvoice {
    let text_extractor = TextExtractor::new(config.clone());

    if capture.has_layout() {
        debug!(
            "layout extraction over {} tokens ({}x{})",
            capture.tokens.len(),
            capture.width,
            capture.height
        );
        let mut invoice = LayoutExtractor::new(config.clone()).extract(capture);
        invoice.fill_missing_from(text_extractor.extract(capture));
        invoice
    } else {
        debug!("no usable token geometry; text-only extraction");
        text_extractor.extract(capture)
    }
}
