//! OCR provider boundary: token types and the external engine trait.
//!
//! The extraction engine never invokes OCR itself; it consumes an
//! [`OcrCapture`] that some provider produced. Providers live behind
//! [`OcrProvider`] and are expected to enforce their own time bounds.

mod tesseract;

pub use tesseract::{TesseractOcr, parse_tsv};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// One OCR-recognized text fragment with its pixel-space bounding box.
///
/// Tokens are immutable and produced externally. The provider contract
/// guarantees confidence > 0 and non-blank text; the engine does not
/// re-validate, but tolerates an empty token set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Recognized text content.
    pub text: String,

    /// Left edge, in pixels.
    pub left: i32,

    /// Top edge, in pixels.
    pub top: i32,

    /// Box width, in pixels.
    pub width: i32,

    /// Box height, in pixels.
    pub height: i32,

    /// Recognition confidence on the provider's 0-100 scale.
    pub confidence: f32,
}

impl Token {
    /// Right edge of the bounding box.
    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    /// Bottom edge of the bounding box.
    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    /// Case-insensitive substring test against the token text.
    pub fn contains(&self, needle: &str) -> bool {
        self.text.to_uppercase().contains(&needle.to_uppercase())
    }
}

/// Everything the extraction engine consumes for one document: recognized
/// tokens, the flattened transcription, and the source image dimensions.
///
/// The raw text must always be supplied, even alongside tokens; the
/// dimensions are meaningful whenever tokens are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrCapture {
    /// Recognized tokens; an empty list is valid input, not an error.
    pub tokens: Vec<Token>,

    /// Flattened transcription, independent of token geometry.
    pub text: String,

    /// Source image width in pixels.
    pub width: u32,

    /// Source image height in pixels.
    pub height: u32,
}

impl OcrCapture {
    /// Capture carrying only a flattened transcription.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Whether token geometry is usable for layout-based extraction.
    pub fn has_layout(&self) -> bool {
        !self.tokens.is_empty() && self.width > 0 && self.height > 0
    }
}

/// External OCR engine boundary.
///
/// Implementations run outside the extraction engine and must bound their
/// own execution time; an unreachable engine surfaces as
/// [`OcrError::Unavailable`], never as an empty capture.
pub trait OcrProvider {
    /// Run OCR over the document at `path`.
    fn capture(&self, path: &Path) -> Result<OcrCapture, OcrError>;
}
