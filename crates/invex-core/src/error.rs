//! Error types for the invex-core library.
//!
//! Field-level extraction misses are not errors: a label that is absent or a
//! value that will not parse resolves to `None` for that field only. The
//! variants here cover the boundaries where extraction cannot run at all,
//! most importantly an unreachable OCR engine.

use thiserror::Error;

/// Main error type for the invex library.
#[derive(Error, Debug)]
pub enum InvexError {
    /// OCR provider error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised at the external OCR provider boundary.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The OCR engine is not installed or cannot be started. Callers must be
    /// able to tell this apart from a document that merely OCRs badly.
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    /// The OCR engine did not finish within the configured timeout.
    #[error("OCR timed out after {0}s")]
    Timeout(u64),

    /// The OCR engine ran but reported a failure.
    #[error("OCR failed: {0}")]
    Failed(String),

    /// The engine produced output the TSV parser could not understand.
    #[error("malformed OCR output: {0}")]
    MalformedOutput(String),
}

/// Result type for the invex library.
pub type Result<T> = std::result::Result<T, InvexError>;
