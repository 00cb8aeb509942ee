//! Core library for invoice field extraction from OCR output.
//!
//! This crate provides:
//! - Token and capture types for position-correlated OCR output
//! - Layout-based field extraction (regions, line grouping, label proximity)
//! - A text-only fallback extractor over the flattened transcription
//! - Date, phone and amount normalization rules
//! - A bounded-time Tesseract subprocess provider

pub mod error;
pub mod models;
pub mod ocr;
pub mod layout;
pub mod invoice;

pub use error::{InvexError, OcrError, Result};
pub use models::config::{ExtractionConfig, InvexConfig, OcrConfig};
pub use models::invoice::{ExtractedInvoice, LineItem};
pub use ocr::{OcrCapture, OcrProvider, TesseractOcr, Token};
pub use invoice::{FieldExtractor, LayoutExtractor, TextExtractor, extract_invoice};
