//! Configuration structures for the extraction pipeline.
//!
//! All tolerances, region ratios and keyword tables live here as immutable
//! values injected into the extractors. Nothing in the engine mutates shared
//! state, so one config can serve any number of concurrent extractions.

use serde::{Deserialize, Serialize};

/// Main configuration for the invex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvexConfig {
    /// OCR provider configuration.
    pub ocr: OcrConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,
}

/// OCR provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Explicit path to the tesseract binary. When unset, the
    /// `TESSERACT_CMD` environment variable is consulted, then `PATH`.
    pub command: Option<String>,

    /// OCR engine mode, passed as `--oem`.
    pub oem: u32,

    /// Page segmentation mode, passed as `--psm`.
    pub psm: u32,

    /// Recognition language, passed as `-l` when set.
    pub language: Option<String>,

    /// Hard ceiling on one OCR invocation, in seconds. A hung engine must
    /// never block the caller indefinitely.
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: None,
            oem: 3,
            psm: 6, // uniform block of text
            language: None,
            timeout_secs: 120,
        }
    }
}

/// Field extraction configuration: geometric tolerances and keyword tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Vertical tolerance for line grouping in header-adjacent regions (px).
    pub header_line_tolerance: i32,

    /// Vertical tolerance for line grouping in the items table (px).
    pub table_row_tolerance: i32,

    /// Vertical tolerance when searching for a label's value token (px).
    pub label_value_tolerance: i32,

    /// Same-line tolerance for the strict invoice-number pass (px).
    pub strict_line_tolerance: i32,

    /// Horizontal slack for values the OCR glued to their label (px).
    pub strict_left_slack: i32,

    /// The vendor block occupies tokens right of this fraction of the width.
    pub vendor_region_ratio: f32,

    /// Margin above the "INVOICE" anchor excluded from the vendor block (px).
    pub vendor_anchor_margin: i32,

    /// Without an anchor, the vendor block is this top fraction of the height.
    pub vendor_fallback_ratio: f32,

    /// The bill-to block occupies tokens left of this fraction of the width.
    pub bill_to_region_ratio: f32,

    /// Vertical window below the "BILL TO" anchor (px).
    pub bill_to_window: i32,

    /// Table body starts this far below the topmost column header (px).
    pub table_start_offset: i32,

    /// Table body ends at this fraction of the image height; the summary
    /// section lives below and must never leak into items.
    pub table_end_ratio: f32,

    /// Summary region: tokens right of this fraction of the width.
    pub summary_region_x_ratio: f32,

    /// Summary region: tokens below this fraction of the height.
    pub summary_region_y_ratio: f32,

    /// Currency code reported when none is detected.
    pub default_currency: String,

    /// Uppercased terms marking the monetary summary section.
    pub summary_keywords: Vec<String>,

    /// Uppercased primary column header labels.
    pub table_headers: Vec<String>,

    /// Uppercased column header aliases, tried when no primary header hits.
    pub table_header_aliases: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            header_line_tolerance: 10,
            table_row_tolerance: 15,
            label_value_tolerance: 50,
            strict_line_tolerance: 10,
            strict_left_slack: 5,
            vendor_region_ratio: 0.6,
            vendor_anchor_margin: 10,
            vendor_fallback_ratio: 0.4,
            bill_to_region_ratio: 0.5,
            bill_to_window: 150,
            table_start_offset: 20,
            table_end_ratio: 0.7,
            summary_region_x_ratio: 0.5,
            summary_region_y_ratio: 0.6,
            default_currency: "USD".to_string(),
            summary_keywords: [
                "SUBTOTAL",
                "TAX",
                "VAT",
                "TOTAL",
                "DISCOUNT",
                "AMOUNT DUE",
                "GRAND TOTAL",
            ]
            .map(String::from)
            .to_vec(),
            table_headers: ["ITEM DESCRIPTION", "QTY", "UNIT PRICE", "TOTAL"]
                .map(String::from)
                .to_vec(),
            table_header_aliases: [
                "DESCRIPTION",
                "ITEM",
                "QTY",
                "QUANTITY",
                "UNIT PRICE",
                "PRICE",
                "RATE",
                "TOTAL",
                "AMOUNT",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl InvexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| crate::error::InvexError::Config(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> crate::error::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::InvexError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
