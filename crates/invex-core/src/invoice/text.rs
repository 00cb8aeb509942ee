//! Text-only fallback extraction over the flattened transcription.
//!
//! Used when token geometry is unavailable or the layout path left gaps:
//! pure regex and line-order heuristics, no positional data. Degrades
//! field by field exactly like the layout path - a miss is `None`.

use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::invoice::{ExtractedInvoice, LineItem};
use crate::ocr::OcrCapture;

use super::FieldExtractor;
use super::rules::amounts::{clean_amount, map_trailing_amounts};
use super::rules::dates::normalize_date;
use super::rules::patterns::{
    BARE_DATE, DATE_LABEL, DISCOUNT_LABEL, DUE_DATE_LABEL, EMAIL, HASH_VALUE,
    INVOICE_NUMBER_PATTERNS, NUMERIC_GROUP, PURCHASE_ORDER, SUBTOTAL_LABEL, TAX_LABEL,
    TOTAL_LABEL, VENDOR_SKIP,
};
use super::rules::phone::find_phone;
use super::rules::swap_address_before_name;

/// Field extraction from the raw transcription alone.
pub struct TextExtractor {
    config: ExtractionConfig,
}

impl TextExtractor {
    /// Create an extractor with the given configuration.
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Extract fields from raw text.
    pub fn extract_from_text(&self, raw_text: &str) -> ExtractedInvoice {
        let mut invoice = ExtractedInvoice::with_currency(&self.config.default_currency);
        if raw_text.trim().is_empty() {
            return invoice;
        }

        let lines: Vec<&str> = raw_text.lines().collect();
        let upper = raw_text.to_uppercase();

        invoice.invoice_number = extract_invoice_number(&lines, &upper);

        let (invoice_date, due_date) = extract_dates(&lines, &upper);
        invoice.invoice_date = invoice_date;
        invoice.due_date = due_date;

        invoice.total = TOTAL_LABEL
            .captures(&upper)
            .and_then(|c| clean_amount(&c[2]));
        invoice.subtotal = SUBTOTAL_LABEL
            .captures(&upper)
            .and_then(|c| clean_amount(&c[1]));
        invoice.tax = TAX_LABEL
            .captures(&upper)
            .and_then(|c| clean_amount(&c[2]));
        invoice.discount = DISCOUNT_LABEL
            .captures(&upper)
            .and_then(|c| clean_amount(&c[1]));

        self.extract_vendor_block(&lines, raw_text, &mut invoice);

        invoice.vendor_phone = find_phone(raw_text);
        invoice.purchase_order = PURCHASE_ORDER.captures(&upper).map(|c| c[1].to_string());
        invoice.items = self.extract_items(&lines);

        debug!(
            "text extraction: vendor={:?} number={:?} items={}",
            invoice.vendor,
            invoice.invoice_number,
            invoice.items.len()
        );
        invoice
    }

    /// Vendor block: up to 3 keyword-free lines among the first 10, assigned
    /// by strict order after the address/name swap.
    fn extract_vendor_block(
        &self,
        lines: &[&str],
        raw_text: &str,
        invoice: &mut ExtractedInvoice,
    ) {
        let mut block: Vec<String> = Vec::new();
        for line in lines.iter().take(10) {
            let trimmed = line.trim();
            if trimmed.len() <= 2 {
                continue;
            }
            if VENDOR_SKIP.is_match(&trimmed.to_uppercase()) {
                continue;
            }
            block.push(trimmed.to_string());
            if block.len() == 3 {
                break;
            }
        }
        swap_address_before_name(&mut block);

        invoice.vendor = block.first().cloned();
        invoice.vendor_address = block.get(1).cloned();
        invoice.vendor_email = block.get(2).cloned();

        if invoice.vendor_email.is_none() {
            invoice.vendor_email = EMAIL.find(raw_text).map(|m| m.as_str().to_string());
        }
    }

    /// State-machine scan: collect rows after the table header line, stop at
    /// the first summary line, keep what was already collected.
    fn extract_items(&self, lines: &[&str]) -> Vec<LineItem> {
        let mut items = Vec::new();
        let mut in_table = false;

        for line in lines {
            let upper = line.to_uppercase();
            if !in_table {
                if upper.contains("DESCRIPTION")
                    && (upper.contains("QTY") || upper.contains("UNIT PRICE"))
                {
                    in_table = true;
                }
                continue;
            }
            if self.is_summary_line(&upper) {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            if let Some(item) = parse_item_line(line) {
                items.push(item);
            }
        }
        items
    }

    fn is_summary_line(&self, upper: &str) -> bool {
        self.config
            .summary_keywords
            .iter()
            .any(|keyword| upper.contains(keyword))
    }
}

fn extract_invoice_number(lines: &[&str], upper: &str) -> Option<String> {
    // Same-line scan first: INVOICE and '#' on one line, value after the '#'.
    for line in lines {
        let line_upper = line.to_uppercase();
        if line_upper.contains("INVOICE") && line_upper.contains('#') {
            if let Some(caps) = HASH_VALUE.captures(&line_upper) {
                return Some(caps[1].to_string());
            }
        }
    }

    for pattern in INVOICE_NUMBER_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(upper) {
            return Some(caps[1].trim().to_string());
        }
    }
    None
}

fn extract_dates(lines: &[&str], upper: &str) -> (Option<String>, Option<String>) {
    let mut invoice_date = None;
    let mut due_date = None;

    for line in lines {
        let line_upper = line.to_uppercase();
        if line_upper.contains("DUE DATE") {
            if due_date.is_none() {
                due_date = DUE_DATE_LABEL
                    .captures(&line_upper)
                    .and_then(|c| normalize_date(&c[1]));
            }
        } else if invoice_date.is_none() {
            if let Some(caps) = DATE_LABEL.captures(&line_upper) {
                invoice_date = normalize_date(&caps[1]);
            }
        }
    }

    // Any bare numeric date in the text is better than nothing.
    if invoice_date.is_none() {
        invoice_date = BARE_DATE
            .find(upper)
            .and_then(|m| normalize_date(m.as_str()));
    }

    (invoice_date, due_date)
}

fn parse_item_line(line: &str) -> Option<LineItem> {
    let amounts: Vec<f64> = NUMERIC_GROUP
        .find_iter(line)
        .filter_map(|m| clean_amount(m.as_str()))
        .collect();

    // Description is everything before the first numeric group.
    let description = NUMERIC_GROUP
        .find(line)
        .map(|m| line[..m.start()].trim().to_string())
        .unwrap_or_else(|| line.trim().to_string());

    let (quantity, unit_price, total_price) = map_trailing_amounts(&amounts);

    if description.is_empty() && total_price.is_none() {
        return None;
    }
    Some(LineItem {
        description,
        quantity,
        unit_price,
        total_price,
    })
}

impl FieldExtractor for TextExtractor {
    fn extract(&self, capture: &OcrCapture) -> ExtractedInvoice {
        self.extract_from_text(&capture.text)
    }
}
