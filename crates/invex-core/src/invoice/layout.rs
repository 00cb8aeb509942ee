//! Layout-based extraction: geometric region heuristics over OCR tokens.
//!
//! Each region extractor restricts the token set geometrically, groups the
//! remainder into lines, and assigns fields by the fixed-template position
//! contract. Extractors are independent of each other's results.

use tracing::debug;

use crate::layout::{LabelMatch, SearchMode, TextLine, find_label, group_lines, value_for};
use crate::models::config::ExtractionConfig;
use crate::models::invoice::{ExtractedInvoice, LineItem};
use crate::ocr::{OcrCapture, Token};

use super::FieldExtractor;
use super::rules::amounts::{clean_amount, map_row_amounts};
use super::rules::dates::normalize_date;
use super::rules::patterns::{EMAIL, NUMERIC_TOKEN};
use super::rules::phone::{find_phone, normalize_phone};
use super::rules::swap_address_before_name;

/// Field extraction from token geometry: fixed-template regions, line
/// grouping and label proximity.
pub struct LayoutExtractor {
    config: ExtractionConfig,
}

impl LayoutExtractor {
    /// Create an extractor with the given configuration.
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Vendor block: the top-right region above the "INVOICE" anchor.
    fn extract_vendor_block(&self, capture: &OcrCapture, invoice: &mut ExtractedInvoice) {
        let region_left = (capture.width as f32 * self.config.vendor_region_ratio) as i32;

        // The invoice-metadata block sits directly beneath the vendor block;
        // cut at the INVOICE anchor, or at a fixed height fraction without one.
        let cutoff = capture
            .tokens
            .iter()
            .find(|t| t.contains("INVOICE"))
            .map(|t| t.top - self.config.vendor_anchor_margin)
            .unwrap_or((capture.height as f32 * self.config.vendor_fallback_ratio) as i32);

        let region: Vec<Token> = capture
            .tokens
            .iter()
            .filter(|t| t.left >= region_left && t.top < cutoff)
            .cloned()
            .collect();

        let lines = group_lines(&region, self.config.header_line_tolerance);
        let mut texts: Vec<String> = lines.iter().map(TextLine::text).collect();
        swap_address_before_name(&mut texts);

        // Fixed template: name, address, email, then phone when it carries a
        // digit. The email slot is positional - no `@` check.
        invoice.vendor = texts.first().cloned();
        invoice.vendor_address = texts.get(1).cloned();
        invoice.vendor_email = texts.get(2).cloned();
        if let Some(fourth) = texts.get(3) {
            if fourth.chars().any(|c| c.is_ascii_digit()) {
                invoice.vendor_phone = normalize_phone(fourth);
            }
        }

        // Last resort: sweep the concatenated token text for contact patterns.
        if invoice.vendor_email.is_none() || invoice.vendor_phone.is_none() {
            let all_text = capture
                .tokens
                .iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            if invoice.vendor_email.is_none() {
                invoice.vendor_email = EMAIL.find(&all_text).map(|m| m.as_str().to_string());
            }
            if invoice.vendor_phone.is_none() {
                invoice.vendor_phone = find_phone(&all_text);
            }
        }
    }

    /// Bill-to block: the left region directly below the "BILL TO" anchor.
    fn extract_bill_to(&self, capture: &OcrCapture, invoice: &mut ExtractedInvoice) {
        // Anchor on a single token first; OCR often splits the label across
        // two tokens, so fall back to grouped-line search. A line anchor uses
        // its lowest member so label fragments never leak into the region.
        let anchor_top = find_label(&capture.tokens, "BILL TO")
            .map(|l| l.top)
            .or_else(|| {
                group_lines(&capture.tokens, self.config.header_line_tolerance)
                    .iter()
                    .find(|l| l.contains("BILL TO"))
                    .and_then(|l| l.tokens.iter().map(|t| t.top).max())
            });
        let Some(anchor_top) = anchor_top else {
            return; // no anchor: both fields stay None
        };

        let region_right = (capture.width as f32 * self.config.bill_to_region_ratio) as i32;
        let region: Vec<Token> = capture
            .tokens
            .iter()
            .filter(|t| {
                t.left <= region_right
                    && t.top > anchor_top
                    && t.top <= anchor_top + self.config.bill_to_window
            })
            .cloned()
            .collect();

        let lines = group_lines(&region, self.config.header_line_tolerance);
        invoice.bill_to_name = lines.first().map(TextLine::text);
        if lines.len() > 1 {
            invoice.bill_to_address = Some(
                lines[1..]
                    .iter()
                    .map(TextLine::text)
                    .collect::<Vec<_>>()
                    .join(" "),
            );
        }
    }

    /// Invoice number, date and due date.
    fn extract_invoice_meta(&self, capture: &OcrCapture, invoice: &mut ExtractedInvoice) {
        let tokens = &capture.tokens;

        // The strict same-line pass wins whenever it yields any non-empty
        // candidate, even a spurious one - the fixed-template contract
        // depends on this precedence.
        invoice.invoice_number = self.strict_invoice_number(tokens).or_else(|| {
            self.locate(tokens, "Invoice #")
                .map(|t| t.text.trim().to_string())
                .filter(|s| !s.is_empty())
        });

        invoice.invoice_date = self
            .locate(tokens, "Date")
            .and_then(|t| normalize_date(&t.text));
        invoice.due_date = self
            .locate(tokens, "Due Date")
            .and_then(|t| normalize_date(&t.text));
    }

    /// Same-line pass: a token carrying both "INVOICE" and "#" with its value
    /// immediately to the right.
    fn strict_invoice_number(&self, tokens: &[Token]) -> Option<String> {
        for (i, label) in tokens.iter().enumerate() {
            let upper = label.text.to_uppercase();
            if !(upper.contains("INVOICE") && upper.contains('#')) {
                continue;
            }

            // Same physical line, value at or right of the label's end; the
            // left slack forgives boxes the OCR glued together.
            let mut candidates: Vec<&Token> = tokens
                .iter()
                .enumerate()
                .filter(|&(j, t)| {
                    j != i
                        && (t.top - label.top).abs() <= self.config.strict_line_tolerance
                        && t.left >= label.left + label.width - self.config.strict_left_slack
                })
                .map(|(_, t)| t)
                .collect();
            candidates.sort_by_key(|t| t.left);

            if let Some(value) = candidates.first() {
                let cleaned = strip_label_prefix(&value.text);
                if !cleaned.is_empty() {
                    return Some(cleaned);
                }
            }
        }
        None
    }

    /// Items table: bounded body below the column headers, one item per
    /// grouped row.
    fn extract_items(&self, capture: &OcrCapture, invoice: &mut ExtractedInvoice) {
        let header_top = self
            .topmost_header(&capture.tokens, &self.config.table_headers)
            .or_else(|| self.topmost_header(&capture.tokens, &self.config.table_header_aliases));
        let Some(header_top) = header_top else {
            return; // no headers located: no items
        };

        let body_top = header_top + self.config.table_start_offset;
        let body_bottom = (capture.height as f32 * self.config.table_end_ratio) as i32;
        let body: Vec<Token> = capture
            .tokens
            .iter()
            .filter(|t| t.top >= body_top && t.top < body_bottom)
            .cloned()
            .collect();

        let rows = group_lines(&body, self.config.table_row_tolerance);
        debug!("items table: {} candidate rows", rows.len());
        invoice.items = rows
            .iter()
            .filter_map(|row| self.parse_item_row(row))
            .collect();
    }

    fn topmost_header(&self, tokens: &[Token], labels: &[String]) -> Option<i32> {
        tokens
            .iter()
            .filter(|t| {
                let upper = t.text.to_uppercase();
                labels.iter().any(|label| upper.contains(label))
            })
            .map(|t| t.top)
            .min()
    }

    fn parse_item_row(&self, row: &TextLine) -> Option<LineItem> {
        // Walk left-to-right: leading non-numeric tokens form the
        // description; a summary keyword anywhere in the walk kills the row.
        let mut description_parts: Vec<&str> = Vec::new();
        for token in &row.tokens {
            if self.is_summary_text(&token.text) {
                return None;
            }
            if NUMERIC_TOKEN.is_match(token.text.trim()) {
                break;
            }
            description_parts.push(token.text.as_str());
        }
        let description = description_parts.join(" ").trim().to_string();

        let amounts: Vec<f64> = row
            .tokens
            .iter()
            .filter_map(|t| clean_amount(&t.text))
            .collect();
        let (quantity, unit_price, total_price) = map_row_amounts(&amounts);

        if description.is_empty() && total_price.is_none() {
            return None;
        }
        if self.is_summary_text(&description) {
            return None;
        }
        Some(LineItem {
            description,
            quantity,
            unit_price,
            total_price,
        })
    }

    /// Summary block: labeled amounts in the bottom-right region.
    fn extract_summary(&self, capture: &OcrCapture, invoice: &mut ExtractedInvoice) {
        let min_left = (capture.width as f32 * self.config.summary_region_x_ratio) as i32;
        let min_top = (capture.height as f32 * self.config.summary_region_y_ratio) as i32;
        let region: Vec<Token> = capture
            .tokens
            .iter()
            .filter(|t| t.left >= min_left && t.top >= min_top)
            .cloned()
            .collect();

        invoice.subtotal = self.labeled_amount(&region, "Subtotal");
        invoice.tax = self
            .labeled_amount(&region, "Tax")
            .or_else(|| self.labeled_amount(&region, "VAT"));
        invoice.total = self.labeled_amount(&region, "TOTAL");
        invoice.discount = self.labeled_amount(&region, "Discount");
    }

    fn labeled_amount(&self, region: &[Token], label: &str) -> Option<f64> {
        self.locate(region, label).and_then(|t| clean_amount(&t.text))
    }

    fn locate<'a>(&self, tokens: &'a [Token], label: &str) -> Option<&'a Token> {
        let label_match: LabelMatch = find_label(tokens, label)?;
        value_for(
            tokens,
            &label_match,
            SearchMode::Right,
            self.config.label_value_tolerance,
        )
    }

    fn is_summary_text(&self, text: &str) -> bool {
        let upper = text.to_uppercase();
        self.config
            .summary_keywords
            .iter()
            .any(|keyword| upper.contains(keyword))
    }
}

/// Strip a residual "INVOICE # :"-style prefix off a value the OCR glued to
/// its label.
fn strip_label_prefix(raw: &str) -> String {
    let mut value = raw.trim();
    let upper = value.to_uppercase();
    if let Some(position) = upper.find("INVOICE") {
        value = &value[position + "INVOICE".len()..];
    }
    value
        .trim_start_matches(|c: char| c.is_whitespace() || c == '#' || c == ':')
        .trim()
        .to_string()
}

impl FieldExtractor for LayoutExtractor {
    fn extract(&self, capture: &OcrCapture) -> ExtractedInvoice {
        let mut invoice = ExtractedInvoice::with_currency(&self.config.default_currency);
        self.extract_vendor_block(capture, &mut invoice);
        self.extract_bill_to(capture, &mut invoice);
        self.extract_invoice_meta(capture, &mut invoice);
        self.extract_items(capture, &mut invoice);
        self.extract_summary(capture, &mut invoice);
        invoice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WIDTH: u32 = 1000;
    const HEIGHT: u32 = 1400;

    fn token(text: &str, left: i32, top: i32) -> Token {
        Token {
            text: text.to_string(),
            left,
            top,
            width: 8 * text.len() as i32,
            height: 16,
            confidence: 93.0,
        }
    }

    fn capture(tokens: Vec<Token>) -> OcrCapture {
        OcrCapture {
            tokens,
            text: String::new(),
            width: WIDTH,
            height: HEIGHT,
        }
    }

    fn extractor() -> LayoutExtractor {
        LayoutExtractor::new(ExtractionConfig::default())
    }

    #[test]
    fn test_vendor_block_fixed_template() {
        let capture = capture(vec![
            token("Acme", 640, 40),
            token("Corp", 700, 41),
            token("123", 640, 70),
            token("Main", 680, 71),
            token("St", 730, 70),
            token("billing@acme.example", 640, 100),
            token("9155551234", 640, 130),
            token("INVOICE", 640, 200),
        ]);

        let invoice = extractor().extract(&capture);

        assert_eq!(invoice.vendor.as_deref(), Some("Acme Corp"));
        assert_eq!(invoice.vendor_address.as_deref(), Some("123 Main St"));
        assert_eq!(
            invoice.vendor_email.as_deref(),
            Some("billing@acme.example")
        );
        assert_eq!(invoice.vendor_phone.as_deref(), Some("+155551234"));
    }

    #[test]
    fn test_vendor_block_swaps_address_first_ordering() {
        let capture = capture(vec![
            token("123", 640, 40),
            token("Main", 680, 41),
            token("St", 730, 40),
            token("Acme", 640, 70),
            token("Corp", 700, 71),
            token("INVOICE", 640, 200),
        ]);

        let invoice = extractor().extract(&capture);

        assert_eq!(invoice.vendor.as_deref(), Some("Acme Corp"));
        assert_eq!(invoice.vendor_address.as_deref(), Some("123 Main St"));
    }

    #[test]
    fn test_vendor_block_excludes_tokens_below_anchor() {
        let capture = capture(vec![
            token("Acme", 640, 40),
            token("INVOICE", 640, 80),
            token("INV-100", 760, 81),
        ]);

        let invoice = extractor().extract(&capture);

        // Only the line above the INVOICE anchor belongs to the vendor block.
        assert_eq!(invoice.vendor.as_deref(), Some("Acme"));
        assert_eq!(invoice.vendor_address, None);
    }

    #[test]
    fn test_vendor_email_slot_is_positional() {
        // Line 3 is assigned to the email field even without an `@`.
        let capture = capture(vec![
            token("Acme", 640, 40),
            token("Suite", 640, 70),
            token("B", 700, 71),
            token("Portland", 640, 100),
            token("INVOICE", 640, 200),
        ]);

        let invoice = extractor().extract(&capture);
        assert_eq!(invoice.vendor_email.as_deref(), Some("Portland"));
    }

    #[test]
    fn test_vendor_phone_line_must_carry_a_digit() {
        let capture = capture(vec![
            token("Acme", 640, 40),
            token("Street", 640, 70),
            token("mail@acme.example", 640, 100),
            token("nophone", 640, 130),
            token("INVOICE", 640, 200),
        ]);

        let invoice = extractor().extract(&capture);
        assert_eq!(invoice.vendor_phone, None);
    }

    #[test]
    fn test_bill_to_block() {
        let capture = capture(vec![
            token("BILL", 60, 300),
            token("TO:", 110, 301),
            token("Globex", 60, 330),
            token("Inc", 130, 331),
            token("789", 60, 360),
            token("Oak", 100, 361),
            token("Ave", 140, 360),
            token("Springfield", 60, 390),
        ]);

        let invoice = extractor().extract(&capture);

        assert_eq!(invoice.bill_to_name.as_deref(), Some("Globex Inc"));
        assert_eq!(
            invoice.bill_to_address.as_deref(),
            Some("789 Oak Ave Springfield")
        );
    }

    #[test]
    fn test_bill_to_anchor_spanning_two_tokens() {
        // "BILL TO" only exists at the grouped-line level here.
        let capture = capture(vec![
            token("BILL", 60, 300),
            token("TO", 110, 302),
            token("Globex", 60, 330),
        ]);

        let invoice = extractor().extract(&capture);
        assert_eq!(invoice.bill_to_name.as_deref(), Some("Globex"));
    }

    #[test]
    fn test_bill_to_absent_anchor_leaves_fields_none() {
        let capture = capture(vec![token("Globex", 60, 330)]);
        let invoice = extractor().extract(&capture);
        assert_eq!(invoice.bill_to_name, None);
        assert_eq!(invoice.bill_to_address, None);
    }

    #[test]
    fn test_bill_to_window_bounds_the_address() {
        let capture = capture(vec![
            token("BILL", 60, 300),
            token("TO:", 110, 300),
            token("Globex", 60, 330),
            token("Far", 60, 460), // beyond the 150px window
        ]);

        let invoice = extractor().extract(&capture);
        assert_eq!(invoice.bill_to_name.as_deref(), Some("Globex"));
        assert_eq!(invoice.bill_to_address, None);
    }

    #[test]
    fn test_strict_invoice_number_same_line() {
        let capture = capture(vec![
            token("INVOICE#:", 640, 220),
            token("INV-2024-001", 740, 221),
        ]);

        let invoice = extractor().extract(&capture);
        assert_eq!(invoice.invoice_number.as_deref(), Some("INV-2024-001"));
    }

    #[test]
    fn test_strict_invoice_number_strips_glued_prefix() {
        // OCR merged label and value into one box to the right of the label.
        let capture = capture(vec![
            token("INVOICE#", 600, 220),
            token("INVOICE # : INV-55", 680, 221),
        ]);

        let invoice = extractor().extract(&capture);
        assert_eq!(invoice.invoice_number.as_deref(), Some("INV-55"));
    }

    #[test]
    fn test_locator_fallback_catches_vertically_offset_value() {
        // The value sits 30px below the label: outside the strict pass's
        // 10px line tolerance, inside the general locator's 50px window.
        let capture = capture(vec![
            token("Invoice #", 600, 220),
            token("INV-777", 700, 250),
        ]);

        let invoice = extractor().extract(&capture);
        assert_eq!(invoice.invoice_number.as_deref(), Some("INV-777"));
    }

    #[test]
    fn test_split_label_tokens_resolve_nothing() {
        // Word-level tokens never contain the full "Invoice #" label, so
        // neither pass fires; the orchestrator's text merge covers this.
        let capture = capture(vec![
            token("Invoice", 600, 220),
            token("#", 670, 221),
            token("INV-777", 700, 222),
        ]);

        let invoice = extractor().extract(&capture);
        assert_eq!(invoice.invoice_number, None);
    }

    #[test]
    fn test_strict_pass_beats_locator_even_when_spurious() {
        // The strict pass accepts its first same-line candidate even when a
        // better-looking value sits elsewhere; this precedence is part of
        // the fixed-template contract.
        let capture = capture(vec![
            token("INVOICE#", 600, 220),
            token("junk", 700, 222),
            token("Invoice", 60, 500),
            token("#", 130, 501),
            token("INV-999", 160, 500),
        ]);

        let invoice = extractor().extract(&capture);
        assert_eq!(invoice.invoice_number.as_deref(), Some("junk"));
    }

    #[test]
    fn test_meta_dates_flow_through_the_normalizer() {
        let capture = capture(vec![
            token("Date:", 600, 260),
            token("01/15/2024", 680, 261),
            token("Due Date:", 560, 320),
            token("02/14/2024", 700, 321),
        ]);

        let invoice = extractor().extract(&capture);
        assert_eq!(invoice.invoice_date.as_deref(), Some("2024-01-15"));
        assert_eq!(invoice.due_date.as_deref(), Some("2024-02-14"));
    }

    fn items_tokens() -> Vec<Token> {
        vec![
            token("Item", 60, 500),
            token("Description", 110, 501),
            token("Qty", 500, 500),
            token("Unit", 620, 501),
            token("Price", 660, 500),
            token("Total", 820, 501),
            token("Widget", 60, 540),
            token("2", 500, 541),
            token("10.00", 620, 540),
            token("20.00", 820, 541),
            token("Service", 60, 580),
            token("50.00", 620, 581),
            token("50.00", 820, 580),
        ]
    }

    #[test]
    fn test_items_table_numeric_mapping() {
        let invoice = extractor().extract(&capture(items_tokens()));

        assert_eq!(invoice.items.len(), 2);
        assert_eq!(
            invoice.items[0],
            LineItem {
                description: "Widget".to_string(),
                quantity: Some(2.0),
                unit_price: Some(10.0),
                total_price: Some(20.0),
            }
        );
        // Two numbers: quantity defaults to 1.
        assert_eq!(
            invoice.items[1],
            LineItem {
                description: "Service".to_string(),
                quantity: Some(1.0),
                unit_price: Some(50.0),
                total_price: Some(50.0),
            }
        );
    }

    #[test]
    fn test_items_summary_rows_are_discarded() {
        let mut tokens = items_tokens();
        tokens.push(token("SUBTOTAL", 620, 620));
        tokens.push(token("70.00", 820, 621));

        let invoice = extractor().extract(&capture(tokens));

        assert_eq!(invoice.items.len(), 2);
        assert!(
            invoice
                .items
                .iter()
                .all(|i| !i.description.to_uppercase().contains("SUBTOTAL"))
        );
    }

    #[test]
    fn test_items_body_ends_before_the_summary_zone() {
        let mut tokens = items_tokens();
        // 0.7 * 1400 = 980; anything below never becomes an item.
        tokens.push(token("Stray", 60, 990));
        tokens.push(token("5.00", 820, 991));

        let invoice = extractor().extract(&capture(tokens));
        assert_eq!(invoice.items.len(), 2);
    }

    #[test]
    fn test_items_need_headers() {
        let capture = capture(vec![
            token("Widget", 60, 540),
            token("20.00", 820, 541),
        ]);

        let invoice = extractor().extract(&capture);
        assert!(invoice.items.is_empty());
    }

    #[test]
    fn test_summary_block_amounts() {
        let capture = capture(vec![
            token("Tax:", 620, 880),
            token("8.00", 820, 881),
            token("Total:", 620, 940),
            token("108.00", 820, 941),
        ]);

        let invoice = extractor().extract(&capture);
        assert_eq!(invoice.tax, Some(8.0));
        assert_eq!(invoice.total, Some(108.0));
    }

    #[test]
    fn test_summary_vat_feeds_the_tax_field() {
        let capture = capture(vec![
            token("VAT:", 620, 900),
            token("12.50", 820, 901),
        ]);

        let invoice = extractor().extract(&capture);
        assert_eq!(invoice.tax, Some(12.5));
    }

    #[test]
    fn test_summary_total_label_also_matches_subtotal_first() {
        // Substring labels: the first token containing TOTAL is "Subtotal:",
        // so its amount is reported for both fields. Preserved source
        // behavior of the fixed-template contract.
        let capture = capture(vec![
            token("Subtotal:", 620, 880),
            token("100.00", 820, 881),
            token("Total:", 620, 940),
            token("108.00", 820, 941),
        ]);

        let invoice = extractor().extract(&capture);
        assert_eq!(invoice.subtotal, Some(100.0));
        assert_eq!(invoice.total, Some(100.0));
    }

    #[test]
    fn test_summary_region_excludes_upper_page_amounts() {
        let capture = capture(vec![
            token("Total:", 620, 300), // above the 0.6 * height cut
            token("999.00", 820, 301),
        ]);

        let invoice = extractor().extract(&capture);
        assert_eq!(invoice.total, None);
    }
}
