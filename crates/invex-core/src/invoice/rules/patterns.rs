//! Shared regex patterns for invoice field extraction.
//!
//! Label patterns expect uppercased input; the extractors uppercase the text
//! once and match against that. Contact patterns (email, phone) run against
//! the original text.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Invoice number label patterns, tried in order; first capture wins.
    pub static ref INVOICE_NUMBER_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"INVOICE\s*#?\s*:?[ ]*([A-Z0-9\-]+)").unwrap(),
        Regex::new(r"INV\s*#?\s*:?[ ]*([A-Z0-9\-]+)").unwrap(),
        Regex::new(r"INVOICE\s+NUMBER\s*:?[ ]*([A-Z0-9\-]+)").unwrap(),
        Regex::new(r"#\s*([A-Z0-9\-]{6,})").unwrap(),
    ];

    /// Value after a `#` on a line already known to mention INVOICE.
    pub static ref HASH_VALUE: Regex = Regex::new(r"#\s*:?\s*([A-Z0-9\-]+)").unwrap();

    /// A bare numeric date anywhere in the text.
    pub static ref BARE_DATE: Regex =
        Regex::new(r"\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}").unwrap();

    /// Labeled due date.
    pub static ref DUE_DATE_LABEL: Regex =
        Regex::new(r"DUE\s+DATE\s*:?\s*([\d/\-\. ]+)").unwrap();

    /// Labeled invoice date.
    pub static ref DATE_LABEL: Regex = Regex::new(r"DATE\s*:?\s*([\d/\-\. ]+)").unwrap();

    /// Labeled grand total.
    pub static ref TOTAL_LABEL: Regex =
        Regex::new(r"(TOTAL|AMOUNT DUE|GRAND TOTAL)\s*:?\s*\$?\s*([\d,]+\.?\d*)").unwrap();

    /// Labeled subtotal.
    pub static ref SUBTOTAL_LABEL: Regex =
        Regex::new(r"SUBTOTAL\s*:?\s*\$?\s*([\d,]+\.?\d*)").unwrap();

    /// Labeled tax amount.
    pub static ref TAX_LABEL: Regex =
        Regex::new(r"(TAX|SALES TAX|VAT)\s*:?\s*\$?\s*([\d,]+\.?\d*)").unwrap();

    /// Labeled discount amount.
    pub static ref DISCOUNT_LABEL: Regex =
        Regex::new(r"DISCOUNT\s*:?\s*\$?\s*([\d,]+\.?\d*)").unwrap();

    /// Purchase order reference.
    pub static ref PURCHASE_ORDER: Regex =
        Regex::new(r"P\.?O\.?\s*#?\s*:?\s*([A-Z0-9\-]+)").unwrap();

    /// Lines carrying these terms never hold the vendor name. Substring
    /// match, as in the source system - `TO` also hits e.g. `Tools`.
    pub static ref VENDOR_SKIP: Regex =
        Regex::new(r"INVOICE|TOTAL|DATE|AMOUNT|TO|FROM").unwrap();

    /// Email address.
    pub static ref EMAIL: Regex =
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap();

    /// Phone number candidate.
    pub static ref PHONE: Regex = Regex::new(r"\+?[\d\s().-]{7,}\d").unwrap();

    /// A token that is purely numeric (table cell amounts).
    pub static ref NUMERIC_TOKEN: Regex = Regex::new(r"^[\d,]+\.?\d*$").unwrap();

    /// Numeric groups inside a raw text row.
    pub static ref NUMERIC_GROUP: Regex = Regex::new(r"[\d,]+\.?\d*").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_number_labeled() {
        let caps = INVOICE_NUMBER_PATTERNS[0]
            .captures("INVOICE #: INV-2024-001")
            .unwrap();
        assert_eq!(&caps[1], "INV-2024-001");
    }

    #[test]
    fn test_numeric_token_shapes() {
        assert!(NUMERIC_TOKEN.is_match("2"));
        assert!(NUMERIC_TOKEN.is_match("1,250.00"));
        assert!(NUMERIC_TOKEN.is_match("10."));
        assert!(!NUMERIC_TOKEN.is_match("Widget"));
        assert!(!NUMERIC_TOKEN.is_match("$20.00"));
    }

    #[test]
    fn test_phone_candidate() {
        assert!(PHONE.is_match("+1 (555) 555-1234"));
        assert!(PHONE.is_match("9155551234"));
        assert!(!PHONE.is_match("12345"));
    }

    #[test]
    fn test_total_label_variants() {
        let caps = TOTAL_LABEL.captures("AMOUNT DUE: $1,234.56").unwrap();
        assert_eq!(&caps[2], "1,234.56");
    }
}
