//! Extracted invoice record.

use serde::{Deserialize, Serialize};

/// The structured fields recovered from one invoice document.
///
/// Every field is present in serialized output; a field the extractors could
/// not recover is `null`, never a missing key. Downstream consumers rely on
/// full key coverage. A record is built fresh per extraction call and never
/// mutated after it is returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedInvoice {
    /// Vendor (seller) name.
    pub vendor: Option<String>,

    /// Vendor street address.
    pub vendor_address: Option<String>,

    /// Vendor email address.
    pub vendor_email: Option<String>,

    /// Vendor phone number, normalized for OCR artifacts.
    pub vendor_phone: Option<String>,

    /// Invoice number/identifier.
    pub invoice_number: Option<String>,

    /// Invoice issue date, ISO-8601 (`YYYY-MM-DD`).
    pub invoice_date: Option<String>,

    /// Payment due date, ISO-8601 (`YYYY-MM-DD`).
    pub due_date: Option<String>,

    /// Billed party name.
    pub bill_to_name: Option<String>,

    /// Billed party address.
    pub bill_to_address: Option<String>,

    /// Purchase order reference.
    pub purchase_order: Option<String>,

    /// Net amount before tax.
    pub subtotal: Option<f64>,

    /// Tax amount (TAX and VAT labels both land here).
    pub tax: Option<f64>,

    /// Total amount due.
    pub total: Option<f64>,

    /// Discount amount.
    pub discount: Option<f64>,

    /// Currency code. The extractors do not detect currency; this is the
    /// configured default.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Ordered line items; empty when no items table was recovered.
    pub items: Vec<LineItem>,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// One row of the items table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product/service description.
    pub description: String,

    /// Quantity; defaults to 1 when the row carries exactly two numbers.
    pub quantity: Option<f64>,

    /// Price per unit.
    pub unit_price: Option<f64>,

    /// Row total.
    pub total_price: Option<f64>,
}

impl ExtractedInvoice {
    /// Create an empty record carrying the given currency code.
    pub fn with_currency(currency: &str) -> Self {
        Self {
            currency: currency.to_string(),
            ..Self::default()
        }
    }

    /// Fill every still-unresolved field from `fallback`, leaving resolved
    /// fields untouched. An empty items list counts as unresolved.
    pub fn fill_missing_from(&mut self, fallback: ExtractedInvoice) {
        if self.vendor.is_none() {
            self.vendor = fallback.vendor;
        }
        if self.vendor_address.is_none() {
            self.vendor_address = fallback.vendor_address;
        }
        if self.vendor_email.is_none() {
            self.vendor_email = fallback.vendor_email;
        }
        if self.vendor_phone.is_none() {
            self.vendor_phone = fallback.vendor_phone;
        }
        if self.invoice_number.is_none() {
            self.invoice_number = fallback.invoice_number;
        }
        if self.invoice_date.is_none() {
            self.invoice_date = fallback.invoice_date;
        }
        if self.due_date.is_none() {
            self.due_date = fallback.due_date;
        }
        if self.bill_to_name.is_none() {
            self.bill_to_name = fallback.bill_to_name;
        }
        if self.bill_to_address.is_none() {
            self.bill_to_address = fallback.bill_to_address;
        }
        if self.purchase_order.is_none() {
            self.purchase_order = fallback.purchase_order;
        }
        if self.subtotal.is_none() {
            self.subtotal = fallback.subtotal;
        }
        if self.tax.is_none() {
            self.tax = fallback.tax;
        }
        if self.total.is_none() {
            self.total = fallback.total;
        }
        if self.discount.is_none() {
            self.discount = fallback.discount;
        }
        if self.items.is_empty() {
            self.items = fallback.items;
        }
    }
}

impl Default for ExtractedInvoice {
    fn default() -> Self {
        Self {
            vendor: None,
            vendor_address: None,
            vendor_email: None,
            vendor_phone: None,
            invoice_number: None,
            invoice_date: None,
            due_date: None,
            bill_to_name: None,
            bill_to_address: None,
            purchase_order: None,
            subtotal: None,
            tax: None,
            total: None,
            discount: None,
            currency: default_currency(),
            items: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_key_serialized_even_when_empty() {
        let record = ExtractedInvoice::default();
        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();

        for key in [
            "vendor",
            "vendor_address",
            "vendor_email",
            "vendor_phone",
            "invoice_number",
            "invoice_date",
            "due_date",
            "bill_to_name",
            "bill_to_address",
            "purchase_order",
            "subtotal",
            "tax",
            "total",
            "discount",
            "currency",
            "items",
        ] {
            assert!(object.contains_key(key), "missing key {key}");
        }
        assert_eq!(object.len(), 16);
        assert_eq!(object["currency"], "USD");
        assert!(object["vendor"].is_null());
        assert!(object["items"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_line_item_price_keys_are_camel_case() {
        let item = LineItem {
            description: "Widget".to_string(),
            quantity: Some(2.0),
            unit_price: Some(10.0),
            total_price: Some(20.0),
        };
        let value = serde_json::to_value(&item).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object["unitPrice"], 10.0);
        assert_eq!(object["totalPrice"], 20.0);
        assert_eq!(object["quantity"], 2.0);
    }

    #[test]
    fn test_fill_missing_keeps_resolved_fields() {
        let mut primary = ExtractedInvoice {
            vendor: Some("Acme Corp".to_string()),
            total: Some(120.0),
            ..ExtractedInvoice::default()
        };
        let fallback = ExtractedInvoice {
            vendor: Some("Wrong Vendor".to_string()),
            subtotal: Some(100.0),
            items: vec![LineItem {
                description: "Service".to_string(),
                quantity: Some(1.0),
                unit_price: Some(100.0),
                total_price: Some(100.0),
            }],
            ..ExtractedInvoice::default()
        };

        primary.fill_missing_from(fallback);

        assert_eq!(primary.vendor.as_deref(), Some("Acme Corp"));
        assert_eq!(primary.total, Some(120.0));
        assert_eq!(primary.subtotal, Some(100.0));
        assert_eq!(primary.items.len(), 1);
    }
}
