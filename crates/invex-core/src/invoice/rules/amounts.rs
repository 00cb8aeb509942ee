//! Numeric cleaning and the count-based row amount mappings.

/// Strip everything but digits and the decimal point, then parse.
///
/// `"$1,250.00"` becomes `1250.0`; a string with no digits, or with a shape
/// the float parser rejects (e.g. two decimal points), is `None`.
pub fn clean_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Map a table row's numbers to `(quantity, unit price, total price)`.
///
/// Three or more numbers: the first three, in order. Exactly two: unit price
/// and total, quantity defaulting to 1. One: total only.
pub fn map_row_amounts(amounts: &[f64]) -> (Option<f64>, Option<f64>, Option<f64>) {
    match amounts.len() {
        0 => (None, None, None),
        1 => (None, None, Some(amounts[0])),
        2 => (Some(1.0), Some(amounts[0]), Some(amounts[1])),
        _ => (Some(amounts[0]), Some(amounts[1]), Some(amounts[2])),
    }
}

/// The same mapping over the *trailing* numeric groups of a raw text row,
/// where the rightmost number is the row total.
pub fn map_trailing_amounts(amounts: &[f64]) -> (Option<f64>, Option<f64>, Option<f64>) {
    let n = amounts.len();
    match n {
        0 => (None, None, None),
        1 => (None, None, Some(amounts[0])),
        2 => (Some(1.0), Some(amounts[0]), Some(amounts[1])),
        _ => (
            Some(amounts[n - 3]),
            Some(amounts[n - 2]),
            Some(amounts[n - 1]),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_amount() {
        assert_eq!(clean_amount("20.00"), Some(20.0));
        assert_eq!(clean_amount("$1,250.00"), Some(1250.0));
        assert_eq!(clean_amount("1,000"), Some(1000.0));
        assert_eq!(clean_amount("Widget"), None);
        assert_eq!(clean_amount(""), None);
        assert_eq!(clean_amount("1.2.3"), None);
    }

    #[test]
    fn test_three_numbers_map_in_order() {
        let (qty, unit, total) = map_row_amounts(&[2.0, 10.0, 20.0]);
        assert_eq!(qty, Some(2.0));
        assert_eq!(unit, Some(10.0));
        assert_eq!(total, Some(20.0));
    }

    #[test]
    fn test_two_numbers_default_quantity() {
        let (qty, unit, total) = map_row_amounts(&[50.0, 50.0]);
        assert_eq!(qty, Some(1.0));
        assert_eq!(unit, Some(50.0));
        assert_eq!(total, Some(50.0));
    }

    #[test]
    fn test_one_number_is_the_total() {
        let (qty, unit, total) = map_row_amounts(&[75.0]);
        assert_eq!(qty, None);
        assert_eq!(unit, None);
        assert_eq!(total, Some(75.0));
    }

    #[test]
    fn test_trailing_mapping_takes_the_last_three() {
        let (qty, unit, total) = map_trailing_amounts(&[7.0, 2.0, 10.0, 20.0]);
        assert_eq!(qty, Some(2.0));
        assert_eq!(unit, Some(10.0));
        assert_eq!(total, Some(20.0));
    }
}
