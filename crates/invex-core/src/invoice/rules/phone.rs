//! Phone-number artifact normalization.
//!
//! A leading `9` on an international number is the usual OCR misread of a
//! `+` sign; the rewrite replaces it and keeps digits only.

use super::patterns::PHONE;

/// Normalize an OCR phone candidate.
///
/// Leading `9` (and no `+`): rewritten to `'+'` followed by the digits of
/// the remainder. Leading `+`: kept, remainder digit-filtered. Anything
/// else passes through trimmed.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix('+') {
        let digits = digits_only(rest);
        if digits.is_empty() {
            return None;
        }
        Some(format!("+{digits}"))
    } else if let Some(rest) = trimmed.strip_prefix('9') {
        let digits = digits_only(rest);
        if digits.is_empty() {
            return None;
        }
        Some(format!("+{digits}"))
    } else {
        Some(trimmed.to_string())
    }
}

/// Find a phone number in free text.
///
/// The digit pattern cannot match a `+` the OCR separated from its number,
/// so the 3 characters immediately preceding the match are checked for a
/// stray `+` and it is reattached before normalization.
pub fn find_phone(text: &str) -> Option<String> {
    let m = PHONE.find(text)?;
    let mut candidate = m.as_str().trim().to_string();
    if !candidate.starts_with('+') {
        let preceding_start = m.start().saturating_sub(3);
        let preceding = text.get(preceding_start..m.start()).unwrap_or("");
        if preceding.contains('+') {
            candidate = format!("+{candidate}");
        }
    }
    normalize_phone(&candidate)
}

fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_nine_becomes_plus() {
        // '+' + digits of the remainder, nothing else.
        assert_eq!(normalize_phone("9155551234").as_deref(), Some("+155551234"));
    }

    #[test]
    fn test_explicit_plus_is_digit_filtered() {
        assert_eq!(
            normalize_phone("+1 (555) 555-1234").as_deref(),
            Some("+15555551234")
        );
    }

    #[test]
    fn test_other_prefixes_pass_through() {
        assert_eq!(
            normalize_phone("555-123-4567").as_deref(),
            Some("555-123-4567")
        );
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(normalize_phone(""), None);
        assert_eq!(normalize_phone("   "), None);
    }

    #[test]
    fn test_find_phone_in_text() {
        let text = "Acme Corp\nbilling@acme.example\n9155551234\n";
        assert_eq!(find_phone(text).as_deref(), Some("+155551234"));
    }

    #[test]
    fn test_find_phone_reattaches_split_plus() {
        // The regex digit class cannot include the '+' when OCR inserted a
        // stray character between it and the number.
        let text = "Phone: +x1 555 555 1234";
        assert_eq!(find_phone(text).as_deref(), Some("+15555551234"));
    }
}
