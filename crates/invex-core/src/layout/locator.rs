//! Label-proximity location: find the token that carries a label's value.

use std::cmp::Ordering;

use crate::ocr::Token;

/// How to search for a label's value token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Value sits to the right of the label, on roughly the same line.
    Right,
    /// Value sits anywhere within a tolerance window around the label; the
    /// candidate closest to the label's right edge wins.
    Proximity,
}

/// A located label token: its bounding box plus the index identifying it in
/// the searched slice, so the value search can exclude it.
#[derive(Debug, Clone)]
pub struct LabelMatch {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    index: usize,
}

impl LabelMatch {
    /// Right edge of the label box.
    pub fn right(&self) -> i32 {
        self.left + self.width
    }
}

/// Find the first token containing `label` (case-insensitive substring).
pub fn find_label(tokens: &[Token], label: &str) -> Option<LabelMatch> {
    let needle = label.to_uppercase();
    tokens
        .iter()
        .enumerate()
        .find(|(_, t)| t.text.to_uppercase().contains(&needle))
        .map(|(index, t)| LabelMatch {
            left: t.left,
            top: t.top,
            width: t.width,
            height: t.height,
            index,
        })
}

/// Locate the value token for `label`, or `None`.
///
/// Absence - of the label or of any qualifying candidate - is a normal
/// outcome, never an error.
pub fn locate_value<'a>(
    tokens: &'a [Token],
    label: &str,
    mode: SearchMode,
    tolerance: i32,
) -> Option<&'a Token> {
    let label_match = find_label(tokens, label)?;
    value_for(tokens, &label_match, mode, tolerance)
}

/// Search value candidates for an already-located label. The label token
/// itself never qualifies.
pub fn value_for<'a>(
    tokens: &'a [Token],
    label: &LabelMatch,
    mode: SearchMode,
    tolerance: i32,
) -> Option<&'a Token> {
    match mode {
        SearchMode::Right => {
            let mut candidates: Vec<&Token> = tokens
                .iter()
                .enumerate()
                .filter(|&(i, t)| {
                    i != label.index
                        && t.left >= label.left + label.width
                        && (t.top - label.top).abs() <= tolerance
                })
                .map(|(_, t)| t)
                .collect();
            candidates.sort_by_key(|t| t.left);
            candidates.into_iter().next()
        }
        SearchMode::Proximity => tokens
            .iter()
            .enumerate()
            .filter(|&(i, t)| {
                i != label.index
                    && t.left >= label.left - tolerance
                    && t.left <= label.right() + tolerance
                    && (t.top - label.top).abs() <= tolerance
            })
            .map(|(_, t)| t)
            .min_by(|a, b| {
                distance_from_right_edge(label, a)
                    .partial_cmp(&distance_from_right_edge(label, b))
                    .unwrap_or(Ordering::Equal)
            }),
    }
}

fn distance_from_right_edge(label: &LabelMatch, token: &Token) -> f64 {
    let dx = (token.left - label.right()) as f64;
    let dy = (token.top - label.top) as f64;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, left: i32, top: i32, width: i32) -> Token {
        Token {
            text: text.to_string(),
            left,
            top,
            width,
            height: 14,
            confidence: 90.0,
        }
    }

    #[test]
    fn test_right_mode_takes_leftmost_candidate() {
        let tokens = vec![
            token("Subtotal:", 500, 700, 80),
            token("100.00", 620, 703, 50),
            token("extra", 700, 698, 40),
        ];

        let value = locate_value(&tokens, "subtotal", SearchMode::Right, 50).unwrap();
        assert_eq!(value.text, "100.00");
    }

    #[test]
    fn test_right_mode_ignores_tokens_left_of_label_end() {
        let tokens = vec![
            token("Date:", 500, 200, 40),
            token("Invoice", 400, 201, 60),
            token("01/15/2024", 560, 202, 80),
        ];

        let value = locate_value(&tokens, "Date", SearchMode::Right, 50).unwrap();
        assert_eq!(value.text, "01/15/2024");
    }

    #[test]
    fn test_right_mode_respects_vertical_tolerance() {
        let tokens = vec![
            token("Total:", 500, 700, 50),
            token("999.99", 600, 800, 50),
        ];

        assert!(locate_value(&tokens, "Total", SearchMode::Right, 50).is_none());
    }

    #[test]
    fn test_proximity_mode_minimizes_distance_from_right_edge() {
        let tokens = vec![
            token("Qty", 300, 400, 30),
            token("far", 300, 440, 30),
            token("2", 340, 402, 12),
        ];

        let value = locate_value(&tokens, "Qty", SearchMode::Proximity, 50).unwrap();
        assert_eq!(value.text, "2");
    }

    #[test]
    fn test_label_token_is_never_its_own_value() {
        let tokens = vec![token("Qty", 300, 400, 30)];
        assert!(locate_value(&tokens, "Qty", SearchMode::Proximity, 50).is_none());
    }

    #[test]
    fn test_missing_label_is_none() {
        let tokens = vec![token("something", 10, 10, 60)];
        assert!(locate_value(&tokens, "Subtotal", SearchMode::Right, 50).is_none());
    }
}
