//! Line grouping: cluster tokens into logical text lines by vertical
//! proximity.

use crate::ocr::Token;

/// Tokens grouped into one logical text line.
///
/// Lines are derived per region and never stored; callers regroup whenever
/// they restrict to a different token subset.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// Vertical position of the token that opened the line.
    pub top: i32,

    /// Member tokens in ascending `left` order.
    pub tokens: Vec<Token>,
}

impl TextLine {
    /// The line's text: member token texts joined by single spaces.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Case-insensitive substring test against the joined line text.
    pub fn contains(&self, needle: &str) -> bool {
        self.text().to_uppercase().contains(&needle.to_uppercase())
    }
}

/// Group tokens into lines.
///
/// Tokens are visited in ascending `(top, left)` order; a token joins the
/// current line while its `top` is within `tolerance` of the previously
/// placed token's, otherwise it opens a new line. One linear pass after the
/// sort; ties on `top` resolve by ascending `left`.
pub fn group_lines(tokens: &[Token], tolerance: i32) -> Vec<TextLine> {
    let mut sorted: Vec<Token> = tokens.to_vec();
    sorted.sort_by_key(|t| (t.top, t.left));

    let mut lines: Vec<TextLine> = Vec::new();
    let mut last_top: Option<i32> = None;

    for token in sorted {
        let top = token.top;
        match (last_top, lines.last_mut()) {
            (Some(previous), Some(line)) if (top - previous).abs() < tolerance => {
                line.tokens.push(token);
            }
            _ => {
                lines.push(TextLine {
                    top,
                    tokens: vec![token],
                });
            }
        }
        last_top = Some(top);
    }

    for line in &mut lines {
        line.tokens.sort_by_key(|t| t.left);
    }
    lines
}
