//! Block keywords of each line, read through the tokenizer.
//!
//! Only `Keyword` tokens count, so `end` inside a string or comment never
//! changes indentation. Scanner state is carried from line to line, which
//! keeps keywords inside multi-line comments and strings out as well.

use crate::document::DocumentAccess;
use crate::scanner::{scan_line, ScanState, TokenKind};

/// Keywords that open a level on the following lines.
pub const INCREASE_KEYWORDS: &[&str] = &["function", "do", "then", "else", "repeat"];

/// Keywords that close a level, on their own line.
pub const DECREASE_KEYWORDS: &[&str] = &["end", "until", "elseif", "else"];

pub fn is_increase(keyword: &str) -> bool {
    INCREASE_KEYWORDS.contains(&keyword)
}

pub fn is_decrease(keyword: &str) -> bool {
    DECREASE_KEYWORDS.contains(&keyword)
}

/// Keywords of one line that starts in `state`, and the state after it.
pub fn line_keywords(text: &str, state: ScanState) -> (Vec<String>, ScanState) {
    let scan = scan_line(text, state);
    let keywords = scan
        .tokens
        .iter()
        .filter(|tok| tok.kind == TokenKind::Keyword)
        .map(|tok| tok.text(text).to_string())
        .collect();
    (keywords, scan.end_state)
}

/// Keywords of lines `0..=last_line` of a document.
#[derive(Debug, Clone, Default)]
pub struct KeywordLines {
    lines: Vec<Vec<String>>,
}

impl KeywordLines {
    pub fn scan<D: DocumentAccess + ?Sized>(doc: &D, last_line: usize) -> Self {
        let end = (last_line + 1).min(doc.line_count());
        let mut state = ScanState::Default;
        let mut lines = Vec::with_capacity(end);
        for line in 0..end {
            let (keywords, next) = line_keywords(&doc.line_text(line), state);
            lines.push(keywords);
            state = next;
        }
        Self { lines }
    }

    /// Keywords of `line`; empty past the scanned range.
    pub fn get(&self, line: usize) -> &[String] {
        self.lines.get(line).map_or(&[], Vec::as_slice)
    }
}
