//! Indentation calculation for Lua blocks.
//!
//! Indentation follows block keywords only: a line that opens more levels
//! than it closes indents the next line, and a line ending in a closing
//! keyword is aligned with the line that opened its block.

use super::keywords::{is_decrease, is_increase, KeywordLines};
use crate::document::DocumentAccess;

/// Configuration for indentation calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndentationConfig {
    /// Columns per indentation level.
    pub indent_size: u32,
    /// Columns a tab advances to (the next multiple of).
    pub tab_size: u32,
    /// Whether to use spaces (true) or tabs (false) for indentation.
    pub insert_spaces: bool,
}

impl Default for IndentationConfig {
    fn default() -> Self {
        Self {
            indent_size: 4,
            tab_size: 4,
            insert_spaces: true,
        }
    }
}

/// Column of the first non-whitespace character, expanding tabs.
pub fn indentation_column(line: &str, tab_size: u32) -> u32 {
    let tab_size = tab_size.max(1);
    let mut column = 0;
    for c in line.chars() {
        match c {
            ' ' => column += 1,
            '\t' => column += tab_size - column % tab_size,
            _ => break,
        }
    }
    column
}

/// How many levels a line opens beyond the lowest depth it reaches.
///
/// Closing keywords count before opening ones so `else` dips and recovers.
///
/// ```text
/// do              => 1
/// else            => 1
/// if a then b end => 0
/// end             => 0
/// ```
pub fn line_delta(keywords: &[String]) -> i32 {
    let mut depth = 0;
    let mut min_depth = 0;
    for keyword in keywords {
        if is_decrease(keyword) {
            depth -= 1;
            min_depth = min_depth.min(depth);
        }
        if is_increase(keyword) {
            depth += 1;
        }
    }
    depth - min_depth
}

fn is_skippable(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.starts_with("--")
}

/// Target column for `line` when it is started (after Enter): the previous
/// non-blank, non-comment line's indentation plus one level per block it
/// opens.
pub fn indent_for_new_line<D: DocumentAccess + ?Sized>(
    doc: &D,
    line: usize,
    config: IndentationConfig,
) -> u32 {
    let keywords = KeywordLines::scan(doc, line);
    let Some(previous) = (0..line)
        .rev()
        .find(|&l| !is_skippable(&doc.line_text(l)))
    else {
        return 0;
    };

    let base = indentation_column(&doc.line_text(previous), config.tab_size);
    let delta = line_delta(keywords.get(previous)).max(0) as u32;
    base + delta * config.indent_size
}

/// Column a line ending in a closing keyword should move to: the
/// indentation of the line holding its opener.
///
/// `None` when the line's last keyword is not a closing keyword, when the
/// block also opens on this line (`if a then b end`), or when no opener is
/// found above.
pub fn unindent_column<D: DocumentAccess + ?Sized>(
    doc: &D,
    line: usize,
    config: IndentationConfig,
) -> Option<u32> {
    let keywords = KeywordLines::scan(doc, line);
    let own = keywords.get(line);
    if !own.last().is_some_and(|k| is_decrease(k)) {
        return None;
    }

    let mut depth = 0;
    let mut self_contained = true;
    for keyword in own {
        if is_decrease(keyword) {
            depth -= 1;
            if depth < 0 {
                self_contained = false;
            }
        }
        if is_increase(keyword) {
            depth += 1;
        }
    }
    if self_contained {
        return None;
    }

    let mut depth = 0;
    for candidate in (0..line).rev() {
        let mut opener = false;
        for keyword in keywords.get(candidate).iter().rev() {
            if is_increase(keyword) {
                depth -= 1;
                if depth < 0 {
                    opener = true;
                }
            }
            if is_decrease(keyword) {
                depth += 1;
            }
        }
        if opener {
            return Some(indentation_column(&doc.line_text(candidate), config.tab_size));
        }
    }
    None
}

/// Whether the trimmed line ends with a closing keyword's text.
pub fn ends_with_decrease_keyword(text: &str) -> bool {
    let trimmed = text.trim_end();
    super::keywords::DECREASE_KEYWORDS
        .iter()
        .any(|keyword| trimmed.ends_with(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indentation::keywords::line_keywords;
    use crate::scanner::ScanState;
    use ropey::Rope;

    fn config() -> IndentationConfig {
        IndentationConfig::default()
    }

    fn delta(line: &str) -> i32 {
        let (keywords, _) = line_keywords(line, ScanState::Default);
        line_delta(&keywords)
    }

    #[test]
    fn test_line_delta() {
        assert_eq!(delta("if a then"), 1);
        assert_eq!(delta("if a then b end"), 0);
        assert_eq!(delta("else"), 1);
        assert_eq!(delta("end"), 0);
        assert_eq!(delta("for i = 1, 3 do"), 1);
        assert_eq!(delta("local f = function() return function()"), 2);
        assert_eq!(delta("end)"), 0);
        assert_eq!(delta("print('then')"), 0);
    }

    #[test]
    fn test_indentation_column() {
        assert_eq!(indentation_column("    x", 4), 4);
        assert_eq!(indentation_column("\tx", 4), 4);
        assert_eq!(indentation_column("  \tx", 4), 4);
        assert_eq!(indentation_column("", 4), 0);
    }

    #[test]
    fn test_new_line_after_opener() {
        let rope = Rope::from_str("  if a then\n");
        assert_eq!(indent_for_new_line(&rope, 1, config()), 6);
    }

    #[test]
    fn test_new_line_after_self_contained_block() {
        let rope = Rope::from_str("  if a then b end\n");
        assert_eq!(indent_for_new_line(&rope, 1, config()), 2);
    }

    #[test]
    fn test_new_line_skips_blank_and_comment_lines() {
        let rope = Rope::from_str("function f()\n\n    -- note\n\n");
        assert_eq!(indent_for_new_line(&rope, 4, config()), 4);
    }

    #[test]
    fn test_new_line_at_start() {
        let rope = Rope::from_str("\n");
        assert_eq!(indent_for_new_line(&rope, 0, config()), 0);
    }

    #[test]
    fn test_unindent_end_to_opener() {
        let rope = Rope::from_str("  function f()\n      if x then\n      end\n      end");
        assert_eq!(unindent_column(&rope, 2, config()), Some(6));
        assert_eq!(unindent_column(&rope, 3, config()), Some(2));
    }

    #[test]
    fn test_unindent_else() {
        let rope = Rope::from_str("if a then\n    x()\n    else");
        assert_eq!(unindent_column(&rope, 2, config()), Some(0));
    }

    #[test]
    fn test_no_unindent_when_self_contained_or_not_keyword() {
        let rope = Rope::from_str("do\n    if a then b end\n    s = 'end'");
        assert_eq!(unindent_column(&rope, 1, config()), None);
        assert_eq!(unindent_column(&rope, 2, config()), None);
    }

    #[test]
    fn test_unindent_without_opener() {
        let rope = Rope::from_str("x = 1\n    end");
        assert_eq!(unindent_column(&rope, 1, config()), None);
    }

    #[test]
    fn test_ends_with_decrease_keyword() {
        assert!(ends_with_decrease_keyword("    end  "));
        assert!(ends_with_decrease_keyword("until"));
        assert!(!ends_with_decrease_keyword("ending()"));
    }
}
