//! TextEdit generation for Lua indentation.
//!
//! The edit replaces a line's whole leading whitespace, so the result does
//! not depend on what the editor inserted on its own.

use tower_lsp::lsp_types::{Position, Range, TextEdit};

use super::calculator::IndentationConfig;

/// Replace the leading whitespace of `line` (whose text is `text`) with
/// indentation reaching `target_column`.
pub fn format_indentation(
    line: u32,
    text: &str,
    target_column: u32,
    config: IndentationConfig,
) -> TextEdit {
    // Leading whitespace is ASCII, so its UTF-16 length is its char count.
    let existing = text.chars().take_while(|c| *c == ' ' || *c == '\t').count();

    TextEdit {
        range: Range {
            start: Position { line, character: 0 },
            end: Position {
                line,
                character: existing as u32,
            },
        },
        new_text: generate_whitespace(target_column, &config),
    }
}

/// Spaces only, or tabs padded with spaces up to the target column.
fn generate_whitespace(target_column: u32, config: &IndentationConfig) -> String {
    if config.insert_spaces {
        return " ".repeat(target_column as usize);
    }
    let tab_size = config.tab_size.max(1);
    let mut result = "\t".repeat((target_column / tab_size) as usize);
    result.push_str(&" ".repeat((target_column % tab_size) as usize));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_config(tab_size: u32, insert_spaces: bool) -> IndentationConfig {
        IndentationConfig {
            indent_size: tab_size,
            tab_size,
            insert_spaces,
        }
    }

    #[test]
    fn test_generate_whitespace_spaces() {
        let config = make_config(2, true);
        assert_eq!(generate_whitespace(0, &config), "");
        assert_eq!(generate_whitespace(4, &config), "    ");
    }

    #[test]
    fn test_generate_whitespace_tabs_with_trailing_spaces() {
        let config = make_config(4, false);
        assert_eq!(generate_whitespace(8, &config), "\t\t");
        assert_eq!(generate_whitespace(6, &config), "\t  ");
    }

    #[test]
    fn test_generate_whitespace_tab_size_zero() {
        let config = make_config(0, false);
        assert_eq!(generate_whitespace(3, &config), "\t\t\t");
    }

    #[test]
    fn test_format_indentation_replaces_existing() {
        let edit = format_indentation(3, " \t  end", 4, make_config(4, true));
        assert_eq!(edit.range.start, Position { line: 3, character: 0 });
        assert_eq!(edit.range.end, Position { line: 3, character: 4 });
        assert_eq!(edit.new_text, "    ");
    }

    #[test]
    fn test_format_indentation_empty_line() {
        let edit = format_indentation(0, "", 2, make_config(2, true));
        assert_eq!(edit.range.end.character, 0);
        assert_eq!(edit.new_text, "  ");
    }

    proptest! {
        #[test]
        fn prop_tabs_and_spaces_reach_target(target in 0u32..200, tab_size in 1u32..9) {
            let config = make_config(tab_size, false);
            let ws = generate_whitespace(target, &config);
            let width = crate::indentation::calculator::indentation_column(&format!("{ws}x"), tab_size);
            prop_assert_eq!(width, target);
        }
    }
}
