//! Integration tests for Lua keyword indentation.
//!
//! These tests drive the on-type indentation entry point the way the
//! `textDocument/onTypeFormatting` handler does: the editor has inserted a
//! newline or an electric character, and the edit for that line is applied.
//!
//! Run with: `cargo test -p luasense --test indentation_integration`

use ropey::Rope;
use tower_lsp::lsp_types::TextEdit;

use luasense::indentation::{
    electric_characters, indent_for_new_line, on_type_indent, unindent_column, IndentationConfig,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn spaces(indent_size: u32) -> IndentationConfig {
    IndentationConfig {
        indent_size,
        tab_size: indent_size,
        insert_spaces: true,
    }
}

/// Apply a single-line indentation edit to `code`.
fn apply(code: &str, edit: &TextEdit) -> String {
    let mut lines: Vec<String> = code.split('\n').map(String::from).collect();
    let line = &mut lines[edit.range.start.line as usize];
    let end = edit.range.end.character as usize;
    *line = format!("{}{}", edit.new_text, &line[end..]);
    lines.join("\n")
}

/// Type `code` character by character. Enter asks for the new line's
/// indentation, and every electric character asks whether a closing
/// keyword was just finished, as an editor would.
fn type_out(code: &str, config: IndentationConfig) -> String {
    let electric = electric_characters();
    let mut buffer = String::new();
    for (i, raw) in code.lines().enumerate() {
        if i > 0 {
            buffer.push('\n');
            let rope = Rope::from_str(&buffer);
            if let Some(edit) = on_type_indent(&rope, i, "\n", config) {
                buffer = apply(&buffer, &edit);
            }
        }
        for c in raw.trim_start().chars() {
            buffer.push(c);
            if electric.contains(&c) {
                let rope = Rope::from_str(&buffer);
                if let Some(edit) = on_type_indent(&rope, i, &c.to_string(), config) {
                    buffer = apply(&buffer, &edit);
                }
            }
        }
    }
    buffer
}

// ============================================================================
// Whole-program typing
// ============================================================================

#[test]
fn test_typing_nested_blocks_reproduces_layout() {
    let expected = "\
local function walk(tree, visit)
    for _, node in ipairs(tree) do
        if node.children then
            walk(node.children, visit)
        elseif node.skip then
            visit(nil)
        else
            visit(node)
        end
    end
end";
    assert_eq!(type_out(expected, spaces(4)), expected);
}

#[test]
fn test_typing_repeat_until_and_callbacks() {
    let expected = "\
repeat
  n = n - 1
  on_tick(function(dt)
    step(dt)
  end)
until n == 0";
    assert_eq!(type_out(expected, spaces(2)), expected);
}

#[test]
fn test_typing_with_tabs() {
    let config = IndentationConfig {
        indent_size: 4,
        tab_size: 4,
        insert_spaces: false,
    };
    let expected = "while busy do\n\twork()\nend";
    assert_eq!(type_out(expected, config), expected);
}

// ============================================================================
// Strings and comments
// ============================================================================

#[test]
fn test_keywords_in_long_strings_are_ignored() {
    let code = "local doc = [[\nfunction do then\n]]\n";
    let rope = Rope::from_str(code);
    assert_eq!(indent_for_new_line(&rope, 3, spaces(4)), 0);
}

#[test]
fn test_end_in_comment_does_not_unindent() {
    let code = "if x then\n    y() -- the end";
    let rope = Rope::from_str(code);
    assert_eq!(unindent_column(&rope, 1, spaces(4)), None);
}

#[test]
fn test_electric_characters_cover_closing_keywords() {
    for keyword in ["end", "until", "elseif", "else"] {
        let last = keyword.chars().last().unwrap();
        assert!(electric_characters().contains(&last), "{keyword}");
    }
}
