//! Lua keyword indentation
//!
//! This module indents Lua code through the LSP `textDocument/onTypeFormatting`
//! handler. Block keywords decide the indentation: a new line is indented one
//! level per block the previous line leaves open, and typing the last letter
//! of a closing keyword aligns the line with its opener.
//!
//! # Architecture
//!
//! - `keywords`: Reads block keywords of each line through the tokenizer
//! - `calculator`: Computes the target column for new and closing lines
//! - `formatter`: Generates the LSP TextEdit replacing the indentation

use tower_lsp::lsp_types::{DocumentOnTypeFormattingOptions, TextEdit};

use crate::document::DocumentAccess;

mod calculator;
mod formatter;
mod keywords;

pub use calculator::{
    ends_with_decrease_keyword, indent_for_new_line, indentation_column, line_delta,
    unindent_column, IndentationConfig,
};
pub use formatter::format_indentation;
pub use keywords::{line_keywords, KeywordLines, DECREASE_KEYWORDS, INCREASE_KEYWORDS};

/// Last letters of the closing keywords, deduplicated.
pub fn electric_characters() -> Vec<char> {
    let mut chars: Vec<char> = Vec::new();
    for keyword in DECREASE_KEYWORDS {
        if let Some(c) = keyword.chars().last() {
            if !chars.contains(&c) {
                chars.push(c);
            }
        }
    }
    chars
}

/// Returns the LSP capability options for on-type formatting.
///
/// Registers trigger characters:
/// - `\n`: indentation of the new line when the user presses Enter
/// - the electric characters: unindent of a finished closing keyword
pub fn on_type_formatting_capability() -> DocumentOnTypeFormattingOptions {
    DocumentOnTypeFormattingOptions {
        first_trigger_character: "\n".to_string(),
        more_trigger_character: Some(
            electric_characters()
                .into_iter()
                .map(String::from)
                .collect(),
        ),
    }
}

/// Indentation edit for `line` after `typed` was entered on it.
///
/// A line ending in a closing keyword is aligned with its opener; after a
/// newline any other line gets the new-line indentation. Electric
/// characters that do not finish a closing keyword produce no edit, and so
/// does a line that already has the target indentation.
pub fn on_type_indent<D: DocumentAccess + ?Sized>(
    doc: &D,
    line: usize,
    typed: &str,
    config: IndentationConfig,
) -> Option<TextEdit> {
    let text = doc.line_text(line);
    let target = if ends_with_decrease_keyword(&text) {
        unindent_column(doc, line, config)?
    } else if typed == "\n" {
        indent_for_new_line(doc, line, config)
    } else {
        return None;
    };

    if indentation_column(&text, config.tab_size) == target
        && !(text.contains('\t') && config.insert_spaces)
    {
        return None;
    }
    log::trace!("On-type indent: line {} to column {}", line, target);
    Some(format_indentation(line as u32, &text, target, config))
}
