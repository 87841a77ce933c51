//
// document.rs
//
// Character-offset access to editor documents
//

use ropey::Rope;
use tower_lsp::lsp_types::Position;

/// Read access to a document by absolute character offset and by line.
///
/// Offsets are character (not byte) offsets from the start of the
/// document. Out-of-range reads yield `None` or an empty string; they never
/// panic.
pub trait DocumentAccess {
    fn len_chars(&self) -> usize;

    /// The character at `offset`, or `None` past the end.
    fn char_at(&self, offset: usize) -> Option<char>;

    fn line_count(&self) -> usize;

    /// Line containing `offset`; offsets past the end map to the last line.
    fn line_of(&self, offset: usize) -> usize;

    /// Character offset of the first character of `line`.
    fn line_start(&self, line: usize) -> usize;

    /// Text of `line` without its line terminator.
    fn line_text(&self, line: usize) -> String;

    /// Up to `len` characters starting at `offset`.
    fn text_at(&self, offset: usize, len: usize) -> String;
}

impl DocumentAccess for Rope {
    fn len_chars(&self) -> usize {
        Rope::len_chars(self)
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.get_char(offset)
    }

    fn line_count(&self) -> usize {
        self.len_lines()
    }

    fn line_of(&self, offset: usize) -> usize {
        self.char_to_line(offset.min(Rope::len_chars(self)))
    }

    fn line_start(&self, line: usize) -> usize {
        self.line_to_char(line.min(self.len_lines()))
    }

    fn line_text(&self, line: usize) -> String {
        let Some(slice) = self.get_line(line) else {
            return String::new();
        };
        let mut text = slice.to_string();
        if text.ends_with('\n') {
            text.pop();
            if text.ends_with('\r') {
                text.pop();
            }
        }
        text
    }

    fn text_at(&self, offset: usize, len: usize) -> String {
        let total = Rope::len_chars(self);
        let start = offset.min(total);
        let end = offset.saturating_add(len).min(total);
        self.slice(start..end).to_string()
    }
}

/// Convert a UTF-16 column (LSP `Position.character`) to a char column.
pub fn utf16_to_char_column(line: &str, utf16_col: u32) -> usize {
    let mut utf16_count = 0;
    let mut char_count = 0;
    for ch in line.chars() {
        if utf16_count >= utf16_col as usize {
            return char_count;
        }
        utf16_count += ch.len_utf16();
        char_count += 1;
    }
    char_count
}

/// Convert a byte column within `line` to a UTF-16 column.
pub fn byte_to_utf16_column(line: &str, byte_col: usize) -> u32 {
    let end = byte_col.min(line.len());
    line.char_indices()
        .take_while(|(idx, _)| *idx < end)
        .map(|(_, ch)| ch.len_utf16() as u32)
        .sum()
}

/// Character offset of an LSP position, clamped to the document.
pub fn position_to_offset<D: DocumentAccess + ?Sized>(doc: &D, position: Position) -> usize {
    let line = position.line as usize;
    if line >= doc.line_count() {
        return doc.len_chars();
    }
    let text = doc.line_text(line);
    doc.line_start(line) + utf16_to_char_column(&text, position.character)
}

/// LSP position of a character offset.
pub fn offset_to_position<D: DocumentAccess + ?Sized>(doc: &D, offset: usize) -> Position {
    let offset = offset.min(doc.len_chars());
    let line = doc.line_of(offset);
    let column = offset - doc.line_start(line);
    let text = doc.line_text(line);
    let utf16: usize = text.chars().take(column).map(char::len_utf16).sum();
    Position {
        line: line as u32,
        character: utf16 as u32,
    }
}
