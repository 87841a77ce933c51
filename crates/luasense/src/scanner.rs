//
// scanner.rs
//
// Line-incremental Lua tokenizer
//
// Each line is scanned on its own. Long comments and long strings that are
// still open at the end of a line are carried to the next line through
// `ScanState`, which the host stores per line (as a small integer) and
// feeds back when it re-highlights the following line.
//

use crate::reserved_words::{is_magic_method, is_reserved_word};

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    String,
    /// Declared local name (the name after `local`) or `self`
    Local,
    /// Identifier accessed through `.` or `:`
    Field,
    /// Metamethod name such as `__index`
    MagicAttr,
    Keyword,
    Operator,
    MultiLineComment,
    Comment,
    Identifier,
    Whitespace,
    /// Module name literal of a `require` call
    RequiredModule,
    /// Zero-length terminator emitted at the end of every line
    EndOfBlock,
}

impl TokenKind {
    /// All kinds, in the order of their legend index.
    pub const ALL: [TokenKind; 13] = [
        TokenKind::Number,
        TokenKind::String,
        TokenKind::Local,
        TokenKind::Field,
        TokenKind::MagicAttr,
        TokenKind::Keyword,
        TokenKind::Operator,
        TokenKind::MultiLineComment,
        TokenKind::Comment,
        TokenKind::Identifier,
        TokenKind::Whitespace,
        TokenKind::RequiredModule,
        TokenKind::EndOfBlock,
    ];

    /// Position of this kind in [`TokenKind::ALL`].
    pub fn legend_index(self) -> u32 {
        self as u32
    }

    /// Whitespace, comments and the end-of-block marker.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::Comment
                | TokenKind::MultiLineComment
                | TokenKind::EndOfBlock
        )
    }

    /// Name-like tokens (identifiers and their refined categories).
    pub fn is_name(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier | TokenKind::Local | TokenKind::Field | TokenKind::MagicAttr
        )
    }
}

/// A classified byte span within one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first byte within the line
    pub start: usize,
    /// Length in bytes
    pub len: usize,
}

impl Token {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// The text this token covers in `line`.
    pub fn text<'a>(&self, line: &'a str) -> &'a str {
        line.get(self.start..self.end()).unwrap_or("")
    }
}

/// Lexer state carried from one line to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Default,
    /// Inside `--[==[ ... ]==]` with the given number of `=`
    InLongComment(usize),
    /// Inside `[==[ ... ]==]` with the given number of `=`
    InLongString(usize),
}

impl ScanState {
    /// Encode as the integer a host stores per line.
    ///
    /// `Default` is 0, long strings are odd and long comments are even.
    pub fn to_raw(self) -> i32 {
        match self {
            ScanState::Default => 0,
            ScanState::InLongString(level) => level_to_raw(level).saturating_mul(2).saturating_add(1),
            ScanState::InLongComment(level) => level_to_raw(level).saturating_mul(2).saturating_add(2),
        }
    }

    /// Decode a stored integer. Negative values (the host's "no previous
    /// state" sentinel) normalize to `Default`.
    pub fn from_raw(raw: i32) -> Self {
        if raw <= 0 {
            ScanState::Default
        } else if raw % 2 == 1 {
            ScanState::InLongString(((raw - 1) / 2) as usize)
        } else {
            ScanState::InLongComment(((raw - 2) / 2) as usize)
        }
    }
}

fn level_to_raw(level: usize) -> i32 {
    i32::try_from(level).unwrap_or(i32::MAX / 2)
}

/// Result of scanning one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineScan {
    pub tokens: Vec<Token>,
    /// State to feed into the next line
    pub end_state: ScanState,
}

impl LineScan {
    /// Tokens that carry meaning (no whitespace, comments or end marker).
    pub fn significant(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| !t.kind.is_trivia())
    }

    /// Byte offset of the first comment on the line, if any.
    pub fn comment_start(&self) -> Option<usize> {
        self.tokens
            .iter()
            .find(|t| matches!(t.kind, TokenKind::Comment | TokenKind::MultiLineComment))
            .map(|t| t.start)
    }
}

/// Scan one line starting in `state`.
///
/// Tokens partition the line exactly and the last token is always
/// `EndOfBlock`. Never fails: unknown characters become one-character
/// identifiers.
pub fn scan_line(text: &str, state: ScanState) -> LineScan {
    let mut lexer = LineLexer {
        text,
        bytes: text.as_bytes(),
        pos: 0,
        state,
        tokens: Vec::new(),
        last_significant: None,
        in_local_list: false,
    };
    lexer.run();
    LineScan {
        tokens: lexer.tokens,
        end_state: lexer.state,
    }
}

/// Scan a line for display.
///
/// On top of [`scan_line`], a `require` call marks its module name string
/// as `RequiredModule`; when the line starts with `require`, every
/// following identifier is treated as part of the module reference too.
pub fn highlight_line(text: &str, state: ScanState) -> LineScan {
    let mut scan = scan_line(text, state);

    let first = scan
        .tokens
        .iter()
        .position(|t| t.kind != TokenKind::Whitespace && t.kind != TokenKind::EndOfBlock);

    let mut idx = 0;
    while idx < scan.tokens.len() {
        let tok = scan.tokens[idx];
        if tok.kind == TokenKind::Identifier && tok.text(text) == "require" {
            scan.tokens[idx].kind = TokenKind::Keyword;
            let line_start_import = first == Some(idx);
            for follower in scan.tokens[idx + 1..].iter_mut() {
                match follower.kind {
                    TokenKind::String => follower.kind = TokenKind::RequiredModule,
                    TokenKind::Identifier if line_start_import => {
                        follower.kind = TokenKind::RequiredModule
                    }
                    TokenKind::Whitespace => {}
                    TokenKind::Operator if follower.text(text) == "(" => {}
                    _ if line_start_import => {}
                    _ => break,
                }
            }
        }
        idx += 1;
    }

    scan
}

/// Highlight every line of `text`, starting from the default state and
/// feeding each line's end state to the next line.
pub fn highlight_document(text: &str) -> Vec<LineScan> {
    let mut state = ScanState::Default;
    text.lines()
        .map(|line| {
            let scan = highlight_line(line, state);
            state = scan.end_state;
            scan
        })
        .collect()
}

/// Three, two and one byte operators, longest first.
const OPERATORS: &[&str] = &[
    "...", "..", "==", "~=", "<=", ">=", "//", "::", "<<", ">>", "+", "-", "*", "/", "%", "^",
    "#", "&", "~", "|", "<", ">", "=", "(", ")", "{", "}", "[", "]", ";", ":", ",", ".",
];

struct LineLexer<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    state: ScanState,
    tokens: Vec<Token>,
    last_significant: Option<Token>,
    in_local_list: bool,
}

impl<'a> LineLexer<'a> {
    fn run(&mut self) {
        match self.state {
            ScanState::InLongComment(level) => {
                self.continue_long(0, level, TokenKind::MultiLineComment)
            }
            ScanState::InLongString(level) => self.continue_long(0, level, TokenKind::String),
            ScanState::Default => {}
        }

        while self.pos < self.bytes.len() {
            self.read_token();
        }

        self.tokens.push(Token {
            kind: TokenKind::EndOfBlock,
            start: self.bytes.len(),
            len: 0,
        });
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        if self.pos <= start {
            return;
        }
        let token = Token {
            kind,
            start,
            len: self.pos - start,
        };
        self.tokens.push(token);
        if !kind.is_trivia() {
            self.last_significant = Some(token);
        }
    }

    /// Consume up to the closing long bracket of `level`, or to the end of
    /// the line if it does not close here.
    fn continue_long(&mut self, start: usize, level: usize, kind: TokenKind) {
        match find_long_close(self.bytes, self.pos, level) {
            Some(end) => {
                self.pos = end;
                self.state = ScanState::Default;
            }
            None => {
                self.pos = self.bytes.len();
                self.state = if kind == TokenKind::String {
                    ScanState::InLongString(level)
                } else {
                    ScanState::InLongComment(level)
                };
            }
        }
        self.push(kind, start);
    }

    fn read_token(&mut self) {
        let start = self.pos;
        let b = self.bytes[start];

        if b.is_ascii_whitespace() {
            while self.peek(0).is_some_and(|c| c.is_ascii_whitespace()) {
                self.pos += 1;
            }
            self.push(TokenKind::Whitespace, start);
            return;
        }

        if b == b'-' && self.peek(1) == Some(b'-') {
            self.pos += 2;
            if let Some(level) = long_bracket_level(self.bytes, self.pos) {
                self.pos += level + 2;
                self.continue_long(start, level, TokenKind::MultiLineComment);
            } else {
                self.pos = self.bytes.len();
                self.push(TokenKind::Comment, start);
            }
            return;
        }

        if b == b'[' {
            if let Some(level) = long_bracket_level(self.bytes, start) {
                self.pos += level + 2;
                self.continue_long(start, level, TokenKind::String);
                return;
            }
        }

        if b == b'"' || b == b'\'' {
            self.read_short_string(b);
            self.push(TokenKind::String, start);
            return;
        }

        if b.is_ascii_digit() || (b == b'.' && self.peek(1).is_some_and(|c| c.is_ascii_digit())) {
            self.read_number();
            self.push(TokenKind::Number, start);
            return;
        }

        if b.is_ascii_alphabetic() || b == b'_' {
            while self
                .peek(0)
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
            {
                self.pos += 1;
            }
            let kind = self.classify_name(&self.text[start..self.pos]);
            self.in_local_list = match kind {
                TokenKind::Keyword => &self.text[start..self.pos] == "local",
                TokenKind::Local => self.in_local_list,
                _ => false,
            };
            self.push(kind, start);
            return;
        }

        if let Some(op) = OPERATORS
            .iter()
            .find(|op| self.bytes[start..].starts_with(op.as_bytes()))
        {
            self.pos += op.len();
            if *op != "," {
                self.in_local_list = false;
            }
            self.push(TokenKind::Operator, start);
            return;
        }

        // Anything else degrades to a single-character identifier.
        let width = self.text[start..].chars().next().map_or(1, char::len_utf8);
        self.pos += width;
        self.in_local_list = false;
        self.push(TokenKind::Identifier, start);
    }

    fn classify_name(&self, word: &str) -> TokenKind {
        if is_reserved_word(word) {
            return TokenKind::Keyword;
        }
        if is_magic_method(word) {
            return TokenKind::MagicAttr;
        }
        if word == "self" || self.in_local_list {
            return TokenKind::Local;
        }
        match self.last_significant {
            Some(prev) if prev.kind == TokenKind::Operator => {
                match prev.text(self.text) {
                    "." | ":" => TokenKind::Field,
                    _ => TokenKind::Identifier,
                }
            }
            _ => TokenKind::Identifier,
        }
    }

    /// Consume a quoted string. Backslash escapes the next byte. An
    /// unterminated string ends at the end of the line.
    fn read_short_string(&mut self, quote: u8) {
        self.pos += 1;
        while let Some(c) = self.peek(0) {
            self.pos += 1;
            if c == b'\\' {
                if self.pos < self.bytes.len() {
                    self.pos += 1;
                }
            } else if c == quote {
                return;
            }
        }
        // Escapes may have stepped into a multi-byte character; realign.
        while !self.text.is_char_boundary(self.pos) {
            self.pos += 1;
        }
    }

    fn read_number(&mut self) {
        let hex = self.bytes[self.pos] == b'0' && matches!(self.peek(1), Some(b'x' | b'X'));
        if hex {
            self.pos += 2;
        }
        while let Some(c) = self.peek(0) {
            let exponent = if hex {
                matches!(c, b'p' | b'P')
            } else {
                matches!(c, b'e' | b'E')
            };
            if exponent {
                self.pos += 1;
                if matches!(self.peek(0), Some(b'+' | b'-')) {
                    self.pos += 1;
                }
            } else if c.is_ascii_digit() || c == b'.' || (hex && c.is_ascii_hexdigit()) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }
}

/// If `bytes[at..]` opens a long bracket (`[`, any number of `=`, `[`),
/// return the number of `=`.
fn long_bracket_level(bytes: &[u8], at: usize) -> Option<usize> {
    if bytes.get(at) != Some(&b'[') {
        return None;
    }
    let mut level = 0;
    while bytes.get(at + 1 + level) == Some(&b'=') {
        level += 1;
    }
    (bytes.get(at + 1 + level) == Some(&b'[')).then_some(level)
}

/// Find the end (exclusive) of the closing long bracket of `level`.
fn find_long_close(bytes: &[u8], from: usize, level: usize) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b']' {
            let eqs = bytes[i + 1..]
                .iter()
                .take(level)
                .filter(|&&c| c == b'=')
                .count();
            if eqs == level && bytes.get(i + 1 + level) == Some(&b']') {
                return Some(i + level + 2);
            }
        }
        i += 1;
    }
    None
}
