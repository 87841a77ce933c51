/// Reserved words and fixed word pools for Lua.
///
/// This module provides the Lua keyword set used by the tokenizer, the
/// metamethod names that get their own token category, and the keyword
/// pools offered by the completion assembler.

/// Complete list of Lua 5.3 reserved words.
pub const RESERVED_WORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Metamethod names recognized as magic attributes.
pub const MAGIC_METHODS: &[&str] = &[
    "__index",
    "__newindex",
    "__concat",
    "__call",
    "__add",
    "__band",
    "__bnot",
    "__bor",
    "__bxor",
    "__div",
    "__eq",
    "__idiv",
    "__le",
    "__len",
    "__lt",
    "__mod",
    "__mul",
    "__pow",
    "__shl",
    "__shr",
    "__sub",
    "__unm",
];

/// Self-reference keyword offered in every completion context.
pub const SELF_KEYWORDS: &[&str] = &["self"];

/// Declaration keywords.
pub const DECLARATION_KEYWORDS: &[&str] = &["local"];

/// Keywords that begin or structure statements.
pub const STATEMENT_KEYWORDS: &[&str] = &[
    "break", "do", "else", "elseif", "end", "for", "function", "goto", "if", "in", "repeat",
    "return", "then", "until", "while",
];

/// Literal and logical-operator keywords, valid inside expressions.
pub const LITERAL_KEYWORDS: &[&str] = &["true", "false", "nil", "and", "not", "or"];

/// Check if a name is a Lua reserved word.
///
/// The check is case-sensitive.
///
/// # Examples
///
/// ```
/// use luasense::reserved_words::is_reserved_word;
///
/// assert!(is_reserved_word("local"));
/// assert!(is_reserved_word("elseif"));
/// assert!(!is_reserved_word("self"));
/// assert!(!is_reserved_word("End"));
/// ```
pub fn is_reserved_word(name: &str) -> bool {
    matches!(
        name,
        "and"
            | "break"
            | "do"
            | "else"
            | "elseif"
            | "end"
            | "false"
            | "for"
            | "function"
            | "goto"
            | "if"
            | "in"
            | "local"
            | "nil"
            | "not"
            | "or"
            | "repeat"
            | "return"
            | "then"
            | "true"
            | "until"
            | "while"
    )
}

/// Check if a name is one of the metamethod names.
pub fn is_magic_method(name: &str) -> bool {
    name.starts_with("__") && MAGIC_METHODS.contains(&name)
}
