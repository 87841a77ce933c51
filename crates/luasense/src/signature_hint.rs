//
// signature_hint.rs
//
// Call-site detection and parameter hints
//

use crate::cross_file::signatures::FunctionSignature;
use crate::document::DocumentAccess;
use crate::documentation::{CallTable, PredefinedCall};

/// The call whose argument list contains the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Leaf name of the called function
    pub callee: String,
    /// Offset of the callee's first character
    pub callee_start: usize,
    /// Offset of the call's `(`
    pub open_paren: usize,
}

/// One candidate signature for the hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintSignature {
    pub name: String,
    /// Empty when unknown
    pub return_type: String,
    pub parameters: Vec<String>,
}

impl HintSignature {
    /// `returnType name(a, b)`, or `name(a, b)` without a return type.
    pub fn label(&self) -> String {
        let mut label = String::new();
        if !self.return_type.is_empty() {
            label.push_str(&self.return_type);
            label.push(' ');
        }
        label.push_str(&self.name);
        label.push('(');
        label.push_str(&self.parameters.join(", "));
        label.push(')');
        label
    }

    /// Byte range of each parameter within [`label`](Self::label).
    pub fn parameter_ranges(&self) -> Vec<(usize, usize)> {
        let mut offset = if self.return_type.is_empty() {
            0
        } else {
            self.return_type.len() + 1
        };
        offset += self.name.len() + 1;

        let mut ranges = Vec::with_capacity(self.parameters.len());
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                offset += 2;
            }
            ranges.push((offset, offset + param.len()));
            offset += param.len();
        }
        ranges
    }
}

impl From<&FunctionSignature> for HintSignature {
    fn from(sig: &FunctionSignature) -> Self {
        Self {
            name: sig.qualified_name(),
            return_type: String::new(),
            parameters: sig.parameters.clone(),
        }
    }
}

impl From<&PredefinedCall> for HintSignature {
    fn from(call: &PredefinedCall) -> Self {
        Self {
            name: call.qualified_name.clone(),
            return_type: call.return_type.clone(),
            parameters: call.arguments.clone(),
        }
    }
}

/// Hint for the call at the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHint {
    pub call: CallSite,
    pub signatures: Vec<HintSignature>,
    /// Zero-based argument index, `None` when the cursor sits inside an
    /// unclosed nested bracket
    pub active_argument: Option<usize>,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Offset of the last non-whitespace character before `cursor`.
pub(crate) fn last_significant<D: DocumentAccess + ?Sized>(doc: &D, cursor: usize) -> Option<usize> {
    let mut pos = cursor.min(doc.len_chars());
    while pos > 0 {
        pos -= 1;
        if !doc.char_at(pos)?.is_whitespace() {
            return Some(pos);
        }
    }
    None
}

/// Find the call whose argument list the cursor is in.
///
/// Applies only right after `(` or `,` (whitespace skipped). Returns `None`
/// for function definition headers such as `function foo(` or
/// `local f = function(`.
pub fn call_site<D: DocumentAccess + ?Sized>(doc: &D, cursor: usize) -> Option<CallSite> {
    let trigger = last_significant(doc, cursor)?;
    if !matches!(doc.char_at(trigger), Some('(' | ',')) {
        return None;
    }

    // Walk back to the unmatched `(` of the enclosing call.
    let mut parens = 0i32;
    let mut brackets = 0i32;
    let mut braces = 0i32;
    let mut p = trigger + 1;
    let open_paren = loop {
        if p == 0 {
            return None;
        }
        p -= 1;
        match doc.char_at(p)? {
            ')' => parens += 1,
            '(' => parens -= 1,
            ']' => brackets += 1,
            '[' => brackets -= 1,
            '}' => braces += 1,
            '{' => braces -= 1,
            _ => {}
        }
        if parens == -1 && brackets == 0 && braces == 0 {
            break p;
        }
    };

    let (words, callee_start) = callee_words(doc, open_paren);
    let first = words.first()?;
    let last = words.last()?;
    if first.is_empty() || first == "function" || last == "function" {
        return None;
    }

    Some(CallSite {
        callee: first.clone(),
        callee_start,
        open_paren,
    })
}

/// Words of the chain left of `open_paren`, nearest first, and the offset
/// where the nearest one starts.
///
/// Collection ends at the first character that cannot be part of a chain,
/// or when two words follow each other without a separator (`function f`).
fn callee_words<D: DocumentAccess + ?Sized>(doc: &D, open_paren: usize) -> (Vec<String>, usize) {
    let mut words: Vec<String> = Vec::new();
    let mut current: Vec<char> = Vec::new();
    let mut start = open_paren;
    let mut last_was_word = false;
    let mut p = open_paren;

    while p > 0 {
        p -= 1;
        let Some(c) = doc.char_at(p) else {
            break;
        };

        if is_ident_char(c) {
            current.push(c);
            continue;
        }

        if c.is_whitespace() || c == '.' || c == ':' {
            if !current.is_empty() {
                push_word(&mut words, &mut current, &mut start, p + 1);
                if last_was_word {
                    return (words, start);
                }
                last_was_word = true;
            }
            if c.is_whitespace() {
                continue;
            }
            if !last_was_word {
                return (words, start);
            }
            last_was_word = false;
            continue;
        }

        push_word(&mut words, &mut current, &mut start, p + 1);
        return (words, start);
    }

    // Reached the start of the document.
    if !current.is_empty() {
        push_word(&mut words, &mut current, &mut start, 0);
    }
    (words, start)
}

/// Move the reversed characters of `current` into `words`.
fn push_word(words: &mut Vec<String>, current: &mut Vec<char>, start: &mut usize, at: usize) {
    if words.is_empty() {
        *start = at;
    }
    words.push(current.drain(..).rev().collect());
}

/// Index of the argument the cursor is in, counting top-level commas from
/// `open_paren`.
///
/// Quotes of either kind open a string literal that a backslash can escape,
/// so commas and brackets inside literals do not count. `None` when a
/// nested bracket is still open at the cursor.
pub fn active_argument<D: DocumentAccess + ?Sized>(
    doc: &D,
    open_paren: usize,
    cursor: usize,
) -> Option<usize> {
    let text = doc.text_at(open_paren, cursor.saturating_sub(open_paren));
    let mut parens = -1i32;
    let mut brackets = 0i32;
    let mut braces = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut argument = 0;

    for c in text.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => parens += 1,
            ')' => parens -= 1,
            '[' => brackets += 1,
            ']' => brackets -= 1,
            '{' => braces += 1,
            '}' => braces -= 1,
            ',' if parens == 0 && brackets == 0 && braces == 0 => argument += 1,
            _ => {}
        }
    }

    (parens == 0 && brackets == 0 && braces == 0).then_some(argument)
}

/// Signature hint at `cursor`.
///
/// Candidates are every visible signature whose leaf name is the callee,
/// followed by documented calls of that name. `None` when the cursor is not
/// in a call's argument list or nothing matches.
pub fn signature_hint<D: DocumentAccess + ?Sized>(
    doc: &D,
    cursor: usize,
    visible: &[FunctionSignature],
    documented: &CallTable,
) -> Option<SignatureHint> {
    let call = call_site(doc, cursor)?;

    let signatures: Vec<HintSignature> = visible
        .iter()
        .filter(|sig| sig.name == call.callee)
        .map(HintSignature::from)
        .chain(
            documented
                .calls_named(&call.callee)
                .iter()
                .map(HintSignature::from),
        )
        .collect();

    if signatures.is_empty() {
        log::trace!("No signatures for call to '{}'", call.callee);
        return None;
    }

    let active_argument = active_argument(doc, call.open_paren, cursor);
    Some(SignatureHint {
        call,
        signatures,
        active_argument,
    })
}
