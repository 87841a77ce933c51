//
// scope.rs
//
// Heuristic reconstruction of visible names and member chains
//
// Nothing here evaluates code. Bindings are recognized from token patterns
// (`local a = ...`, `a.b = ...`, `function a:b(...)`, `for k, v in ...`),
// and table constructors or aliases on the right-hand side contribute known
// members. The result can over- or under-report for non-trivial control
// flow.
//

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::document::DocumentAccess;
use crate::scanner::{scan_line, ScanState, TokenKind};

/// A name's known next-level members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeNode {
    children: IndexMap<String, ScopeNode>,
}

impl ScopeNode {
    pub fn child(&self, name: &str) -> Option<&ScopeNode> {
        self.children.get(name)
    }

    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Descend one level per segment. `None` if any step is unknown.
    pub fn lookup<S: AsRef<str>>(&self, segments: &[S]) -> Option<&ScopeNode> {
        let mut node = self;
        for segment in segments {
            node = node.children.get(segment.as_ref())?;
        }
        Some(node)
    }

    /// The node at `path`, created (with empty parents) if missing.
    fn entry_path(&mut self, path: &[String]) -> &mut ScopeNode {
        let mut node = self;
        for segment in path {
            node = node.children.entry(segment.clone()).or_default();
        }
        node
    }

    /// Add members of `other` that are not yet known here, skipping every
    /// member whose full path (`path` plus the member chain) is in `sealed`.
    fn merge_unsealed(
        &mut self,
        other: &ScopeNode,
        path: &mut Vec<String>,
        sealed: &HashSet<Vec<String>>,
    ) {
        for (name, child) in &other.children {
            path.push(name.clone());
            if !sealed.contains(path.as_slice()) {
                self.children
                    .entry(name.clone())
                    .or_default()
                    .merge_unsealed(child, path, sealed);
            }
            path.pop();
        }
    }

    /// Add members of `other` that are not yet known here.
    fn merge_missing(&mut self, other: &ScopeNode) {
        self.merge_unsealed(other, &mut Vec::new(), &HashSet::new());
    }
}

/// The identifier chain typed left of the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypedChain {
    /// Complete segments before the last separator, outermost first
    pub segments: Vec<String>,
    /// Identifier characters directly left of the cursor
    pub partial: String,
    /// Character offset where the chain begins
    pub start: usize,
}

/// Significant token of the scanned prefix.
#[derive(Debug, Clone)]
struct Word {
    kind: TokenKind,
    text: String,
}

impl Word {
    fn is(&self, text: &str) -> bool {
        self.text == text && !matches!(self.kind, TokenKind::String | TokenKind::Number)
    }

    fn is_keyword(&self, text: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == text
    }

    fn is_name(&self) -> bool {
        self.kind.is_name()
            && self
                .text
                .chars()
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_')
    }
}

/// One binding in document order.
#[derive(Debug)]
struct Binding {
    path: Vec<String>,
    members: ScopeNode,
    alias: Option<Vec<String>>,
}

impl Binding {
    fn plain(path: Vec<String>) -> Self {
        Self {
            path,
            members: ScopeNode::default(),
            alias: None,
        }
    }
}

/// Right-hand side value shape of an assignment.
#[derive(Debug, Default)]
struct Value {
    members: ScopeNode,
    alias: Option<Vec<String>>,
}

/// Names visible at `cursor` and their known members.
///
/// Lines before the cursor line are tokenized forward so long comments and
/// strings are skipped; the recognized bindings are then applied from the
/// closest to the farthest. A full binding of a path hides every earlier
/// statement about that path, including members an earlier constructor
/// gave it. Member assignments add children without hiding the parent.
pub fn visible_scope<D: DocumentAccess + ?Sized>(doc: &D, cursor: usize) -> ScopeNode {
    let words = significant_words(doc, doc.line_of(cursor));
    let bindings = collect_bindings(&words);

    let mut root = ScopeNode::default();
    let mut sealed: HashSet<Vec<String>> = HashSet::new();
    let mut aliases = Vec::new();

    for binding in bindings.iter().rev() {
        let hidden = (1..=binding.path.len()).any(|n| sealed.contains(&binding.path[..n]));
        if hidden {
            continue;
        }
        let mut path = binding.path.clone();
        root.entry_path(&binding.path)
            .merge_unsealed(&binding.members, &mut path, &sealed);
        if let Some(source) = &binding.alias {
            aliases.push((binding.path.clone(), source.clone()));
        }
        sealed.insert(binding.path.clone());
    }

    // Aliases share the table they point to, so they see its final members.
    for (target, source) in aliases.iter().rev() {
        if let Some(members) = root.lookup(source).cloned() {
            let mut path = target.clone();
            root.entry_path(target)
                .merge_unsealed(&members, &mut path, &sealed);
        }
    }

    log::trace!(
        "Visible scope at offset {}: {} bindings, {} top-level names",
        cursor,
        bindings.len(),
        root.len()
    );
    root
}

fn significant_words<D: DocumentAccess + ?Sized>(doc: &D, end_line: usize) -> Vec<Word> {
    let mut words = Vec::new();
    let mut state = ScanState::Default;
    for line in 0..end_line {
        let text = doc.line_text(line);
        let scan = scan_line(&text, state);
        state = scan.end_state;
        words.extend(scan.significant().map(|tok| Word {
            kind: tok.kind,
            text: tok.text(&text).to_string(),
        }));
    }
    words
}

fn collect_bindings(words: &[Word]) -> Vec<Binding> {
    let mut bindings = Vec::new();
    let mut brace_depth = 0usize;
    let mut i = 0;

    while i < words.len() {
        let word = &words[i];

        if word.is("{") {
            brace_depth += 1;
            i += 1;
            continue;
        }
        if word.is("}") {
            brace_depth = brace_depth.saturating_sub(1);
            i += 1;
            continue;
        }
        // Table constructor fields are handled by `parse_table`.
        if brace_depth > 0 {
            i += 1;
            continue;
        }

        if word.is_keyword("local") {
            i = local_statement(words, i + 1, &mut bindings);
        } else if word.is_keyword("function") {
            i = function_header(words, i + 1, &mut bindings);
        } else if word.is_keyword("for") {
            i = for_header(words, i + 1, &mut bindings);
        } else if word.is_name() && !follows_separator(words, i) {
            i = assignment(words, i, &mut bindings);
        } else {
            i += 1;
        }
    }

    bindings
}

fn follows_separator(words: &[Word], i: usize) -> bool {
    i > 0 && (words[i - 1].is(".") || words[i - 1].is(":"))
}

/// `a.b.c` (with `.` only, or also `:` when `allow_method`). Returns the
/// segments and the index after the chain.
fn parse_chain(words: &[Word], start: usize, allow_method: bool) -> Option<(Vec<String>, usize)> {
    let first = words.get(start).filter(|w| w.is_name())?;
    let mut segments = vec![first.text.clone()];
    let mut i = start + 1;
    while let (Some(sep), Some(next)) = (words.get(i), words.get(i + 1)) {
        let separator = sep.is(".") || (allow_method && sep.is(":"));
        if !separator || !next.is_name() {
            break;
        }
        segments.push(next.text.clone());
        i += 2;
    }
    Some((segments, i))
}

/// `local a, b <const> = ...` or `local function f(...)`.
fn local_statement(words: &[Word], mut i: usize, bindings: &mut Vec<Binding>) -> usize {
    if words.get(i).is_some_and(|w| w.is_keyword("function")) {
        return function_header(words, i + 1, bindings);
    }

    let mut names = Vec::new();
    while let Some(word) = words.get(i).filter(|w| w.is_name()) {
        names.push(word.text.clone());
        i += 1;
        // Lua 5.4 attribute
        if words.get(i).is_some_and(|w| w.is("<"))
            && words.get(i + 2).is_some_and(|w| w.is(">"))
        {
            i += 3;
        }
        if words.get(i).is_some_and(|w| w.is(",")) {
            i += 1;
        } else {
            break;
        }
    }

    let values = if words.get(i).is_some_and(|w| w.is("=")) {
        i += 1;
        parse_values(words, i, names.len())
    } else {
        Vec::new()
    };
    push_targets(names.into_iter().map(|n| vec![n]).collect(), values, bindings);
    i
}

/// `function a.b:c(p, q)` or `function (p, q)`.
fn function_header(words: &[Word], i: usize, bindings: &mut Vec<Binding>) -> usize {
    let mut i = i;
    if let Some((path, next)) = parse_chain(words, i, true) {
        bindings.push(Binding::plain(path));
        i = next;
    }
    if words.get(i).is_some_and(|w| w.is("(")) {
        i += 1;
        while let Some(word) = words.get(i) {
            if word.is(")") {
                i += 1;
                break;
            }
            if word.is_name() {
                bindings.push(Binding::plain(vec![word.text.clone()]));
            }
            i += 1;
        }
    }
    i
}

/// `for k, v in ...` or `for i = ...`.
fn for_header(words: &[Word], mut i: usize, bindings: &mut Vec<Binding>) -> usize {
    while let Some(word) = words.get(i) {
        if word.is_keyword("in") || word.is("=") || word.is_keyword("do") {
            break;
        }
        if word.is_name() {
            bindings.push(Binding::plain(vec![word.text.clone()]));
        }
        i += 1;
    }
    i
}

/// `a, b.c = ...`. Anything else (calls, indexing, comparisons) is skipped.
fn assignment(words: &[Word], start: usize, bindings: &mut Vec<Binding>) -> usize {
    let mut targets = Vec::new();
    let mut i = start;
    loop {
        let Some((path, next)) = parse_chain(words, i, false) else {
            return start + 1;
        };
        targets.push(path);
        i = next;
        match words.get(i) {
            Some(w) if w.is(",") => i += 1,
            Some(w) if w.is("=") => break,
            _ => return start + 1,
        }
    }

    let values = parse_values(words, i + 1, targets.len());
    push_targets(targets, values, bindings);
    i + 1
}

fn push_targets(targets: Vec<Vec<String>>, values: Vec<Value>, bindings: &mut Vec<Binding>) {
    let mut values = values.into_iter();
    for path in targets {
        let value = values.next().unwrap_or_default();
        bindings.push(Binding {
            path,
            members: value.members,
            alias: value.alias,
        });
    }
}

/// Shapes of up to `count` comma-separated values starting at `i`.
///
/// Only table constructors and plain chains are understood. Any other
/// value contributes nothing and is skipped up to the next top-level comma.
fn parse_values(words: &[Word], mut i: usize, count: usize) -> Vec<Value> {
    let mut values = Vec::new();
    while values.len() < count {
        let Some(word) = words.get(i) else {
            break;
        };
        let table = word.is("{") && ends_expression(words.get(table_end(words, i)));
        if table {
            let (members, end) = parse_table(words, i);
            values.push(Value {
                members,
                alias: None,
            });
            i = end;
        } else if let Some((chain, end)) = parse_chain(words, i, false)
            .filter(|(_, end)| ends_expression(words.get(*end)))
        {
            values.push(Value {
                members: ScopeNode::default(),
                alias: Some(chain),
            });
            i = end;
        } else {
            values.push(Value::default());
            i = skip_expression(words, i);
        }
        if words.get(i).is_some_and(|w| w.is(",")) {
            i += 1;
        } else {
            break;
        }
    }
    values
}

/// Index after the `}` closing the brace at `open`.
fn table_end(words: &[Word], open: usize) -> usize {
    let mut depth = 0usize;
    for (i, word) in words.iter().enumerate().skip(open) {
        if word.is("{") {
            depth += 1;
        } else if word.is("}") {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return i + 1;
            }
        }
    }
    words.len()
}

/// Index of the first word after the expression starting at `start`: a
/// top-level `,` or `;`, an unmatched closing bracket, a statement keyword,
/// or a name that cannot continue the expression.
fn skip_expression(words: &[Word], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while let Some(word) = words.get(i) {
        if word.is("(") || word.is("[") || word.is("{") {
            depth += 1;
        } else if word.is(")") || word.is("]") || word.is("}") {
            if depth == 0 {
                return i;
            }
            depth -= 1;
        } else if depth == 0 && i > start {
            if word.is(",") || word.is(";") {
                return i;
            }
            let continues = matches!(word.text.as_str(), "and" | "or" | "not" | "nil" | "true" | "false");
            if word.kind == TokenKind::Keyword && !continues {
                return i;
            }
            if (word.is_name() || word.kind == TokenKind::Number) && ends_value(&words[i - 1]) {
                return i;
            }
        }
        i += 1;
    }
    i
}

/// Whether `word` can be the last word of a value, so a name right after
/// it starts a new statement.
fn ends_value(word: &Word) -> bool {
    matches!(word.kind, TokenKind::Number | TokenKind::String)
        || word.is_name()
        || matches!(word.text.as_str(), "nil" | "true" | "false" | "...")
        || word.is(")")
        || word.is("]")
        || word.is("}")
}

/// Whether the word after a chain ends the expression (so the chain is a
/// plain reference, not a call, index or operand).
fn ends_expression(next: Option<&Word>) -> bool {
    match next {
        None => true,
        Some(w) if w.kind == TokenKind::Keyword => !matches!(w.text.as_str(), "and" | "or"),
        Some(w) if w.is_name() => true,
        Some(w) => w.is(",") || w.is(";") || w.is(")") || w.is("}"),
    }
}

/// Members of the table constructor opening at `open`, and the index after
/// its closing brace. Nested constructors under a key become nested
/// members; positional ones are ignored. Unterminated constructors yield
/// what was seen.
fn parse_table(words: &[Word], open: usize) -> (ScopeNode, usize) {
    // Each frame is a table under construction and the key it belongs to.
    let mut stack: Vec<(ScopeNode, Option<String>)> = vec![(ScopeNode::default(), None)];
    let mut pending_key: Option<String> = None;
    let mut i = open + 1;

    while i < words.len() {
        let word = &words[i];
        if word.is("{") {
            stack.push((ScopeNode::default(), pending_key.take()));
            i += 1;
            continue;
        }
        if word.is("}") {
            pending_key = None;
            if let Some((node, key)) = stack.pop() {
                match stack.last_mut() {
                    None => return (node, i + 1),
                    Some((parent, _)) => {
                        if let Some(key) = key {
                            parent.entry_path(&[key]).merge_missing(&node);
                        }
                    }
                }
            }
            i += 1;
            continue;
        }

        let at_field_start = words
            .get(i.wrapping_sub(1))
            .is_some_and(|prev| prev.is("{") || prev.is(",") || prev.is(";"));
        if at_field_start {
            if let Some(key) = field_key(words, i) {
                let (name, eq) = key;
                if let Some((node, _)) = stack.last_mut() {
                    node.entry_path(&[name.clone()]);
                }
                if words.get(eq + 1).is_some_and(|w| w.is("{")) {
                    pending_key = Some(name);
                }
                i = eq + 1;
                continue;
            }
        }
        i += 1;
    }

    // Unterminated: fold the open frames back into the outermost one.
    while stack.len() > 1 {
        if let Some((node, key)) = stack.pop() {
            if let (Some((parent, _)), Some(key)) = (stack.last_mut(), key) {
                parent.entry_path(&[key]).merge_missing(&node);
            }
        }
    }
    let root = stack.pop().map(|(node, _)| node).unwrap_or_default();
    (root, words.len())
}

/// `name =` or `["name"] =` at `i`: the key and the index of `=`.
fn field_key(words: &[Word], i: usize) -> Option<(String, usize)> {
    let word = words.get(i)?;
    if word.is_name() && words.get(i + 1).is_some_and(|w| w.is("=")) {
        return Some((word.text.clone(), i + 1));
    }
    if word.is("[") {
        let literal = words.get(i + 1).filter(|w| w.kind == TokenKind::String)?;
        let closes = words.get(i + 2).is_some_and(|w| w.is("]"))
            && words.get(i + 3).is_some_and(|w| w.is("="));
        let key = literal.text.trim_matches(|c| c == '"' || c == '\'');
        if closes && !key.is_empty() {
            return Some((key.to_string(), i + 3));
        }
    }
    None
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Scan left from `cursor` for the chain being typed, e.g. `foo.bar:ba|`
/// gives segments `["foo", "bar"]` and partial `"ba"`.
///
/// Whitespace between segments is allowed, and a balanced `(...)` group
/// right before a separator is skipped so `foo():` gives `["foo"]`.
pub fn typed_chain<D: DocumentAccess + ?Sized>(doc: &D, cursor: usize) -> TypedChain {
    let cursor = cursor.min(doc.len_chars());
    let mut pos = cursor;
    while pos > 0 && doc.char_at(pos - 1).is_some_and(is_ident_char) {
        pos -= 1;
    }
    let partial = doc.text_at(pos, cursor - pos);
    let mut start = pos;
    let mut segments = Vec::new();

    loop {
        let mut p = skip_space_left(doc, start);
        if !(p > 0 && matches!(doc.char_at(p - 1), Some('.' | ':'))) {
            break;
        }
        p = skip_space_left(doc, p - 1);

        if p > 0 && doc.char_at(p - 1) == Some(')') {
            match skip_group_left(doc, p - 1) {
                Some(open) => p = skip_space_left(doc, open),
                None => break,
            }
        }

        let end = p;
        while p > 0 && doc.char_at(p - 1).is_some_and(is_ident_char) {
            p -= 1;
        }
        let segment = doc.text_at(p, end - p);
        if segment.is_empty() || segment.starts_with(|c: char| c.is_ascii_digit()) {
            break;
        }
        segments.push(segment);
        start = p;
    }

    segments.reverse();
    TypedChain {
        segments,
        partial,
        start,
    }
}

fn skip_space_left<D: DocumentAccess + ?Sized>(doc: &D, mut pos: usize) -> usize {
    while pos > 0 && doc.char_at(pos - 1).is_some_and(char::is_whitespace) {
        pos -= 1;
    }
    pos
}

/// Given the offset of a `)`, the offset of its matching `(`.
fn skip_group_left<D: DocumentAccess + ?Sized>(doc: &D, close: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut pos = close + 1;
    while pos > 0 {
        pos -= 1;
        match doc.char_at(pos)? {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos);
                }
            }
            _ => {}
        }
    }
    None
}
