//
// completion.rs
//
// Completion candidate assembly
//
// Candidates come in pools, each with a priority tier. Pools are merged
// from the highest tier down and the first pool to offer a text wins, so
// the final list never repeats a display text.
//

use std::collections::HashSet;

use crate::cross_file::signatures::FunctionSignature;
use crate::document::DocumentAccess;
use crate::documentation::{CallTable, MemberTable};
use crate::reserved_words::{
    DECLARATION_KEYWORDS, LITERAL_KEYWORDS, MAGIC_METHODS, SELF_KEYWORDS, STATEMENT_KEYWORDS,
};
use crate::scope::{typed_chain, visible_scope};
use crate::signature_hint::{last_significant, signature_hint, SignatureHint};

/// How the request was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Requested by the user
    Explicit,
    /// Typed trigger character
    TriggerCharacter,
    /// Editor idle after typing
    Idle,
}

/// What the text left of the cursor asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionContextKind {
    /// After `(` or `,`
    CallArgument,
    /// After `.`
    Member,
    /// After `:`
    Method,
    /// Anywhere else
    Word,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateCategory {
    Variable,
    Function,
    Keyword,
    Magic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    pub text: String,
    pub category: CandidateCategory,
    /// Tier of the pool the candidate came from; higher sorts first
    pub priority: u8,
}

/// Candidates sharing a category and priority tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePool {
    pub category: CandidateCategory,
    pub priority: u8,
    pub items: Vec<String>,
}

impl CandidatePool {
    pub fn new<I, S>(category: CandidateCategory, priority: u8, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            category,
            priority,
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    /// Keep items starting with `lowered_prefix`, ignoring case.
    fn filtered(mut self, lowered_prefix: &str) -> Self {
        self.items
            .retain(|item| item.to_lowercase().starts_with(lowered_prefix));
        self
    }
}

/// Merge pools into one list: tiers descending, pool order within a tier,
/// first occurrence of a display text wins.
pub fn merge_pools(mut pools: Vec<CandidatePool>) -> Vec<CompletionCandidate> {
    pools.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for pool in pools {
        for item in pool.items {
            if seen.contains(&item) {
                continue;
            }
            seen.insert(item.clone());
            out.push(CompletionCandidate {
                text: item,
                category: pool.category,
                priority: pool.priority,
            });
        }
    }
    out
}

/// Data the assembler draws candidates from.
#[derive(Debug, Clone, Copy)]
pub struct CompletionSources<'a> {
    /// Functions defined in the document itself
    pub document: &'a [FunctionSignature],
    /// Functions visible from the document (itself, required files and
    /// built-ins)
    pub visible: &'a [FunctionSignature],
    /// Predefined free words
    pub words: &'a [String],
    pub members: &'a MemberTable,
    pub calls: &'a CallTable,
}

#[derive(Debug)]
pub struct CompletionRequest<'a, D: DocumentAccess + ?Sized> {
    pub doc: &'a D,
    /// Character offset of the cursor
    pub cursor: usize,
    pub reason: TriggerReason,
    /// Whether idle-triggered requests are served
    pub idle_completion: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionList {
    pub context: CompletionContextKind,
    pub candidates: Vec<CompletionCandidate>,
    /// Where accepted text replaces the document
    pub insert_offset: usize,
    /// Only exact receiver matches were offered
    pub perfect_match: bool,
}

/// A signature hint when the cursor is in a call's argument list,
/// completions otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assist {
    Hint(SignatureHint),
    Completions(CompletionList),
}

/// Classify the context from the last non-whitespace character before the
/// cursor, and return that character's offset.
pub fn classify_context<D: DocumentAccess + ?Sized>(
    doc: &D,
    cursor: usize,
) -> (CompletionContextKind, Option<usize>) {
    let Some(pos) = last_significant(doc, cursor) else {
        return (CompletionContextKind::Word, None);
    };
    let kind = match doc.char_at(pos) {
        Some('(' | ',') => CompletionContextKind::CallArgument,
        Some('.') => CompletionContextKind::Member,
        Some(':') => CompletionContextKind::Method,
        _ => CompletionContextKind::Word,
    };
    (kind, Some(pos))
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Name left of the separator at `separator`: the identifier directly
/// before it (whitespace skipped), or failing that the whole non-blank run
/// with one trailing `()` removed, so `foo():` gives `foo`.
pub fn receiver<D: DocumentAccess + ?Sized>(doc: &D, separator: usize) -> String {
    let mut end = separator;
    while end > 0 && doc.char_at(end - 1).is_some_and(char::is_whitespace) {
        end -= 1;
    }
    let mut start = end;
    while start > 0 && doc.char_at(start - 1).is_some_and(is_ident_char) {
        start -= 1;
    }
    if start < end {
        return doc.text_at(start, end - start);
    }

    let mut start = separator;
    while start > 0 && doc.char_at(start - 1).is_some_and(|c| !c.is_whitespace()) {
        start -= 1;
    }
    let run = doc.text_at(start, separator - start);
    match run.strip_suffix("()") {
        Some(stripped) => stripped.to_string(),
        None => run,
    }
}

/// Assemble completions at the request's cursor.
///
/// `None` for idle triggers unless idle completion is enabled.
pub fn complete<D: DocumentAccess + ?Sized>(
    request: &CompletionRequest<'_, D>,
    sources: &CompletionSources<'_>,
) -> Option<CompletionList> {
    if request.reason == TriggerReason::Idle && !request.idle_completion {
        return None;
    }

    let doc = request.doc;
    let cursor = request.cursor.min(doc.len_chars());
    let (context, trigger) = classify_context(doc, cursor);

    let mut perfect_match = false;
    let mut insert_offset = cursor;
    let pools = match (context, trigger) {
        (CompletionContextKind::Member | CompletionContextKind::Method, Some(separator)) => {
            let name = receiver(doc, separator);
            let perfect = perfect_pools(context, &name, sources);
            if perfect.iter().any(|pool| !pool.items.is_empty()) {
                perfect_match = true;
                perfect
            } else {
                member_pools(context, doc, cursor, sources)
            }
        }
        (CompletionContextKind::Word, _) => {
            let chain = typed_chain(doc, cursor);
            insert_offset = cursor - chain.partial.chars().count();
            word_pools(doc, cursor, &chain.partial, sources)
        }
        _ => general_pools(doc, cursor),
    };

    let candidates = merge_pools(pools);
    log::trace!(
        "Completion at {}: {:?} context, {} candidates{}",
        cursor,
        context,
        candidates.len(),
        if perfect_match { " (perfect match)" } else { "" }
    );

    Some(CompletionList {
        context,
        candidates,
        insert_offset,
        perfect_match,
    })
}

/// Signature hint if one applies at the cursor, otherwise completions.
pub fn assist<D: DocumentAccess + ?Sized>(
    request: &CompletionRequest<'_, D>,
    sources: &CompletionSources<'_>,
) -> Option<Assist> {
    if let Some(hint) = signature_hint(request.doc, request.cursor, sources.visible, sources.calls) {
        return Some(Assist::Hint(hint));
    }
    complete(request, sources).map(Assist::Completions)
}

/// Exact matches on the receiver name. Any non-empty pool suppresses every
/// other suggestion.
fn perfect_pools(
    context: CompletionContextKind,
    receiver: &str,
    sources: &CompletionSources<'_>,
) -> Vec<CandidatePool> {
    let functions = sources
        .visible
        .iter()
        .filter(|sig| sig.owner.as_deref() == Some(receiver))
        .map(|sig| sig.name.clone());
    let mut pools = vec![CandidatePool::new(CandidateCategory::Function, 1, functions)];

    match context {
        CompletionContextKind::Method => pools.push(CandidatePool::new(
            CandidateCategory::Function,
            1,
            sources.calls.calls_of(receiver).iter().map(|call| call.name.clone()),
        )),
        CompletionContextKind::Member => pools.push(CandidatePool::new(
            CandidateCategory::Variable,
            1,
            sources.members.members_of(receiver).iter().cloned(),
        )),
        _ => {}
    }
    pools
}

fn document_function_names(sources: &CompletionSources<'_>) -> Vec<String> {
    sources.document.iter().map(|sig| sig.name.clone()).collect()
}

fn member_pools<D: DocumentAccess + ?Sized>(
    context: CompletionContextKind,
    doc: &D,
    cursor: usize,
    sources: &CompletionSources<'_>,
) -> Vec<CandidatePool> {
    let scope = visible_scope(doc, cursor);
    let chain = typed_chain(doc, cursor);
    let mut pools = Vec::new();

    if let Some(node) = scope.lookup(&chain.segments) {
        if !chain.segments.is_empty() {
            pools.push(CandidatePool::new(CandidateCategory::Variable, 4, node.child_names()));
        }
    }
    pools.push(CandidatePool::new(CandidateCategory::Variable, 3, scope.child_names()));

    if context == CompletionContextKind::Method {
        pools.push(CandidatePool::new(
            CandidateCategory::Function,
            2,
            sources.calls.words.iter().cloned(),
        ));
        pools.push(CandidatePool::new(
            CandidateCategory::Function,
            2,
            document_function_names(sources),
        ));
    } else {
        pools.push(CandidatePool::new(
            CandidateCategory::Variable,
            2,
            sources.members.words.iter().cloned(),
        ));
    }

    pools.push(CandidatePool::new(CandidateCategory::Keyword, 1, SELF_KEYWORDS.iter().copied()));
    if context == CompletionContextKind::Method {
        pools.push(CandidatePool::new(CandidateCategory::Magic, 0, MAGIC_METHODS.iter().copied()));
    }
    pools
}

fn word_pools<D: DocumentAccess + ?Sized>(
    doc: &D,
    cursor: usize,
    partial: &str,
    sources: &CompletionSources<'_>,
) -> Vec<CandidatePool> {
    let lowered = partial.to_lowercase();
    let scope = visible_scope(doc, cursor);

    [
        CandidatePool::new(CandidateCategory::Variable, 6, scope.child_names()),
        CandidatePool::new(CandidateCategory::Function, 5, document_function_names(sources)),
        CandidatePool::new(CandidateCategory::Variable, 4, sources.words.iter().cloned()),
        CandidatePool::new(CandidateCategory::Keyword, 3, SELF_KEYWORDS.iter().copied()),
        CandidatePool::new(CandidateCategory::Keyword, 2, DECLARATION_KEYWORDS.iter().copied()),
        CandidatePool::new(CandidateCategory::Keyword, 1, STATEMENT_KEYWORDS.iter().copied()),
        CandidatePool::new(CandidateCategory::Keyword, 0, LITERAL_KEYWORDS.iter().copied()),
    ]
    .into_iter()
    .map(|pool| pool.filtered(&lowered))
    .collect()
}

fn general_pools<D: DocumentAccess + ?Sized>(doc: &D, cursor: usize) -> Vec<CandidatePool> {
    let scope = visible_scope(doc, cursor);
    vec![
        CandidatePool::new(CandidateCategory::Variable, 4, scope.child_names()),
        CandidatePool::new(CandidateCategory::Keyword, 3, SELF_KEYWORDS.iter().copied()),
        CandidatePool::new(CandidateCategory::Keyword, 2, DECLARATION_KEYWORDS.iter().copied()),
        CandidatePool::new(CandidateCategory::Keyword, 1, STATEMENT_KEYWORDS.iter().copied()),
        CandidatePool::new(CandidateCategory::Keyword, 0, LITERAL_KEYWORDS.iter().copied()),
    ]
}
