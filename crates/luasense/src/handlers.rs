//
// handlers.rs
//
// LSP request handlers: maps protocol requests onto the analysis engine
//

use std::sync::Arc;

use tower_lsp::lsp_types::*;

use crate::builtins::builtin_signatures;
use crate::completion::{
    complete, CandidateCategory, CompletionContextKind, CompletionRequest, CompletionSources,
    TriggerReason,
};
use crate::cross_file::path_resolve::uri_to_path;
use crate::cross_file::signatures::{FunctionSignature, OwnerRelation};
use crate::document::{
    byte_to_utf16_column, offset_to_position, position_to_offset, DocumentAccess,
};
use crate::function_filter::{filter_functions, FunctionMatch};
use crate::indentation::{on_type_indent, IndentationConfig};
use crate::scanner::{highlight_document, TokenKind};
use crate::signature_hint::signature_hint;
use crate::state::{Document, WorldState};

// ============================================================================
// Signature Sources
// ============================================================================

/// Signatures defined in a document, and every signature visible from it.
struct DocumentSignatures {
    document: Arc<Vec<FunctionSignature>>,
    visible: Vec<FunctionSignature>,
}

fn document_signatures(state: &WorldState, uri: &Url, doc: &Document) -> DocumentSignatures {
    let text = doc.text();
    let document = state.indexer.document_signatures(&text);
    let visible = match uri_to_path(uri) {
        Some(path) => state.indexer.signatures_visible_from_buffer(&path, &text),
        None => {
            // Untitled buffers have no directory to resolve requires from
            let mut visible: Vec<FunctionSignature> = document.iter().cloned().collect();
            if state.indexer.settings().include_builtins {
                visible.extend(builtin_signatures().iter().cloned());
            }
            visible
        }
    };
    DocumentSignatures { document, visible }
}

// ============================================================================
// Completion
// ============================================================================

fn trigger_reason(context: Option<&CompletionContext>) -> TriggerReason {
    match context.map(|c| c.trigger_kind) {
        Some(CompletionTriggerKind::TRIGGER_CHARACTER) => TriggerReason::TriggerCharacter,
        Some(CompletionTriggerKind::TRIGGER_FOR_INCOMPLETE_COMPLETIONS) => TriggerReason::Idle,
        _ => TriggerReason::Explicit,
    }
}

fn completion_kind(category: CandidateCategory, context: CompletionContextKind) -> CompletionItemKind {
    match category {
        CandidateCategory::Variable => CompletionItemKind::VARIABLE,
        CandidateCategory::Function if context == CompletionContextKind::Method => {
            CompletionItemKind::METHOD
        }
        CandidateCategory::Function => CompletionItemKind::FUNCTION,
        CandidateCategory::Keyword => CompletionItemKind::KEYWORD,
        CandidateCategory::Magic => CompletionItemKind::METHOD,
    }
}

/// Completion items at `position`.
///
/// Items keep the engine's ranking through `sort_text`. With idle
/// completion enabled the list is marked incomplete, so clients re-query
/// while the user keeps typing; those re-queries arrive as idle triggers.
pub fn completion(
    state: &WorldState,
    uri: &Url,
    position: Position,
    context: Option<&CompletionContext>,
) -> Option<CompletionResponse> {
    let doc = state.get_document(uri)?;
    let rope = &doc.contents;
    let cursor = position_to_offset(rope, position);

    let signatures = document_signatures(state, uri, doc);
    let words = state.documentation.words();
    let members = state.documentation.members();
    let calls = state.documentation.calls();
    let sources = CompletionSources {
        document: &signatures.document,
        visible: &signatures.visible,
        words: &words,
        members: &members,
        calls: &calls,
    };
    let request = CompletionRequest {
        doc: rope,
        cursor,
        reason: trigger_reason(context),
        idle_completion: state.config.idle_completion,
    };

    let list = complete(&request, &sources)?;
    let range = Range {
        start: offset_to_position(rope, list.insert_offset),
        end: position,
    };

    let items = list
        .candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| CompletionItem {
            kind: Some(completion_kind(candidate.category, list.context)),
            sort_text: Some(format!("{index:05}")),
            text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                range,
                new_text: candidate.text.clone(),
            })),
            label: candidate.text,
            ..Default::default()
        })
        .collect();

    Some(CompletionResponse::List(CompletionList {
        is_incomplete: state.config.idle_completion,
        items,
    }))
}

// ============================================================================
// Signature Help
// ============================================================================

pub fn signature_help(state: &WorldState, uri: &Url, position: Position) -> Option<SignatureHelp> {
    let doc = state.get_document(uri)?;
    let rope = &doc.contents;
    let cursor = position_to_offset(rope, position);

    let signatures = document_signatures(state, uri, doc);
    let calls = state.documentation.calls();
    let hint = signature_hint(rope, cursor, &signatures.visible, &calls)?;

    let signatures = hint
        .signatures
        .iter()
        .map(|sig| {
            let label = sig.label();
            let parameters = sig
                .parameter_ranges()
                .into_iter()
                .map(|(start, end)| ParameterInformation {
                    label: ParameterLabel::LabelOffsets([
                        byte_to_utf16_column(&label, start),
                        byte_to_utf16_column(&label, end),
                    ]),
                    documentation: None,
                })
                .collect();
            SignatureInformation {
                label,
                documentation: None,
                parameters: Some(parameters),
                active_parameter: None,
            }
        })
        .collect();

    Some(SignatureHelp {
        signatures,
        active_signature: Some(0),
        active_parameter: hint.active_argument.map(|arg| arg as u32),
    })
}

// ============================================================================
// Semantic Tokens
// ============================================================================

fn token_type(kind: TokenKind) -> SemanticTokenType {
    match kind {
        TokenKind::Number => SemanticTokenType::NUMBER,
        TokenKind::String => SemanticTokenType::STRING,
        TokenKind::Local => SemanticTokenType::VARIABLE,
        TokenKind::Field => SemanticTokenType::PROPERTY,
        TokenKind::MagicAttr => SemanticTokenType::new("magicAttribute"),
        TokenKind::Keyword => SemanticTokenType::KEYWORD,
        TokenKind::Operator => SemanticTokenType::OPERATOR,
        TokenKind::MultiLineComment => SemanticTokenType::new("multiLineComment"),
        TokenKind::Comment => SemanticTokenType::COMMENT,
        TokenKind::Identifier => SemanticTokenType::new("identifier"),
        TokenKind::Whitespace => SemanticTokenType::new("whitespace"),
        TokenKind::RequiredModule => SemanticTokenType::NAMESPACE,
        TokenKind::EndOfBlock => SemanticTokenType::new("endOfBlock"),
    }
}

/// Legend indexed by [`TokenKind::legend_index`].
pub fn semantic_tokens_legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: TokenKind::ALL.iter().map(|kind| token_type(*kind)).collect(),
        token_modifiers: Vec::new(),
    }
}

/// Tokens of the whole document, delta encoded with UTF-16 columns.
/// Whitespace and end-of-block markers are not reported.
pub fn semantic_tokens_full(state: &WorldState, uri: &Url) -> Option<SemanticTokensResult> {
    let doc = state.get_document(uri)?;
    let text = doc.text();

    let mut data = Vec::new();
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;
    for (line_idx, (line, scan)) in text.lines().zip(highlight_document(&text)).enumerate() {
        let line_idx = line_idx as u32;
        for token in &scan.tokens {
            if token.len == 0 || matches!(token.kind, TokenKind::Whitespace | TokenKind::EndOfBlock)
            {
                continue;
            }
            let start = byte_to_utf16_column(line, token.start);
            let length = byte_to_utf16_column(line, token.end()) - start;
            let delta_line = line_idx - prev_line;
            let delta_start = if delta_line == 0 {
                start - prev_start
            } else {
                start
            };
            data.push(SemanticToken {
                delta_line,
                delta_start,
                length,
                token_type: token.kind.legend_index(),
                token_modifiers_bitset: 0,
            });
            prev_line = line_idx;
            prev_start = start;
        }
    }

    Some(SemanticTokensResult::Tokens(SemanticTokens {
        result_id: None,
        data,
    }))
}

// ============================================================================
// Symbols
// ============================================================================

#[allow(deprecated)]
fn symbol_information(uri: &Url, found: FunctionMatch) -> SymbolInformation {
    let line = found.signature.line.saturating_sub(1);
    let kind = match found.signature.relation {
        OwnerRelation::ObjectMethod => SymbolKind::METHOD,
        _ => SymbolKind::FUNCTION,
    };
    SymbolInformation {
        name: found.label,
        kind,
        tags: None,
        deprecated: None,
        location: Location {
            uri: uri.clone(),
            range: Range {
                start: Position::new(line, 0),
                end: Position::new(line, 0),
            },
        },
        container_name: found.detail,
    }
}

/// Functions defined in the document, in document order.
pub fn document_symbol(state: &WorldState, uri: &Url) -> Option<DocumentSymbolResponse> {
    let doc = state.get_document(uri)?;
    let signatures = state.indexer.document_signatures(&doc.text());
    let symbols = filter_functions(&signatures, "")
        .into_iter()
        .map(|found| symbol_information(uri, found))
        .collect();
    Some(DocumentSymbolResponse::Flat(symbols))
}

/// Functions of every open document matching `query`.
pub fn workspace_symbol(state: &WorldState, query: &str) -> Vec<SymbolInformation> {
    let mut uris: Vec<&Url> = state.documents.keys().collect();
    uris.sort();

    let mut symbols = Vec::new();
    for uri in uris {
        let Some(doc) = state.get_document(uri) else {
            continue;
        };
        let signatures = state.indexer.document_signatures(&doc.text());
        symbols.extend(
            filter_functions(&signatures, query)
                .into_iter()
                .map(|found| symbol_information(uri, found)),
        );
    }
    log::trace!("Workspace symbol query '{}': {} matches", query, symbols.len());
    symbols
}

// ============================================================================
// On-Type Formatting
// ============================================================================

pub fn on_type_formatting(
    state: &WorldState,
    uri: &Url,
    position: Position,
    typed: &str,
    options: &FormattingOptions,
) -> Option<Vec<TextEdit>> {
    let doc = state.get_document(uri)?;
    let config = IndentationConfig {
        indent_size: state.config.indent_size as u32,
        tab_size: options.tab_size,
        insert_spaces: options.insert_spaces,
    };
    let edit = on_type_indent(&doc.contents, position.line as usize, typed, config)?;
    Some(vec![edit])
}

// ============================================================================
// Diagnostics
// ============================================================================

/// One diagnostic per `require` of the document that does not resolve to a
/// file.
pub fn diagnostics(state: &WorldState, uri: &Url) -> Vec<Diagnostic> {
    if !state.config.diagnostics_enabled {
        return Vec::new();
    }
    let Some(doc) = state.get_document(uri) else {
        return Vec::new();
    };
    let Some(path) = uri_to_path(uri) else {
        return Vec::new();
    };

    let scan = state.indexer.buffer_dependencies(&path, &doc.text());
    scan.unresolved
        .iter()
        .map(|reference| {
            let line_text = doc.contents.line_text(reference.line as usize);
            let start = byte_to_utf16_column(&line_text, reference.column as usize);
            let end = byte_to_utf16_column(&line_text, reference.column as usize + reference.name.len());
            Diagnostic {
                range: Range {
                    start: Position::new(reference.line, start),
                    end: Position::new(reference.line, end),
                },
                severity: Some(state.config.unresolved_require_severity),
                source: Some("luasense".to_string()),
                message: format!("Module '{}' not found", reference.name),
                ..Default::default()
            }
        })
        .collect()
}
