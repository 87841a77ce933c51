//
// backend.rs
//
// tower-lsp language server backend
//

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::Client;
use tower_lsp::LanguageServer;
use tower_lsp::LspService;
use tower_lsp::Server;

use crate::cross_file::config::LuaSenseConfig;
use crate::handlers;
use crate::indentation::on_type_formatting_capability;
use crate::state::WorldState;

/// Read analysis settings from LSP settings JSON, starting from `base`.
///
/// Settings may be nested under a `luasense` key or given at the top
/// level. Unknown keys and values of the wrong type are ignored.
///
/// ```text
/// {
///     "luasense": {
///         "sourceExtension": "lua",
///         "pathPlaceholder": "?",
///         "idleCompletion": false,
///         "documentationDir": "/usr/share/luasense/completion",
///         "indentSize": 4,
///         "contentCacheCapacity": 64,
///         "builtins": { "enabled": true },
///         "diagnostics": { "enabled": true, "unresolvedRequireSeverity": "warning" }
///     }
/// }
/// ```
pub fn parse_config(settings: &serde_json::Value, base: &LuaSenseConfig) -> LuaSenseConfig {
    let settings = settings.get("luasense").unwrap_or(settings);
    let mut config = base.clone();

    if let Some(v) = settings.get("sourceExtension").and_then(|v| v.as_str()) {
        let ext = v.trim_start_matches('.');
        if !ext.is_empty() {
            config.source_extension = ext.to_string();
        }
    }
    if let Some(v) = settings.get("pathPlaceholder").and_then(|v| v.as_str()) {
        let mut chars = v.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            config.path_placeholder = c;
        }
    }
    if let Some(v) = settings.get("idleCompletion").and_then(|v| v.as_bool()) {
        config.idle_completion = v;
    }
    if let Some(v) = settings.get("documentationDir").and_then(|v| v.as_str()) {
        config.documentation_dir = if v.is_empty() || v.contains('\0') {
            None
        } else {
            Some(PathBuf::from(v))
        };
    }
    if let Some(v) = settings.get("indentSize").and_then(|v| v.as_u64()) {
        if v > 0 {
            config.indent_size = v as usize;
        }
    }
    if let Some(v) = settings.get("contentCacheCapacity").and_then(|v| v.as_u64()) {
        if v > 0 {
            config.content_cache_capacity = v as usize;
        }
    }
    if let Some(builtins) = settings.get("builtins") {
        if let Some(v) = builtins.get("enabled").and_then(|v| v.as_bool()) {
            config.builtins_enabled = v;
        }
    }
    if let Some(diagnostics) = settings.get("diagnostics") {
        if let Some(v) = diagnostics.get("enabled").and_then(|v| v.as_bool()) {
            config.diagnostics_enabled = v;
        }
        if let Some(sev) = diagnostics
            .get("unresolvedRequireSeverity")
            .and_then(|v| v.as_str())
        {
            config.unresolved_require_severity = parse_severity(sev);
        }
    }

    log::info!("Configuration loaded from LSP settings:");
    log::info!("  source_extension: {}", config.source_extension);
    log::info!("  path_placeholder: {}", config.path_placeholder);
    log::info!("  idle_completion: {}", config.idle_completion);
    log::info!("  documentation_dir: {:?}", config.documentation_dir);
    log::info!("  indent_size: {}", config.indent_size);
    log::info!("  builtins_enabled: {}", config.builtins_enabled);
    log::info!("  diagnostics_enabled: {}", config.diagnostics_enabled);
    log::info!(
        "  unresolved_require_severity: {:?}",
        config.unresolved_require_severity
    );

    config
}

fn parse_severity(s: &str) -> DiagnosticSeverity {
    match s.to_lowercase().as_str() {
        "error" => DiagnosticSeverity::ERROR,
        "warning" => DiagnosticSeverity::WARNING,
        "information" | "info" => DiagnosticSeverity::INFORMATION,
        "hint" => DiagnosticSeverity::HINT,
        _ => DiagnosticSeverity::WARNING,
    }
}

pub struct Backend {
    client: Client,
    state: Arc<RwLock<WorldState>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(WorldState::new(LuaSenseConfig::default()))),
        }
    }

    async fn publish_diagnostics(&self, uri: &Url) {
        let (version, diagnostics) = {
            let state = self.state.read().await;
            let Some(doc) = state.get_document(uri) else {
                return;
            };
            (doc.version, handlers::diagnostics(&state, uri))
        };
        log::trace!(
            "Publishing {} diagnostics for {}",
            diagnostics.len(),
            uri
        );
        self.client
            .publish_diagnostics(uri.clone(), diagnostics, version)
            .await;
    }

    async fn publish_all_diagnostics(&self) {
        let open_uris: Vec<Url> = {
            let state = self.state.read().await;
            state.documents.keys().cloned().collect()
        };
        for uri in open_uris {
            self.publish_diagnostics(&uri).await;
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        log::info!("Initializing luasense");

        let mut state = self.state.write().await;

        if let Some(options) = params.initialization_options.as_ref() {
            let config = parse_config(options, &state.config);
            state.apply_config(config);
        }

        drop(state);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![String::from("."), String::from(":")]),
                    ..Default::default()
                }),
                signature_help_provider: Some(SignatureHelpOptions {
                    trigger_characters: Some(vec![String::from("("), String::from(",")]),
                    ..Default::default()
                }),
                semantic_tokens_provider: Some(
                    SemanticTokensServerCapabilities::SemanticTokensOptions(
                        SemanticTokensOptions {
                            legend: handlers::semantic_tokens_legend(),
                            full: Some(SemanticTokensFullOptions::Bool(true)),
                            range: None,
                            ..Default::default()
                        },
                    ),
                ),
                document_symbol_provider: Some(OneOf::Left(true)),
                workspace_symbol_provider: Some(OneOf::Left(true)),
                document_on_type_formatting_provider: Some(on_type_formatting_capability()),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: String::from("luasense"),
                version: Some(String::from(env!("CARGO_PKG_VERSION"))),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        log::info!("luasense initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        log::info!("Shutting down luasense");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        {
            let mut state = self.state.write().await;
            state.open_document(
                uri.clone(),
                &params.text_document.text,
                Some(params.text_document.version),
            );
        }
        self.publish_diagnostics(&uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        {
            let mut state = self.state.write().await;
            for change in params.content_changes {
                state.apply_change(&uri, change);
            }
            if let Some(doc) = state.documents.get_mut(&uri) {
                doc.version = Some(params.text_document.version);
            }
        }
        self.publish_diagnostics(&uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.state.write().await.close_document(&uri);
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        log::trace!("Configuration changed");
        {
            let mut state = self.state.write().await;
            let config = parse_config(&params.settings, &state.config);
            state.apply_config(config);
        }
        self.publish_all_diagnostics().await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        log::trace!(
            "Received watched files change: {} changes",
            params.changes.len()
        );
        {
            let state = self.state.read().await;
            for change in &params.changes {
                state.invalidate_file(&change.uri);
            }
        }
        // A created or deleted module can change what open documents resolve
        self.publish_all_diagnostics().await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let state = self.state.read().await;
        Ok(handlers::completion(
            &state,
            &params.text_document_position.text_document.uri,
            params.text_document_position.position,
            params.context.as_ref(),
        ))
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> Result<Option<SignatureHelp>> {
        let state = self.state.read().await;
        Ok(handlers::signature_help(
            &state,
            &params.text_document_position_params.text_document.uri,
            params.text_document_position_params.position,
        ))
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        let state = self.state.read().await;
        Ok(handlers::semantic_tokens_full(
            &state,
            &params.text_document.uri,
        ))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let state = self.state.read().await;
        Ok(handlers::document_symbol(&state, &params.text_document.uri))
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        let state = self.state.read().await;
        Ok(Some(handlers::workspace_symbol(&state, &params.query)))
    }

    async fn on_type_formatting(
        &self,
        params: DocumentOnTypeFormattingParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        let state = self.state.read().await;
        Ok(handlers::on_type_formatting(
            &state,
            &params.text_document_position.text_document.uri,
            params.text_document_position.position,
            &params.ch,
            &params.options,
        ))
    }
}

pub async fn start_lsp() -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(Backend::new).finish();
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
