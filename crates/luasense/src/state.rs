//
// state.rs
//
// Open documents and shared analysis state of the language server
//

use std::collections::HashMap;
use std::sync::Arc;

use ropey::Rope;
use tower_lsp::lsp_types::{TextDocumentContentChangeEvent, Url};

use crate::cross_file::config::LuaSenseConfig;
use crate::cross_file::indexer::{IndexSettings, SymbolIndexer};
use crate::cross_file::path_resolve::uri_to_path;
use crate::document::position_to_offset;
use crate::documentation::PredefinedDocumentation;

/// An open document
#[derive(Debug, Clone)]
pub struct Document {
    pub contents: Rope,
    pub version: Option<i32>,
}

impl Document {
    pub fn new(text: &str, version: Option<i32>) -> Self {
        Self {
            contents: Rope::from_str(text),
            version,
        }
    }

    /// Apply an incremental edit, or replace everything when the change has
    /// no range.
    pub fn apply_change(&mut self, change: TextDocumentContentChangeEvent) {
        if let Some(range) = change.range {
            let start = position_to_offset(&self.contents, range.start);
            let end = position_to_offset(&self.contents, range.end).max(start);
            self.contents.remove(start..end);
            self.contents.insert(start, &change.text);
        } else {
            // Full document sync
            self.contents = Rope::from_str(&change.text);
        }
    }

    pub fn text(&self) -> String {
        self.contents.to_string()
    }
}

/// Shared state of the language server.
///
/// The indexer and the documentation store are internally synchronized and
/// `Arc`-shared so handlers can keep using them after releasing the state
/// lock.
pub struct WorldState {
    pub documents: HashMap<Url, Document>,
    pub config: LuaSenseConfig,
    pub indexer: Arc<SymbolIndexer>,
    pub documentation: Arc<PredefinedDocumentation>,
}

impl WorldState {
    pub fn new(config: LuaSenseConfig) -> Self {
        log::info!("Initializing analysis configuration:");
        log::info!("  source_extension: {}", config.source_extension);
        log::info!("  path_placeholder: {}", config.path_placeholder);
        log::info!("  idle_completion: {}", config.idle_completion);
        log::info!("  builtins_enabled: {}", config.builtins_enabled);
        log::info!("  content_cache_capacity: {}", config.content_cache_capacity);
        log::info!("  unresolved_require_severity: {:?}", config.unresolved_require_severity);

        Self {
            documents: HashMap::new(),
            indexer: Arc::new(SymbolIndexer::new(IndexSettings::from(&config))),
            documentation: Arc::new(PredefinedDocumentation::new(config.documentation_dir.clone())),
            config,
        }
    }

    /// Install a new configuration, rebuilding the caches whose inputs
    /// changed.
    pub fn apply_config(&mut self, config: LuaSenseConfig) {
        let settings = IndexSettings::from(&config);
        if settings != *self.indexer.settings() {
            log::info!("Index settings changed, rebuilding symbol index");
            self.indexer = Arc::new(SymbolIndexer::new(settings));
        }
        if config.documentation_dir != self.config.documentation_dir {
            self.documentation = Arc::new(PredefinedDocumentation::new(
                config.documentation_dir.clone(),
            ));
        }
        self.config = config;
    }

    pub fn open_document(&mut self, uri: Url, text: &str, version: Option<i32>) {
        self.documents.insert(uri, Document::new(text, version));
    }

    pub fn close_document(&mut self, uri: &Url) {
        self.documents.remove(uri);
    }

    pub fn apply_change(&mut self, uri: &Url, change: TextDocumentContentChangeEvent) {
        if let Some(doc) = self.documents.get_mut(uri) {
            doc.apply_change(change);
        }
    }

    pub fn get_document(&self, uri: &Url) -> Option<&Document> {
        self.documents.get(uri)
    }

    /// Drop cached data for a file changed outside the editor.
    pub fn invalidate_file(&self, uri: &Url) {
        if let Some(path) = uri_to_path(uri) {
            self.indexer.invalidate(&path);
        }
    }
}
