//
// cross_file/indexer.rs
//
// Function and dependency index over Lua files and open buffers
//

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::config::LuaSenseConfig;
use super::dependency::{breadth_first, resolve_dependencies, DependencyScan};
use super::file_cache::{ContentCache, FileCache};
use super::path_resolve::{normalize_path, ResolveOptions};
use super::require_detect::{parse_requires_with_placeholder, RequireMetadata};
use super::signatures::{extract_signatures, FunctionSignature};
use crate::builtins::builtin_signatures;

/// Settings the index is built with. A change means a fresh index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    pub source_extension: String,
    pub path_placeholder: char,
    pub include_builtins: bool,
    pub content_cache_capacity: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self::from(&LuaSenseConfig::default())
    }
}

impl From<&LuaSenseConfig> for IndexSettings {
    fn from(config: &LuaSenseConfig) -> Self {
        Self {
            source_extension: config.source_extension.clone(),
            path_placeholder: config.path_placeholder,
            include_builtins: config.builtins_enabled,
            content_cache_capacity: config.content_cache_capacity,
        }
    }
}

/// Memoized signature and `require` index.
///
/// Files on disk are cached by path and revalidated by modification time.
/// Open buffers are cached by content hash. All methods are synchronous and
/// safe to call from several threads.
#[derive(Debug)]
pub struct SymbolIndexer {
    settings: IndexSettings,
    file_signatures: FileCache<Vec<FunctionSignature>>,
    file_requires: FileCache<RequireMetadata>,
    buffer_signatures: ContentCache<Vec<FunctionSignature>>,
    buffer_requires: ContentCache<RequireMetadata>,
}

impl Default for SymbolIndexer {
    fn default() -> Self {
        Self::new(IndexSettings::default())
    }
}

impl SymbolIndexer {
    pub fn new(settings: IndexSettings) -> Self {
        let capacity = settings.content_cache_capacity;
        Self {
            settings,
            file_signatures: FileCache::new(),
            file_requires: FileCache::new(),
            buffer_signatures: ContentCache::with_capacity(capacity),
            buffer_requires: ContentCache::with_capacity(capacity),
        }
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    fn resolve_options(&self) -> ResolveOptions<'_> {
        ResolveOptions {
            extension: &self.settings.source_extension,
            placeholder: self.settings.path_placeholder,
        }
    }

    /// Signatures defined in a file on disk, with their origin set.
    pub fn file_signatures(&self, path: &Path) -> Arc<Vec<FunctionSignature>> {
        self.file_signatures.get_or_parse(path, |text| {
            extract_signatures(text)
                .into_iter()
                .map(|sig| sig.with_origin(path.to_path_buf()))
                .collect()
        })
    }

    /// Parsed `require` declarations of a file on disk.
    pub fn file_requires(&self, path: &Path) -> Arc<RequireMetadata> {
        let placeholder = self.settings.path_placeholder;
        self.file_requires
            .get_or_parse(path, |text| parse_requires_with_placeholder(text, placeholder))
    }

    /// Resolve every `require` of a file on disk.
    ///
    /// The parse is memoized; resolution runs on every call so that files
    /// appearing or disappearing are noticed.
    pub fn extract_dependencies(&self, path: &Path) -> DependencyScan {
        let meta = self.file_requires(path);
        resolve_dependencies(path, &meta, self.resolve_options())
    }

    /// Files reachable from `entry` through `require`, breadth first.
    ///
    /// Includes `entry` itself when it exists. Cycles are visited once.
    pub fn resolve_reachable_files(&self, entry: &Path) -> Vec<PathBuf> {
        let entry = normalize_path(entry).unwrap_or_else(|| entry.to_path_buf());
        if !entry.is_file() {
            return Vec::new();
        }
        breadth_first([entry], HashSet::new(), |path| {
            self.extract_dependencies(path).paths()
        })
    }

    /// Signatures of every reachable file followed by the built-in table.
    pub fn signatures_visible_from(&self, entry: &Path) -> Vec<FunctionSignature> {
        let mut out = Vec::new();
        for path in self.resolve_reachable_files(entry) {
            out.extend(self.file_signatures(&path).iter().cloned());
        }
        self.append_builtins(&mut out);
        out
    }

    /// Signatures defined in an open buffer. Origins are left empty.
    pub fn document_signatures(&self, text: &str) -> Arc<Vec<FunctionSignature>> {
        self.buffer_signatures.get_or_parse(text, extract_signatures)
    }

    /// Resolve the `require`s of an open buffer relative to `path`.
    pub fn buffer_dependencies(&self, path: &Path, text: &str) -> DependencyScan {
        let placeholder = self.settings.path_placeholder;
        let meta = self
            .buffer_requires
            .get_or_parse(text, |t| parse_requires_with_placeholder(t, placeholder));
        resolve_dependencies(path, &meta, self.resolve_options())
    }

    /// Files reachable from an open buffer, excluding the buffer's own path.
    pub fn buffer_reachable_files(&self, path: &Path, text: &str) -> Vec<PathBuf> {
        let own = normalize_path(path).unwrap_or_else(|| path.to_path_buf());
        let roots = self.buffer_dependencies(path, text).paths();
        breadth_first(roots, HashSet::from([own]), |dep| {
            self.extract_dependencies(dep).paths()
        })
    }

    /// Like [`signatures_visible_from`](Self::signatures_visible_from) for an
    /// unsaved buffer: its own signatures come from `text`, its dependencies
    /// from disk.
    pub fn signatures_visible_from_buffer(&self, path: &Path, text: &str) -> Vec<FunctionSignature> {
        let mut out: Vec<FunctionSignature> = self.document_signatures(text).iter().cloned().collect();
        for dep in self.buffer_reachable_files(path, text) {
            out.extend(self.file_signatures(&dep).iter().cloned());
        }
        self.append_builtins(&mut out);
        out
    }

    fn append_builtins(&self, out: &mut Vec<FunctionSignature>) {
        if self.settings.include_builtins {
            out.extend(builtin_signatures().iter().cloned());
        }
    }

    /// Drop cached data for a file, e.g. after a watched-file change.
    pub fn invalidate(&self, path: &Path) {
        self.file_signatures.invalidate(path);
        self.file_requires.invalidate(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    fn no_builtins() -> SymbolIndexer {
        SymbolIndexer::new(IndexSettings {
            include_builtins: false,
            ..IndexSettings::default()
        })
    }

    #[test]
    fn test_require_resolves_to_sibling() {
        let dir = TempDir::new().unwrap();
        let main = write(dir.path(), "main.lua", "require(\"util\")\n");
        let util = write(dir.path(), "util.lua", "function helper() end\n");

        let indexer = no_builtins();
        let scan = indexer.extract_dependencies(&main);
        assert_eq!(scan.paths(), vec![util]);
        assert!(scan.unresolved.is_empty());
    }

    #[test]
    fn test_reachable_files_with_cycle() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.lua", "require('b')\n");
        let b = write(dir.path(), "b.lua", "require('c')\n");
        let c = write(dir.path(), "c.lua", "require('a')\nrequire('b')\n");

        let indexer = no_builtins();
        assert_eq!(indexer.resolve_reachable_files(&a), vec![a, b, c]);
    }

    #[test]
    fn test_reachable_files_missing_entry() {
        let dir = TempDir::new().unwrap();
        let indexer = no_builtins();
        assert!(indexer
            .resolve_reachable_files(&dir.path().join("nope.lua"))
            .is_empty());
    }

    #[test]
    fn test_signatures_visible_from_collects_dependencies() {
        let dir = TempDir::new().unwrap();
        let main = write(
            dir.path(),
            "main.lua",
            "local util = require('util')\nfunction main() end\n",
        );
        let util = write(dir.path(), "util.lua", "local M = {}\nfunction M.helper(x) end\nreturn M\n");

        let indexer = no_builtins();
        let sigs = indexer.signatures_visible_from(&main);
        let names: Vec<_> = sigs.iter().map(|s| s.qualified_name()).collect();
        assert_eq!(names, vec!["main", "M.helper"]);
        assert_eq!(sigs[1].origin.as_deref(), Some(util.as_path()));
        assert_eq!(sigs[1].line, 2);
    }

    #[test]
    fn test_builtins_appended_once() {
        let dir = TempDir::new().unwrap();
        let main = write(dir.path(), "main.lua", "require('a')\nrequire('b')\n");
        write(dir.path(), "a.lua", "function fa() end\n");
        write(dir.path(), "b.lua", "function fb() end\n");

        let indexer = SymbolIndexer::default();
        let sigs = indexer.signatures_visible_from(&main);
        let prints = sigs.iter().filter(|s| s.name == "print").count();
        assert_eq!(prints, 1);
        assert_eq!(sigs[0].name, "fa");
        assert_eq!(sigs[1].name, "fb");
    }

    #[test]
    fn test_buffer_signatures_use_unsaved_text() {
        let dir = TempDir::new().unwrap();
        let main = write(dir.path(), "main.lua", "function stale() end\n");
        write(dir.path(), "lib.lua", "function from_lib() end\nrequire('main')\n");

        let indexer = no_builtins();
        let text = "require('lib')\nfunction fresh(a) end\n";
        let sigs = indexer.signatures_visible_from_buffer(&main, text);
        let names: Vec<_> = sigs.iter().map(|s| s.name.as_str()).collect();
        // The on-disk copy of the buffer is not pulled back in through lib.
        assert_eq!(names, vec!["fresh", "from_lib"]);
        assert_eq!(sigs[0].origin, None);
    }

    #[test]
    fn test_buffer_dependencies_report_unresolved() {
        let dir = TempDir::new().unwrap();
        let main = dir.path().join("main.lua");
        let indexer = no_builtins();
        let scan = indexer.buffer_dependencies(&main, "require('ghost_module_x1')\n");
        assert_eq!(scan.unresolved.len(), 1);
        assert_eq!(scan.unresolved[0].name, "ghost_module_x1");
    }

    #[test]
    fn test_document_signatures_memoized_by_content() {
        let indexer = no_builtins();
        let first = indexer.document_signatures("function a() end");
        let second = indexer.document_signatures("function a() end");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_custom_extension() {
        let dir = TempDir::new().unwrap();
        let main = write(dir.path(), "main.luau", "require('dep')\n");
        let dep = write(dir.path(), "dep.luau", "function d() end\n");

        let indexer = SymbolIndexer::new(IndexSettings {
            source_extension: "luau".to_string(),
            include_builtins: false,
            ..IndexSettings::default()
        });
        assert_eq!(indexer.resolve_reachable_files(&main), vec![main, dep]);
    }
}
