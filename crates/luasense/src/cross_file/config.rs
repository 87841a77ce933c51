//
// cross_file/config.rs
//
// Configuration for Lua analysis and the language server
//

use std::path::PathBuf;
use tower_lsp::lsp_types::DiagnosticSeverity;

use super::file_cache::DEFAULT_CONTENT_CACHE_CAPACITY;

/// Analysis configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LuaSenseConfig {
    /// Extension appended to module names when resolving `require`
    pub source_extension: String,
    /// Character standing for the module name in `package.path` patterns
    pub path_placeholder: char,
    /// Whether completions are offered on idle (non-explicit) triggers
    pub idle_completion: bool,
    /// Directory holding the `words`, `members` and `calls` files
    pub documentation_dir: Option<PathBuf>,
    /// Spaces per indentation level
    pub indent_size: usize,
    /// Number of open-buffer parses kept in memory
    pub content_cache_capacity: usize,
    /// Whether the built-in standard library signatures are offered
    pub builtins_enabled: bool,
    /// Whether unresolved `require` diagnostics are published
    pub diagnostics_enabled: bool,
    /// Severity for unresolved `require` diagnostics
    pub unresolved_require_severity: DiagnosticSeverity,
}

impl Default for LuaSenseConfig {
    fn default() -> Self {
        Self {
            source_extension: "lua".to_string(),
            path_placeholder: '?',
            idle_completion: false,
            documentation_dir: default_documentation_dir(),
            indent_size: 4,
            content_cache_capacity: DEFAULT_CONTENT_CACHE_CAPACITY,
            builtins_enabled: true,
            diagnostics_enabled: true,
            unresolved_require_severity: DiagnosticSeverity::WARNING,
        }
    }
}

/// `$XDG_DATA_HOME/luasense/documentation/completion`
#[cfg(unix)]
pub fn default_documentation_dir() -> Option<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("luasense").ok()?;
    Some(dirs.get_data_home().join("documentation").join("completion"))
}

#[cfg(not(unix))]
pub fn default_documentation_dir() -> Option<PathBuf> {
    let base = std::env::var_os("APPDATA")?;
    Some(
        PathBuf::from(base)
            .join("luasense")
            .join("documentation")
            .join("completion"),
    )
}
