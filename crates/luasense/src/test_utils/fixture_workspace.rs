//! Deterministic fixture workspace generator for benchmarks and tests.
//!
//! Generates synthetic Lua workspaces with controlled characteristics:
//! file count, functions per file, `require` chains, methods on a module
//! table, and extra lines of non-function code.
//!
//! All output is deterministic (no randomness) so benchmarks are reproducible.

use std::fmt::Write;
use std::path::Path;
use tempfile::TempDir;

/// Configuration for generating a fixture workspace.
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    pub file_count: usize,
    pub functions_per_file: usize,
    pub require_chain_depth: usize,
    pub methods_per_file: usize,
    pub extra_lines_per_file: usize,
}

impl FixtureConfig {
    /// Small workspace: 10 files, 5 functions each, require chain depth 3.
    pub fn small() -> Self {
        Self {
            file_count: 10,
            functions_per_file: 5,
            require_chain_depth: 3,
            methods_per_file: 2,
            extra_lines_per_file: 5,
        }
    }

    /// Medium workspace: 50 files, 10 functions each, require chain depth 10.
    pub fn medium() -> Self {
        Self {
            file_count: 50,
            functions_per_file: 10,
            require_chain_depth: 10,
            methods_per_file: 4,
            extra_lines_per_file: 10,
        }
    }

    /// Large workspace: 200 files, 20 functions each, require chain depth 15.
    pub fn large() -> Self {
        Self {
            file_count: 200,
            functions_per_file: 20,
            require_chain_depth: 15,
            methods_per_file: 6,
            extra_lines_per_file: 20,
        }
    }
}

/// Name of the module file with the given index, without extension.
pub fn module_name(index: usize) -> String {
    format!("mod_{index}")
}

/// Generate the content of a single Lua file deterministically.
///
/// - `index`: file index (0-based), used for naming and require chain linkage
/// - `config`: the workspace configuration
pub fn generate_lua_file_content(index: usize, config: &FixtureConfig) -> String {
    let mut content = String::new();

    // Require chain: mod_0 requires mod_1, mod_1 requires mod_2, etc.
    if index < config.require_chain_depth && index + 1 < config.file_count {
        writeln!(
            content,
            "local next_mod = require(\"{}\")",
            module_name(index + 1)
        )
        .unwrap();
        content.push('\n');
    }

    writeln!(content, "local M = {{}}").unwrap();
    content.push('\n');

    for func_i in 0..config.functions_per_file {
        writeln!(content, "local function func_{}_{}(x, y)", index, func_i).unwrap();
        writeln!(content, "    local result = x + y * {}", func_i + 1).unwrap();
        writeln!(content, "    if result == nil then").unwrap();
        writeln!(content, "        return 0").unwrap();
        writeln!(content, "    end").unwrap();
        writeln!(content, "    return result").unwrap();
        writeln!(content, "end").unwrap();
        content.push('\n');
    }

    for method_i in 0..config.methods_per_file {
        writeln!(content, "function M:method_{}_{}(value)", index, method_i).unwrap();
        writeln!(content, "    self.value_{} = value", method_i).unwrap();
        writeln!(content, "end").unwrap();
        content.push('\n');
    }

    for line_i in 0..config.extra_lines_per_file {
        writeln!(content, "M.var_{}_{} = {}", index, line_i, line_i + 1).unwrap();
    }

    content.push_str("\nreturn M\n");
    content
}

/// Create a temporary fixture workspace from the given configuration.
///
/// Returns a `TempDir` whose path contains the generated `.lua` files.
/// The directory is cleaned up when the `TempDir` is dropped.
///
/// Calling this twice with the same `FixtureConfig` produces byte-identical files.
pub fn create_fixture_workspace(config: &FixtureConfig) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory for fixture workspace");
    write_fixture_workspace(temp_dir.path(), config);
    temp_dir
}

/// Write fixture files into an existing directory.
pub fn write_fixture_workspace(dir: &Path, config: &FixtureConfig) {
    for i in 0..config.file_count {
        let content = generate_lua_file_content(i, config);
        let filename = format!("{}.lua", module_name(i));
        let filepath = dir.join(&filename);
        std::fs::write(&filepath, &content)
            .unwrap_or_else(|e| panic!("Failed to write fixture file {}: {}", filename, e));
    }
}
