//! End-to-end tests of the indexer together with the completion and
//! signature-hint engines, over workspaces written to a temporary directory.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use ropey::Rope;

use super::indexer::{IndexSettings, SymbolIndexer};
use crate::completion::{complete, CompletionRequest, CompletionSources, TriggerReason};
use crate::documentation::{CallTable, MemberTable};
use crate::signature_hint::signature_hint;

/// Temporary directory of Lua files, removed on drop.
pub struct TestWorkspace {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let root = temp_dir.path().to_path_buf();
        log::trace!("Created test workspace at: {}", root.display());
        Ok(Self {
            _temp_dir: temp_dir,
            root,
        })
    }

    /// Write `content` to `path` (relative to the root), creating parent
    /// directories.
    pub fn add_file(&self, path: &str, content: &str) -> Result<PathBuf> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full, content)?;
        Ok(full)
    }

    pub fn path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn indexer() -> SymbolIndexer {
    SymbolIndexer::new(IndexSettings {
        include_builtins: false,
        ..IndexSettings::default()
    })
}

/// Completion texts for `text` with the cursor at its end, as if `text`
/// were the unsaved content of `path`.
fn complete_at_end(indexer: &SymbolIndexer, path: &Path, text: &str) -> Vec<String> {
    let rope = Rope::from_str(text);
    let document = indexer.document_signatures(text);
    let visible = indexer.signatures_visible_from_buffer(path, text);
    let members = MemberTable::default();
    let calls = CallTable::default();
    let sources = CompletionSources {
        document: &document,
        visible: &visible,
        words: &[],
        members: &members,
        calls: &calls,
    };
    let request = CompletionRequest {
        doc: &rope,
        cursor: rope.len_chars(),
        reason: TriggerReason::Explicit,
        idle_completion: false,
    };
    complete(&request, &sources)
        .map(|list| list.candidates.into_iter().map(|c| c.text).collect())
        .unwrap_or_default()
}

#[test]
fn test_method_completion_from_required_module() -> Result<()> {
    let ws = TestWorkspace::new()?;
    ws.add_file(
        "player.lua",
        "local Player = {}\nfunction Player:jump(height) end\nfunction Player:run() end\nreturn Player\n",
    )?;
    let main = ws.path("main.lua");
    let text = "local Player = require('player')\nPlayer:";

    let names = complete_at_end(&indexer(), &main, text);
    assert_eq!(names, vec!["jump", "run"]);
    Ok(())
}

#[test]
fn test_package_path_pattern_resolves_subdirectory() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let json = ws.add_file("vendor/json.lua", "local json = {}\nfunction json.encode(value) end\nreturn json\n")?;
    let main = ws.add_file(
        "main.lua",
        "package.path = \"vendor/?.lua;\" .. package.path\nlocal json = require(\"json\")\n",
    )?;

    let indexer = indexer();
    let scan = indexer.extract_dependencies(&main);
    assert_eq!(scan.paths(), vec![json]);

    let names: Vec<String> = indexer
        .signatures_visible_from(&main)
        .iter()
        .map(|s| s.qualified_name())
        .collect();
    assert_eq!(names, vec!["json.encode"]);
    Ok(())
}

#[test]
fn test_dotted_module_name_uses_directories() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let http = ws.add_file("net/http.lua", "function get(url) end\n")?;
    let main = ws.add_file("main.lua", "local http = require('net.http')\n")?;

    assert_eq!(indexer().extract_dependencies(&main).paths(), vec![http]);
    Ok(())
}

#[test]
fn test_module_found_in_ancestor_directory() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let shared = ws.add_file("shared.lua", "function common() end\n")?;
    let nested = ws.add_file("src/game/level.lua", "require('shared')\n")?;

    assert_eq!(indexer().extract_dependencies(&nested).paths(), vec![shared]);
    Ok(())
}

#[test]
fn test_signature_hint_from_transitive_dependency() -> Result<()> {
    let ws = TestWorkspace::new()?;
    ws.add_file("a.lua", "require('b')\n")?;
    ws.add_file("b.lua", "function spawn(kind, x, y) end\n")?;
    let main = ws.path("main.lua");
    let text = "require('a')\nspawn('orc', ";

    let indexer = indexer();
    let rope = Rope::from_str(text);
    let visible = indexer.signatures_visible_from_buffer(&main, text);
    let hint = signature_hint(&rope, rope.len_chars(), &visible, &CallTable::default())
        .expect("hint for spawn");
    assert_eq!(hint.signatures[0].label(), "spawn(kind, x, y)");
    assert_eq!(hint.active_argument, Some(1));
    Ok(())
}

#[test]
fn test_invalidate_picks_up_new_definitions() -> Result<()> {
    let ws = TestWorkspace::new()?;
    let util = ws.add_file("util.lua", "function first() end\n")?;
    let main = ws.add_file("main.lua", "require('util')\n")?;

    let indexer = indexer();
    assert_eq!(indexer.signatures_visible_from(&main).len(), 1);

    std::fs::write(&util, "function first() end\nfunction second() end\n")?;
    indexer.invalidate(&util);
    let names: Vec<String> = indexer
        .signatures_visible_from(&main)
        .iter()
        .map(|s| s.name.clone())
        .collect();
    assert_eq!(names, vec!["first", "second"]);
    Ok(())
}

#[test]
fn test_unsaved_buffer_requires_resolve_against_disk() -> Result<()> {
    let ws = TestWorkspace::new()?;
    ws.add_file("config.lua", "local C = {}\nfunction C.load(path) end\nreturn C\n")?;
    let main = ws.path("main.lua");

    let indexer = indexer();
    let scan = indexer.buffer_dependencies(&main, "local C = require('config')\nrequire('absent')\n");
    assert_eq!(scan.resolved.len(), 1);
    assert_eq!(scan.unresolved.len(), 1);
    assert_eq!(scan.unresolved[0].name, "absent");
    assert_eq!(scan.unresolved[0].line, 1);
    assert!(ws.root().join("config.lua").is_file());
    Ok(())
}
