//
// cross_file/require_detect.rs
//
// Detection of require() calls and package.path configuration
//

use regex::Regex;
use std::sync::OnceLock;

use crate::scanner::{scan_line, ScanState};

/// A `require` reference found in source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequireReference {
    /// Module name as written, e.g. `util` or `lib.json`
    pub name: String,
    /// 0-based line of the call
    pub line: u32,
    /// 0-based byte column of the module name literal
    pub column: u32,
}

/// Dependency declarations of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequireMetadata {
    pub requires: Vec<RequireReference>,
    /// Search patterns from `package.path`, each with exactly one placeholder
    pub search_patterns: Vec<String>,
}

struct RequirePatterns {
    require: Regex,
    package_path: Regex,
    string_literal: Regex,
}

fn patterns() -> &'static RequirePatterns {
    static PATTERNS: OnceLock<RequirePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // Groups: 1=double-quoted, 2=single-quoted
        RequirePatterns {
            require: Regex::new(r#"\brequire\s*\(?\s*(?:"([^"]+)"|'([^']+)')"#).unwrap(),
            package_path: Regex::new(r"\bpackage\s*\.\s*path\s*=").unwrap(),
            string_literal: Regex::new(r#""([^"]*)"|'([^']*)'"#).unwrap(),
        }
    })
}

fn capture_literal<'t>(caps: &regex::Captures<'t>) -> Option<regex::Match<'t>> {
    caps.get(1).or_else(|| caps.get(2))
}

/// Byte offset where the code part of `line` ends. `--` inside a string
/// literal does not start a comment.
pub(crate) fn code_end(line: &str) -> usize {
    scan_line(line, ScanState::Default)
        .comment_start()
        .unwrap_or(line.len())
}

/// Parse `require` references and `package.path` patterns using `?` as
/// the module name placeholder.
pub fn parse_requires(content: &str) -> RequireMetadata {
    parse_requires_with_placeholder(content, '?')
}

/// Parse `require` references and `package.path` patterns.
///
/// Each string literal on a `package.path = ...` line is split on `;` and
/// the entries containing exactly one `placeholder` are kept. Every
/// `require("x")`, `require "x"` and `require 'x'` on a line is recorded.
/// Matches inside line comments are ignored.
pub fn parse_requires_with_placeholder(content: &str, placeholder: char) -> RequireMetadata {
    log::trace!("Starting require parsing");
    let patterns = patterns();
    let mut meta = RequireMetadata::default();

    for (line_num, line) in content.lines().enumerate() {
        let line_num = line_num as u32;
        let code_limit = code_end(line);

        if let Some(m) = patterns.package_path.find(line) {
            if m.start() < code_limit {
                let assigned = line.get(m.end()..code_limit).unwrap_or("");
                for caps in patterns.string_literal.captures_iter(assigned) {
                    let Some(literal) = capture_literal(&caps) else {
                        continue;
                    };
                    for entry in literal.as_str().split(';') {
                        let entry = entry.trim();
                        if entry.matches(placeholder).count() == 1
                            && !meta.search_patterns.iter().any(|p| p == entry)
                        {
                            meta.search_patterns.push(entry.to_string());
                        }
                    }
                }
                log::trace!(
                    "  Parsed package.path at line {}: {} patterns so far",
                    line_num,
                    meta.search_patterns.len()
                );
            }
        }

        for caps in patterns.require.captures_iter(line) {
            let Some(name) = capture_literal(&caps) else {
                continue;
            };
            if name.start() >= code_limit {
                break;
            }
            log::trace!(
                "  Parsed require at line {}: name='{}'",
                line_num,
                name.as_str()
            );
            meta.requires.push(RequireReference {
                name: name.as_str().to_string(),
                line: line_num,
                column: name.start() as u32,
            });
        }
    }

    log::trace!(
        "Completed require parsing: {} requires, {} search patterns",
        meta.requires.len(),
        meta.search_patterns.len()
    );

    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(meta: &RequireMetadata) -> Vec<&str> {
        meta.requires.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_require_call_forms() {
        let content = r#"local a = require("alpha")
local b = require "beta"
local c = require 'gamma'
local d = require ( 'delta' )"#;
        let meta = parse_requires(content);
        assert_eq!(names(&meta), vec!["alpha", "beta", "gamma", "delta"]);
        assert_eq!(meta.requires[1].line, 1);
    }

    #[test]
    fn test_dotted_module_name() {
        let meta = parse_requires("local json = require('lib.json')");
        assert_eq!(names(&meta), vec!["lib.json"]);
        assert_eq!(meta.requires[0].column, 22);
    }

    #[test]
    fn test_multiple_requires_on_one_line() {
        let meta = parse_requires(r#"local a, b = require("a"), require("b")"#);
        assert_eq!(names(&meta), vec!["a", "b"]);
    }

    #[test]
    fn test_commented_require_ignored() {
        let meta = parse_requires("-- require('old')\nx = 1 -- require \"note\"");
        assert!(meta.requires.is_empty());
    }

    #[test]
    fn test_dashes_inside_string_do_not_start_comment() {
        let meta = parse_requires(r#"local sep = "--"; local util = require("util")"#);
        assert_eq!(names(&meta), vec!["util"]);

        let meta = parse_requires("print('--') require 'log' -- require 'old'");
        assert_eq!(names(&meta), vec!["log"]);
    }

    #[test]
    fn test_dynamic_require_ignored() {
        let meta = parse_requires("local m = require(name)");
        assert!(meta.requires.is_empty());
    }

    #[test]
    fn test_package_path_patterns() {
        let content = r#"package.path = "./?.lua;./lib/?.lua;;" .. package.path
package.path = package.path .. ';./vendor/?/init.lua'"#;
        let meta = parse_requires(content);
        assert_eq!(
            meta.search_patterns,
            vec!["./?.lua", "./lib/?.lua", "./vendor/?/init.lua"]
        );
    }

    #[test]
    fn test_package_path_requires_single_placeholder() {
        let meta = parse_requires(r#"package.path = "?/??.lua;./plain.lua;./?.lua""#);
        assert_eq!(meta.search_patterns, vec!["./?.lua"]);
    }

    #[test]
    fn test_custom_placeholder() {
        let meta = parse_requires_with_placeholder(r#"package.path = "./%.lua;./?.lua""#, '%');
        assert_eq!(meta.search_patterns, vec!["./%.lua"]);
    }

    #[test]
    fn test_package_path_duplicates_collapsed() {
        let content = "package.path = './?.lua'\npackage.path = './?.lua'";
        let meta = parse_requires(content);
        assert_eq!(meta.search_patterns, vec!["./?.lua"]);
    }
}
