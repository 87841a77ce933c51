//
// documentation.rs
//
// Predefined completion data loaded from flat documentation files
//

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::cross_file::file_cache::FileCache;

/// File listing free words, one per line.
pub const WORDS_FILE: &str = "words";
/// File listing `typeName member1 member2 ...` per line.
pub const MEMBERS_FILE: &str = "members";
/// File listing `name|returnType|arg1|arg2|...` per line.
pub const CALLS_FILE: &str = "calls";

/// A documented function from the `calls` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredefinedCall {
    /// Leaf name
    pub name: String,
    /// Object or module the call belongs to
    pub owner: Option<String>,
    /// Name as written in the file
    pub qualified_name: String,
    pub return_type: String,
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberTable {
    /// Every member word, in file order
    pub words: Vec<String>,
    by_type: IndexMap<String, Vec<String>>,
}

impl MemberTable {
    /// Members documented for `type_name`; empty when unknown.
    pub fn members_of(&self, type_name: &str) -> &[String] {
        self.by_type.get(type_name).map_or(&[], Vec::as_slice)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallTable {
    /// Every call leaf name, in file order
    pub words: Vec<String>,
    by_name: IndexMap<String, Vec<PredefinedCall>>,
    by_owner: IndexMap<String, Vec<PredefinedCall>>,
}

impl CallTable {
    /// Calls whose leaf name is `name`.
    pub fn calls_named(&self, name: &str) -> &[PredefinedCall] {
        self.by_name.get(name).map_or(&[], Vec::as_slice)
    }

    /// Calls documented on `owner`.
    pub fn calls_of(&self, owner: &str) -> &[PredefinedCall] {
        self.by_owner.get(owner).map_or(&[], Vec::as_slice)
    }
}

/// Non-empty lines.
pub fn parse_words(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// `typeName member1 member2 ...` per line. A repeated type name replaces
/// the earlier line's members.
pub fn parse_members(text: &str) -> MemberTable {
    let mut table = MemberTable::default();
    for line in parse_words(text) {
        let mut parts = line.split(' ').filter(|part| !part.is_empty());
        let Some(type_name) = parts.next() else {
            continue;
        };
        let members: Vec<String> = parts.map(str::to_string).collect();
        table.words.extend(members.iter().cloned());
        table.by_type.insert(type_name.to_string(), members);
    }
    table
}

/// `name|returnType|arg1|arg2|...` per line.
///
/// The name may be qualified as `owner:leaf` or `owner.leaf`; an owner
/// containing spaces keeps only its last word (so `static Foo:bar` is
/// documented on `Foo`).
pub fn parse_calls(text: &str) -> CallTable {
    let mut table = CallTable::default();
    for line in parse_words(text) {
        let mut parts = line.split('|');
        let qualified_name = parts.next().unwrap_or_default().trim().to_string();
        if qualified_name.is_empty() {
            continue;
        }
        let return_type = parts.next().unwrap_or_default().trim().to_string();
        let arguments = parts
            .map(str::trim)
            .filter(|arg| !arg.is_empty())
            .map(str::to_string)
            .collect();

        let (owner, name) = match qualified_name.rfind([':', '.']) {
            Some(idx) => {
                let owner = qualified_name[..idx]
                    .split_whitespace()
                    .next_back()
                    .map(str::to_string);
                (owner, qualified_name[idx + 1..].to_string())
            }
            None => (
                None,
                qualified_name
                    .split_whitespace()
                    .next_back()
                    .unwrap_or_default()
                    .to_string(),
            ),
        };

        let call = PredefinedCall {
            name: name.clone(),
            owner: owner.clone(),
            qualified_name,
            return_type,
            arguments,
        };
        table.words.push(name.clone());
        if let Some(owner) = owner {
            table.by_owner.entry(owner).or_default().push(call.clone());
        }
        table.by_name.entry(name).or_default().push(call);
    }
    table
}

/// The three documentation files of one directory, each memoized and
/// revalidated by modification time. A missing directory or file reads as
/// empty.
#[derive(Debug, Default)]
pub struct PredefinedDocumentation {
    dir: Option<PathBuf>,
    words: FileCache<Vec<String>>,
    members: FileCache<MemberTable>,
    calls: FileCache<CallTable>,
}

impl PredefinedDocumentation {
    pub fn new(dir: Option<PathBuf>) -> Self {
        if let Some(dir) = &dir {
            log::info!("Predefined documentation directory: {}", dir.display());
        }
        Self {
            dir,
            ..Self::default()
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn file(&self, name: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(name))
    }

    pub fn words(&self) -> Arc<Vec<String>> {
        match self.file(WORDS_FILE) {
            Some(path) => self.words.get_or_parse(&path, parse_words),
            None => Arc::default(),
        }
    }

    pub fn members(&self) -> Arc<MemberTable> {
        match self.file(MEMBERS_FILE) {
            Some(path) => self.members.get_or_parse(&path, parse_members),
            None => Arc::default(),
        }
    }

    pub fn calls(&self) -> Arc<CallTable> {
        match self.file(CALLS_FILE) {
            Some(path) => self.calls.get_or_parse(&path, parse_calls),
            None => Arc::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_words_drops_blank_lines() {
        assert_eq!(parse_words("alpha\n\nbeta\r\n"), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_parse_members() {
        let table = parse_members("Entity id name\nVector x y z\n\n");
        assert_eq!(table.members_of("Entity"), ["id", "name"]);
        assert_eq!(table.members_of("Vector"), ["x", "y", "z"]);
        assert!(table.members_of("Missing").is_empty());
        assert_eq!(table.words, vec!["id", "name", "x", "y", "z"]);
        assert_eq!(table.type_names().collect::<Vec<_>>(), vec!["Entity", "Vector"]);
    }

    #[test]
    fn test_parse_calls() {
        let table = parse_calls(
            "print|void|value\nEntity:getName|string|\nstatic Galaxy:sector|Sector|x|y\nmath.lerp|number|a|b|t\n",
        );
        assert_eq!(table.words, vec!["print", "getName", "sector", "lerp"]);

        let print = &table.calls_named("print")[0];
        assert_eq!(print.owner, None);
        assert_eq!(print.return_type, "void");
        assert_eq!(print.arguments, vec!["value"]);

        let get_name = &table.calls_of("Entity")[0];
        assert_eq!(get_name.name, "getName");
        assert!(get_name.arguments.is_empty());

        let sector = &table.calls_of("Galaxy")[0];
        assert_eq!(sector.qualified_name, "static Galaxy:sector");
        assert_eq!(sector.arguments, vec!["x", "y"]);

        assert_eq!(table.calls_of("math")[0].name, "lerp");
        assert!(table.calls_of("print").is_empty());
    }

    #[test]
    fn test_missing_directory_reads_empty() {
        let docs = PredefinedDocumentation::new(None);
        assert!(docs.words().is_empty());
        assert!(docs.members().words.is_empty());
        assert!(docs.calls().words.is_empty());

        let dir = TempDir::new().unwrap();
        let docs = PredefinedDocumentation::new(Some(dir.path().join("nowhere")));
        assert!(docs.words().is_empty());
    }

    #[test]
    fn test_loads_files_from_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(WORDS_FILE), "Entity\nGalaxy\n").unwrap();
        std::fs::write(dir.path().join(MEMBERS_FILE), "Entity index\n").unwrap();
        std::fs::write(dir.path().join(CALLS_FILE), "Entity:destroy|void|\n").unwrap();

        let docs = PredefinedDocumentation::new(Some(dir.path().to_path_buf()));
        assert_eq!(*docs.words(), vec!["Entity", "Galaxy"]);
        assert_eq!(docs.members().members_of("Entity"), ["index"]);
        assert_eq!(docs.calls().calls_named("destroy").len(), 1);

        let again = docs.words();
        assert!(Arc::ptr_eq(&again, &docs.words()));
    }
}
