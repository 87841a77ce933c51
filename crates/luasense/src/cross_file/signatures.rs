//
// cross_file/signatures.rs
//
// Function signature extraction from Lua source lines
//

use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

use super::require_detect::code_end;

/// How a function name relates to the name it is defined on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OwnerRelation {
    /// Plain global or local function
    #[default]
    None,
    /// Defined with `:`, receives an implicit `self`
    ObjectMethod,
    /// Defined with `.` on a module table
    ModuleMember,
}

impl OwnerRelation {
    /// The separator used between owner and leaf, if any.
    pub fn separator(self) -> Option<char> {
        match self {
            OwnerRelation::None => None,
            OwnerRelation::ObjectMethod => Some(':'),
            OwnerRelation::ModuleMember => Some('.'),
        }
    }
}

/// A function definition found in source text or in the built-in table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    /// Qualified name with parameters, e.g. `Foo:Bar(a, b)`
    pub display_name: String,
    /// Right-most name segment
    pub name: String,
    /// Segments before the last separator, joined with `.`
    pub owner: Option<String>,
    pub relation: OwnerRelation,
    /// Parameter list including the parentheses
    pub raw_parameters: String,
    pub parameters: Vec<String>,
    /// Defining file; `None` for built-ins and unsaved buffers
    pub origin: Option<PathBuf>,
    /// One-based line of the definition (0 for built-ins)
    pub line: u32,
}

impl FunctionSignature {
    /// `owner:name`, `owner.name` or `name`.
    pub fn qualified_name(&self) -> String {
        match (&self.owner, self.relation.separator()) {
            (Some(owner), Some(sep)) => format!("{owner}{sep}{}", self.name),
            _ => self.name.clone(),
        }
    }

    pub fn with_origin(mut self, origin: PathBuf) -> Self {
        self.origin = Some(origin);
        self
    }
}

fn function_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Groups: 1=name with params, 2=name, 3=params
        Regex::new(r"\bfunction\b\s*(([^(]*?)\s*(\([^)]*\)))").unwrap()
    })
}

/// Extract function definitions line by line.
///
/// Only the first definition on a line is taken. Anonymous functions
/// (`function(...)`) and matches inside a line comment are skipped.
///
/// # Examples
///
/// ```
/// use luasense::cross_file::signatures::{extract_signatures, OwnerRelation};
///
/// let sigs = extract_signatures("function Foo:Bar(a, b) end");
/// assert_eq!(sigs.len(), 1);
/// assert_eq!(sigs[0].name, "Bar");
/// assert_eq!(sigs[0].owner.as_deref(), Some("Foo"));
/// assert_eq!(sigs[0].relation, OwnerRelation::ObjectMethod);
/// assert_eq!(sigs[0].parameters, vec!["a", "b"]);
/// ```
pub fn extract_signatures(text: &str) -> Vec<FunctionSignature> {
    let pattern = function_pattern();
    let mut signatures = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let Some(caps) = pattern.captures(line) else {
            continue;
        };
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() >= code_end(line) {
            continue;
        }

        let qualified = caps.get(2).map_or("", |m| m.as_str()).trim();
        if qualified.is_empty() {
            continue;
        }

        let relation = if qualified.contains(':') {
            OwnerRelation::ObjectMethod
        } else if qualified.contains('.') {
            OwnerRelation::ModuleMember
        } else {
            OwnerRelation::None
        };

        let (owner, name) = split_qualified_name(qualified);
        let raw_parameters = caps.get(3).map_or("", |m| m.as_str()).trim().to_string();

        signatures.push(FunctionSignature {
            display_name: caps.get(1).map_or("", |m| m.as_str()).trim().to_string(),
            name,
            owner,
            relation,
            parameters: split_parameters(&raw_parameters),
            raw_parameters,
            origin: None,
            line: (idx + 1) as u32,
        });
    }

    log::trace!("Extracted {} function signatures", signatures.len());
    signatures
}

/// Split `a.b:c` into owner `a.b` and leaf `c`.
fn split_qualified_name(qualified: &str) -> (Option<String>, String) {
    let mut segments: Vec<&str> = qualified.split(['.', ':']).map(str::trim).collect();
    let name = segments.pop().unwrap_or_default().to_string();
    if segments.is_empty() {
        (None, name)
    } else {
        (Some(segments.join(".")), name)
    }
}

/// Trimmed parameter names of `(a, b, ...)`, without empty entries.
pub fn split_parameters(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let inner = trimmed.strip_prefix('(').unwrap_or(trimmed);
    let inner = inner.strip_suffix(')').unwrap_or(inner);
    inner
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
