//
// function_filter.rs
//
// "Functions in document" search
//

use std::collections::HashSet;

use regex::RegexBuilder;

use crate::cross_file::signatures::FunctionSignature;

/// A function matching a locator query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionMatch {
    /// `leaf(params)`, or `owner:leaf` when an earlier match shares the leaf
    pub label: String,
    /// Owning name, shown as secondary text
    pub detail: Option<String>,
    pub signature: FunctionSignature,
}

/// Translate a `*`/`?` wildcard query into an anchored pattern that matches
/// the query anywhere in the name.
fn wildcard_regex(query: &str) -> Option<regex::Regex> {
    let mut pattern = String::from("^.*");
    for c in query.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            _ => pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern.push_str(".*$");
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()
}

/// Filter `signatures` by `query`, matched against the display name.
///
/// Plain queries match as a case-insensitive substring; queries containing
/// `*` or `?` match as wildcards. Matches whose display name starts with
/// the query come first (case-sensitively when the query has an uppercase
/// letter), otherwise document order is kept.
pub fn filter_functions(signatures: &[FunctionSignature], query: &str) -> Vec<FunctionMatch> {
    let has_wildcard = query.contains(['*', '?']);
    let wildcard = if has_wildcard {
        match wildcard_regex(query) {
            Some(re) => Some(re),
            None => return Vec::new(),
        }
    } else {
        None
    };
    let lowered = query.to_lowercase();
    let case_sensitive_prefix = query.chars().any(char::is_uppercase);

    let mut better = Vec::new();
    let mut good = Vec::new();
    let mut seen_leaves = HashSet::new();

    for sig in signatures {
        let haystack = &sig.display_name;
        let matched = match &wildcard {
            Some(re) => re.is_match(haystack),
            None => haystack.to_lowercase().contains(&lowered),
        };
        if !matched {
            continue;
        }

        let label = if seen_leaves.contains(&sig.name) && sig.owner.is_some() {
            sig.qualified_name()
        } else {
            format!("{}{}", sig.name, sig.raw_parameters)
        };
        let entry = FunctionMatch {
            label,
            detail: sig.owner.clone(),
            signature: sig.clone(),
        };

        let prefix = if case_sensitive_prefix {
            haystack.starts_with(query)
        } else {
            haystack.to_lowercase().starts_with(&lowered)
        };
        if prefix {
            better.push(entry);
        } else {
            good.push(entry);
        }
        seen_leaves.insert(sig.name.clone());
    }

    better.extend(good);
    better
}
