//
// cross_file/dependency.rs
//
// Require resolution results and reachable-file traversal
//

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use super::path_resolve::{resolve_require, ResolveOptions};
use super::require_detect::{RequireMetadata, RequireReference};

/// A `require` reference together with the file it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequire {
    pub reference: RequireReference,
    pub path: PathBuf,
}

/// Outcome of resolving every `require` of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyScan {
    pub resolved: Vec<ResolvedRequire>,
    pub unresolved: Vec<RequireReference>,
}

impl DependencyScan {
    /// Resolved paths in reference order, without duplicates.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.resolved
            .iter()
            .filter(|r| seen.insert(r.path.clone()))
            .map(|r| r.path.clone())
            .collect()
    }
}

/// Resolve the `require` references of `file`.
///
/// Unresolved names are logged and reported, never fatal.
pub fn resolve_dependencies(
    file: &Path,
    meta: &RequireMetadata,
    options: ResolveOptions<'_>,
) -> DependencyScan {
    let mut scan = DependencyScan::default();

    for reference in &meta.requires {
        match resolve_require(&reference.name, file, &meta.search_patterns, options) {
            Some(path) => scan.resolved.push(ResolvedRequire {
                reference: reference.clone(),
                path,
            }),
            None => {
                log::warn!(
                    "Unresolved require '{}' in {} (line {})",
                    reference.name,
                    file.display(),
                    reference.line + 1
                );
                scan.unresolved.push(reference.clone());
            }
        }
    }

    scan
}

/// Breadth-first traversal from `roots` over `dependencies_of`.
///
/// Paths already in `visited` are never yielded, which makes the walk
/// cycle-safe and lets callers exclude a file (such as an open buffer's own
/// path) up front. Each path is yielded at most once, in discovery order.
pub fn breadth_first<F>(
    roots: impl IntoIterator<Item = PathBuf>,
    mut visited: HashSet<PathBuf>,
    mut dependencies_of: F,
) -> Vec<PathBuf>
where
    F: FnMut(&Path) -> Vec<PathBuf>,
{
    let mut order = Vec::new();
    let mut queue = VecDeque::new();

    for root in roots {
        if visited.insert(root.clone()) {
            queue.push_back(root);
        }
    }

    while let Some(path) = queue.pop_front() {
        for dep in dependencies_of(&path) {
            if visited.insert(dep.clone()) {
                queue.push_back(dep);
            }
        }
        order.push(path);
    }

    log::trace!("Reachable file traversal visited {} files", order.len());
    order
}
