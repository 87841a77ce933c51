//
// cross_file/path_resolve.rs
//
// Resolution of require() module names to files
//

use std::path::{Component, Path, PathBuf};

use tower_lsp::lsp_types::Url;

/// Settings that shape module name resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions<'a> {
    /// Extension tried after each literal attempt, without the dot
    pub extension: &'a str,
    /// Placeholder substituted by the module name in search patterns
    pub placeholder: char,
}

impl Default for ResolveOptions<'_> {
    fn default() -> Self {
        Self {
            extension: "lua",
            placeholder: '?',
        }
    }
}

/// Candidate relative paths for a module name, in resolution order.
///
/// The literal name, then the name with the extension, then for each
/// pattern the substituted pattern as-is and with the extension. A dotted
/// name also tries its slash form right after each dotted attempt.
pub fn candidate_paths(name: &str, patterns: &[String], options: ResolveOptions<'_>) -> Vec<String> {
    let mut forms = vec![name.to_string()];
    if name.contains('.') && !name.starts_with('.') {
        forms.push(name.replace('.', "/"));
    }

    let mut stems: Vec<String> = forms.clone();
    for pattern in patterns {
        stems.extend(forms.iter().map(|form| {
            pattern.replacen(options.placeholder, form, 1)
        }));
    }

    let mut candidates = Vec::new();
    let mut push = |candidate: String| {
        if !candidate.is_empty() && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    // Literal forms first, then literal forms with the extension.
    let literal = forms.len();
    for stem in &stems[..literal] {
        push(stem.clone());
    }
    for stem in &stems[..literal] {
        push(with_extension(stem, options.extension));
    }
    for group in stems[literal..].chunks(literal) {
        for stem in group {
            push(stem.clone());
        }
        for stem in group {
            push(with_extension(stem, options.extension));
        }
    }
    candidates
}

fn with_extension(stem: &str, extension: &str) -> String {
    if extension.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{extension}")
    }
}

/// Resolve a `require` name from `requiring_file`.
///
/// Each candidate is tried in the requiring file's directory, then in each
/// ancestor up to the filesystem root. The first existing regular file
/// wins; the returned path is normalized.
pub fn resolve_require(
    name: &str,
    requiring_file: &Path,
    patterns: &[String],
    options: ResolveOptions<'_>,
) -> Option<PathBuf> {
    let start_dir = requiring_file.parent()?;

    for candidate in candidate_paths(name, patterns, options) {
        let relative = Path::new(&candidate);
        if relative.is_absolute() {
            if relative.is_file() {
                return normalize_path(relative);
            }
            continue;
        }

        // `ancestors` ends at the root, which bounds the walk.
        for dir in start_dir.ancestors() {
            let path = dir.join(relative);
            if path.is_file() {
                log::trace!("Resolved require '{}' to {}", name, path.display());
                return normalize_path(&path);
            }
        }
    }

    None
}

/// Normalize a path by resolving `.` and `..` components lexically.
pub fn normalize_path(path: &Path) -> Option<PathBuf> {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                // Never pop past the root or a prefix
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                }
            }
            Component::CurDir => {}
            c => components.push(c),
        }
    }

    if components.is_empty() {
        return None;
    }

    Some(components.into_iter().collect())
}

/// Convert a file URI to a path, or `None` for non-file URIs.
pub fn uri_to_path(uri: &Url) -> Option<PathBuf> {
    uri.to_file_path().ok()
}

/// Convert a resolved path to a file URI.
pub fn path_to_uri(path: &Path) -> Option<Url> {
    Url::from_file_path(path).ok()
}
