//! esmshim_path: Module specifier resolution and path utilities.
//!
//! Import and export sources are rewritten against the path of the module
//! that contains them so the loader receives location-independent
//! specifiers. Bare specifiers (`react`, `lodash/fp`) are left for the
//! loader to resolve.

use tracing::trace;
use url::{Origin, Url};

/// Resolve `specifier` against the path of the module that imports it.
///
/// - `./x`, `../x`: joined with the directory of `current_path`
/// - `/x`: appended to the origin of `current_path` when it is a URL
/// - anything else, or no current path: returned unchanged
pub fn resolve_specifier(specifier: &str, current_path: Option<&str>) -> String {
    let Some(current_path) = current_path.filter(|p| !p.is_empty()) else {
        return specifier.to_string();
    };
    if is_bare_specifier(specifier) {
        return specifier.to_string();
    }

    let resolved = if is_relative_specifier(specifier) {
        resolve_relative(specifier, current_path)
    } else if specifier.starts_with('/') {
        resolve_absolute(specifier, current_path)
    } else {
        None
    };

    match resolved {
        Some(resolved) => {
            trace!("Resolved {} against {}: {}", specifier, current_path, resolved);
            resolved
        }
        None => specifier.to_string(),
    }
}

/// Whether `specifier` is absolute but cannot be resolved because
/// `current_path` has no origin to anchor it to.
pub fn requires_origin(specifier: &str, current_path: Option<&str>) -> bool {
    match current_path.filter(|p| !p.is_empty()) {
        Some(current_path) => specifier.starts_with('/') && parse_url(current_path).is_none(),
        None => false,
    }
}

/// Whether `specifier` starts with `.` (relative to the importing module).
#[inline]
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with('.')
}

/// Whether `specifier` is neither relative nor absolute.
pub fn is_bare_specifier(specifier: &str) -> bool {
    !specifier.is_empty() && !is_relative_specifier(specifier) && !specifier.starts_with('/')
}

fn resolve_relative(specifier: &str, current_path: &str) -> Option<String> {
    match parse_url(current_path) {
        Some(base) => base.join(specifier).ok().map(String::from),
        None => {
            let directory = get_directory_path(current_path);
            Some(normalize_path(&combine_paths(&directory, specifier)))
        }
    }
}

fn resolve_absolute(specifier: &str, current_path: &str) -> Option<String> {
    let base = parse_url(current_path)?;
    // Protocol-relative specifiers carry their own host.
    if specifier.starts_with("//") {
        return base.join(specifier).ok().map(String::from);
    }
    match base.origin() {
        origin @ Origin::Tuple(..) => Some(format!("{}{}", origin.ascii_serialization(), specifier)),
        Origin::Opaque(_) => base.join(specifier).ok().map(String::from),
    }
}

/// Parse `path` as a URL. Single-letter schemes are Windows drive letters,
/// not URLs.
fn parse_url(path: &str) -> Option<Url> {
    Url::parse(path).ok().filter(|url| url.scheme().len() > 1)
}

// ============================================================================
// Path utilities
// ============================================================================

/// Convert backslashes to forward slashes and resolve `.` and `..` segments.
/// Leading `..` segments of a relative path are kept.
pub fn normalize_path(path: &str) -> String {
    let path = normalize_slashes(path);
    let rooted = path.starts_with('/');
    let trailing = path.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            _ => segments.push(segment),
        }
    }

    let mut result = segments.join("/");
    if rooted {
        result.insert(0, '/');
    }
    if trailing && !segments.is_empty() {
        result.push('/');
    }
    if result.is_empty() {
        result.push('.');
    }
    result
}

/// Convert backslashes to forward slashes.
pub fn normalize_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Combine two path segments.
pub fn combine_paths(base: &str, relative: &str) -> String {
    if relative.starts_with('/') || base.is_empty() {
        return relative.to_string();
    }
    format!("{}{}", ensure_trailing_directory_separator(base), relative)
}

/// Get the directory path (everything up to and including the last `/`).
pub fn get_directory_path(path: &str) -> String {
    let normalized = normalize_slashes(path);
    match normalized.rfind('/') {
        Some(last_slash) => normalized[..=last_slash].to_string(),
        None => String::new(),
    }
}

/// Remove the file extension from a path.
pub fn remove_extension(path: &str) -> &str {
    match path.rfind('.') {
        Some(dot_pos) if dot_pos > path.rfind(['/', '\\']).map_or(0, |p| p + 1) => {
            &path[..dot_pos]
        }
        _ => path,
    }
}

/// Change the extension of a path.
pub fn change_extension(path: &str, new_ext: &str) -> String {
    format!("{}{}", remove_extension(path), new_ext)
}

/// Ensure a path ends with a directory separator.
pub fn ensure_trailing_directory_separator(path: &str) -> String {
    if path.ends_with('/') || path.ends_with('\\') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

/// Check if a path has a JavaScript module extension.
pub fn has_js_file_extension(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".js") || lower.ends_with(".mjs")
}
