//! esmshim_options: transform options and `esmshim.json` project files.
//!
//! [`TransformOptions`] tunes the CommonJS rewrite; [`EsmShimConfig`] is the
//! on-disk project description used by the batch compiler and the CLI.

use esmshim_path::has_js_file_extension;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project file looked up by the CLI.
pub const CONFIG_FILE_NAME: &str = "esmshim.json";

/// Options controlling how a module is rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformOptions {
    /// Where the `require` bindings for imports are emitted.
    pub import_placement: ImportPlacement,
    /// Always emit `imported: local` in destructured requires, even when the
    /// names are equal.
    pub explicit_import_renames: bool,
    /// Wrap modules using top-level `await` in an async IIFE.
    pub wrap_top_level_await: bool,
    /// Merge named exports onto a default export that is a declared function
    /// or class.
    pub merge_default_exports: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            import_placement: ImportPlacement::AfterDeclarations,
            explicit_import_renames: false,
            wrap_top_level_await: true,
            merge_default_exports: true,
        }
    }
}

/// Placement of translated imports in the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportPlacement {
    /// After plain statements and exported declarations.
    #[default]
    AfterDeclarations,
    /// Directly after the `exports` preamble, ahead of all other code.
    BeforeStatements,
}

/// The `esmshim.json` file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EsmShimConfig {
    pub transform_options: Option<TransformOptions>,
    pub files: Option<Vec<String>>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub out_dir: Option<String>,
    /// URL that input paths are joined to when computing module paths.
    pub base_url: Option<String>,
}

impl EsmShimConfig {
    /// The configured transform options, or the defaults.
    pub fn transform_options(&self) -> TransformOptions {
        self.transform_options.clone().unwrap_or_default()
    }

    /// Include patterns, defaulting to every JavaScript module under the root.
    pub fn include_patterns(&self) -> Vec<String> {
        match &self.include {
            Some(include) if !include.is_empty() => include.clone(),
            _ => vec!["**/*".to_string()],
        }
    }

    /// Exclude patterns, defaulting to `node_modules`.
    pub fn exclude_patterns(&self) -> Vec<String> {
        self.exclude
            .clone()
            .unwrap_or_else(|| vec!["node_modules".to_string()])
    }
}

/// Errors raised while loading a project file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid project file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parse an `esmshim.json` file from a string.
pub fn parse_config(content: &str) -> Result<EsmShimConfig, serde_json::Error> {
    serde_json::from_str(content)
}

/// Parse an `esmshim.json` file from a path.
pub fn parse_config_file(path: &str) -> Result<EsmShimConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    Ok(parse_config(&content)?)
}

/// Pretty-printed default project file, written by `esmshim --init`.
pub fn default_config_json() -> String {
    let config = EsmShimConfig {
        transform_options: Some(TransformOptions::default()),
        include: Some(vec!["src/**/*.js".to_string()]),
        exclude: Some(vec!["node_modules".to_string()]),
        out_dir: Some("dist".to_string()),
        ..Default::default()
    };
    serde_json::to_string_pretty(&config).unwrap_or_default()
}

// ============================================================================
// Source file discovery
// ============================================================================

/// Discover source files matching include/exclude patterns.
///
/// An explicit `files` list wins over `include`. Results are sorted and
/// deduplicated.
pub fn discover_source_files(
    root_dir: &str,
    include: &[String],
    exclude: &[String],
    files: Option<&[String]>,
) -> Vec<String> {
    let mut result = Vec::new();

    if let Some(file_list) = files {
        for f in file_list {
            let path = if Path::new(f).is_absolute() {
                PathBuf::from(f)
            } else {
                PathBuf::from(root_dir).join(f)
            };
            if path.is_file() {
                result.push(path.to_string_lossy().to_string());
            }
        }
        return result;
    }

    for pattern in include {
        collect_matching_files(Path::new(root_dir), pattern, exclude, &mut result);
    }

    result.sort();
    result.dedup();
    result
}

fn collect_matching_files(root: &Path, pattern: &str, exclude: &[String], result: &mut Vec<String>) {
    let pattern = pattern.trim_start_matches("./");

    if let Some(star_star) = pattern.find("**") {
        let base = root.join(&pattern[..star_star]);
        let file_pattern = pattern[star_star + 2..].trim_start_matches('/');
        walk_directory(&base, file_pattern, exclude, result);
    } else if pattern.contains('*') {
        let (dir, file_pattern) = split_directory(pattern);
        let Ok(entries) = std::fs::read_dir(root.join(dir)) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && matches_file_pattern(&path, file_pattern) {
                push_unless_excluded(&path, exclude, result);
            }
        }
    } else {
        let path = root.join(pattern);
        if path.is_file() {
            push_unless_excluded(&path, exclude, result);
        }
    }
}

fn walk_directory(dir: &Path, file_pattern: &str, exclude: &[String], result: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if is_excluded(&path.to_string_lossy(), exclude) {
            continue;
        }
        if path.is_dir() {
            let dir_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if matches!(dir_name, "node_modules" | ".git") {
                continue;
            }
            walk_directory(&path, file_pattern, exclude, result);
        } else if path.is_file() && matches_file_pattern(&path, file_pattern) {
            result.push(path.to_string_lossy().to_string());
        }
    }
}

fn split_directory(pattern: &str) -> (&str, &str) {
    match pattern.rfind('/') {
        Some(slash) => (&pattern[..slash], &pattern[slash + 1..]),
        None => ("", pattern),
    }
}

/// Match a file name against a single-star pattern. A bare `*` (or an empty
/// pattern) matches JavaScript modules only.
fn matches_file_pattern(path: &Path, pattern: &str) -> bool {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    match pattern {
        "" | "*" => has_js_file_extension(file_name),
        _ => match pattern.find('*') {
            Some(star_pos) => {
                let prefix = &pattern[..star_pos];
                let suffix = &pattern[star_pos + 1..];
                file_name.len() >= prefix.len() + suffix.len()
                    && file_name.starts_with(prefix)
                    && file_name.ends_with(suffix)
            }
            None => file_name == pattern,
        },
    }
}

fn push_unless_excluded(path: &Path, exclude: &[String], result: &mut Vec<String>) {
    let path_str = path.to_string_lossy().to_string();
    if !is_excluded(&path_str, exclude) {
        result.push(path_str);
    }
}

fn is_excluded(path: &str, exclude: &[String]) -> bool {
    let path = path.replace('\\', "/");
    exclude.iter().any(|pattern| {
        let needle = pattern
            .trim_start_matches("./")
            .trim_start_matches("**/")
            .trim_end_matches("/**");
        match needle.strip_prefix('*') {
            Some(suffix) => !suffix.is_empty() && path.ends_with(suffix),
            None => !needle.is_empty() && path.contains(needle),
        }
    })
}
