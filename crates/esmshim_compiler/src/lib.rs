//! esmshim_compiler: transform pipeline orchestration.
//!
//! Runs parse -> CommonJS transform for a single module, falling back to the
//! lossy rewrite when the module cannot be parsed, and drives the same
//! pipeline over a batch of files in parallel.

use esmshim_diagnostics::{messages, Diagnostic, DiagnosticCollection, SyntaxError};
use esmshim_options::TransformOptions;
use esmshim_parser::parse_program;
use esmshim_path::{
    change_extension, ensure_trailing_directory_separator, normalize_path, normalize_slashes,
    resolve_specifier,
};
use esmshim_transformers::{fallback_transform, CommonJsTransformer};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Transform one module with default options.
///
/// `specifier` names the module in diagnostics and logs; `current_path` is
/// its resolved location, used to resolve relative and absolute sources.
/// Never fails: unparseable input yields the fallback rewrite.
pub fn transform_module(source: &str, specifier: Option<&str>, current_path: Option<&str>) -> String {
    ModuleTransformer::new(TransformOptions::default())
        .transform(source, specifier, current_path)
        .code
}

/// The result of transforming one module.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// Classic-script code, executable as a function body receiving
    /// `module`, `exports` and `require`.
    pub code: String,
    pub diagnostics: DiagnosticCollection,
    /// Whether the module could not be parsed and `code` is the lossy
    /// fallback rewrite.
    pub used_fallback: bool,
}

/// Transforms modules with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct ModuleTransformer {
    options: TransformOptions,
}

impl ModuleTransformer {
    pub fn new(options: TransformOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Transform a module, falling back to the lossy rewrite on a syntax
    /// error.
    pub fn transform(&self, source: &str, specifier: Option<&str>, current_path: Option<&str>) -> TransformOutput {
        let name = specifier.or(current_path).unwrap_or("<anonymous>");
        match self.try_transform(source, specifier, current_path) {
            Ok(output) => output,
            Err(err) => {
                warn!("Falling back to lossy rewrite for {}: {}", name, err);
                let mut diagnostics = DiagnosticCollection::new();
                diagnostics.add(err.to_diagnostic(name));
                let mut note = Diagnostic::new(
                    &messages::MODULE_0_FELL_BACK_TO_LOSSY_REWRITE_1,
                    &[name, err.message.as_str()],
                );
                note.file = Some(name.to_string());
                diagnostics.add(note);
                TransformOutput {
                    code: fallback_transform(source),
                    diagnostics,
                    used_fallback: true,
                }
            }
        }
    }

    /// Transform a module, returning the syntax error instead of falling
    /// back.
    pub fn try_transform(
        &self,
        source: &str,
        specifier: Option<&str>,
        current_path: Option<&str>,
    ) -> Result<TransformOutput, SyntaxError> {
        let program = parse_program(source)?;
        let mut transformer = CommonJsTransformer::new(&self.options);
        let code = transformer.transform(&program, source, current_path);
        let name = specifier.or(current_path).unwrap_or("<anonymous>");
        if program.has_module_syntax() {
            debug!("Transformed {} ({} statements)", name, program.body.len());
        } else {
            debug!("{} has no import or export declarations", name);
        }
        Ok(TransformOutput {
            code,
            diagnostics: transformer.take_diagnostics(),
            used_fallback: false,
        })
    }
}

// ============================================================================
// Batch compilation
// ============================================================================

/// A set of module files transformed together.
pub struct Program {
    /// Transform options.
    pub options: TransformOptions,
    /// The root file names.
    pub root_files: Vec<String>,
    /// Directory that module paths are computed relative to.
    pub root_dir: Option<PathBuf>,
    /// URL (or path) joined with each file's relative path to form the
    /// module path used for specifier resolution.
    pub base_url: Option<String>,
    /// Output directory; no files are written without one.
    pub out_dir: Option<PathBuf>,
    /// Loaded sources as (file name, text).
    source_files: Vec<(String, String)>,
}

/// The result of transforming one file of a [`Program`].
#[derive(Debug, Clone)]
pub struct EmitResult {
    pub file_name: String,
    /// Path the module was resolved as.
    pub module_path: String,
    pub output: TransformOutput,
    /// Where the output is written, when an output directory is set.
    pub output_path: Option<PathBuf>,
}

impl Program {
    /// Create a new program from root files and options.
    pub fn new(root_files: Vec<String>, options: TransformOptions) -> Self {
        Self {
            options,
            root_files,
            root_dir: None,
            base_url: None,
            out_dir: None,
            source_files: Vec::new(),
        }
    }

    /// Add a source file to the program.
    pub fn add_source(&mut self, file_name: String, source_text: String) {
        self.source_files.push((file_name, source_text));
    }

    /// Load all root files from disk.
    pub fn load_root_files(&mut self) -> Result<(), std::io::Error> {
        for file in &self.root_files {
            let content = std::fs::read_to_string(file)?;
            self.source_files.push((file.clone(), content));
        }
        Ok(())
    }

    pub fn source_files(&self) -> &[(String, String)] {
        &self.source_files
    }

    /// `file_name` relative to the root directory, with `/` separators.
    fn relative_path(&self, file_name: &str) -> String {
        let relative = self
            .root_dir
            .as_deref()
            .and_then(|root| Path::new(file_name).strip_prefix(root).ok())
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.to_string());
        normalize_slashes(&relative)
    }

    /// The module path of `file_name`: its path relative to the root
    /// directory, joined to the base URL when one is set.
    pub fn module_path(&self, file_name: &str) -> String {
        let relative = self.relative_path(file_name);
        match &self.base_url {
            Some(base) => {
                let specifier = format!("./{}", relative.trim_start_matches("./").trim_start_matches('/'));
                resolve_specifier(&specifier, Some(&ensure_trailing_directory_separator(base)))
            }
            None => relative,
        }
    }

    /// Where the output of `file_name` is written: its path relative to the
    /// root directory, mirrored under the output directory.
    fn output_path(&self, file_name: &str) -> Option<PathBuf> {
        let out_dir = self.out_dir.as_ref()?;
        let relative = normalize_path(&self.relative_path(file_name));
        let relative: Vec<&str> = relative
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != "..")
            .collect();
        Some(out_dir.join(change_extension(&relative.join("/"), ".js")))
    }

    /// Transform every source file in parallel.
    pub fn emit(&self) -> Vec<EmitResult> {
        info!("Transforming {} modules", self.source_files.len());
        let transformer = ModuleTransformer::new(self.options.clone());
        self.source_files
            .par_iter()
            .map(|(file_name, source_text)| {
                let module_path = self.module_path(file_name);
                let output =
                    transformer.transform(source_text, Some(file_name.as_str()), Some(module_path.as_str()));
                EmitResult {
                    file_name: file_name.clone(),
                    module_path,
                    output,
                    output_path: self.output_path(file_name),
                }
            })
            .collect()
    }

    /// Write output files to disk.
    ///
    /// Fails without writing anything if two results share an output path.
    pub fn write_output_files(&self, results: &[EmitResult]) -> std::io::Result<()> {
        let mut seen = FxHashSet::default();
        for path in results.iter().filter_map(|r| r.output_path.as_ref()) {
            if !seen.insert(path) {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("more than one input is written to {}", path.display()),
                ));
            }
        }

        for result in results {
            let Some(path) = &result.output_path else {
                continue;
            };
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &result.output.code)?;
        }
        Ok(())
    }
}

/// All diagnostics of a batch, sorted by file and position.
pub fn collect_diagnostics(results: &[EmitResult]) -> DiagnosticCollection {
    let mut all_diagnostics = DiagnosticCollection::new();
    for result in results {
        all_diagnostics.extend(result.output.diagnostics.clone());
    }
    all_diagnostics.sort();
    all_diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_module_entry() {
        let code = transform_module("export const a = 1;", Some("./a.js"), None);
        assert_eq!(code, "var exports = module.exports;\n\nconst a = 1;\nexports.a = a;");
    }

    #[test]
    fn test_fallback_records_diagnostics() {
        let output = ModuleTransformer::default().transform("import x 'y';", Some("./m.js"), None);
        assert!(output.used_fallback);
        assert!(output.code.contains("// Fallback transformation due to parsing error"));

        let codes: Vec<u32> = output.diagnostics.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![1005, 9000]);
        assert_eq!(
            output.diagnostics.diagnostics()[1].message_text,
            "Module './m.js' could not be parsed, emitted lossy fallback output: 'from' expected."
        );
    }

    #[test]
    fn test_module_path() {
        let mut program = Program::new(Vec::new(), TransformOptions::default());
        assert_eq!(program.module_path("src\\main.js"), "src/main.js");

        program.root_dir = Some(PathBuf::from("/project"));
        program.base_url = Some("http://localhost:8080/app".to_string());
        assert_eq!(
            program.module_path("/project/src/main.js"),
            "http://localhost:8080/app/src/main.js"
        );
        assert_eq!(program.module_path("lib/x.js"), "http://localhost:8080/app/lib/x.js");
    }

    #[test]
    fn test_output_path() {
        let mut program = Program::new(Vec::new(), TransformOptions::default());
        assert_eq!(program.output_path("src/foo.mjs"), None);
        program.out_dir = Some(PathBuf::from("dist"));
        assert_eq!(program.output_path("src/foo.mjs"), Some(PathBuf::from("dist/src/foo.js")));
        assert_eq!(program.output_path("../up/foo.js"), Some(PathBuf::from("dist/up/foo.js")));

        program.root_dir = Some(PathBuf::from("/project"));
        assert_eq!(program.output_path("/project/lib/a.js"), Some(PathBuf::from("dist/lib/a.js")));
    }

    #[test]
    fn test_same_base_name_gets_distinct_output_paths() {
        let mut program = Program::new(Vec::new(), TransformOptions::default());
        program.out_dir = Some(PathBuf::from("dist"));
        program.add_source("src/a.js".to_string(), "export const a = 1;".to_string());
        program.add_source("lib/a.js".to_string(), "export const b = 2;".to_string());

        let results = program.emit();
        assert_eq!(results[0].output_path, Some(PathBuf::from("dist/src/a.js")));
        assert_eq!(results[1].output_path, Some(PathBuf::from("dist/lib/a.js")));
    }

    #[test]
    fn test_colliding_output_paths_are_rejected() {
        let out_dir = std::env::temp_dir().join(format!("esmshim_collide_{}", std::process::id()));
        let mut program = Program::new(Vec::new(), TransformOptions::default());
        program.out_dir = Some(out_dir.clone());
        program.add_source("a.js".to_string(), "export const a = 1;".to_string());
        program.add_source("../a.js".to_string(), "export const b = 2;".to_string());

        let results = program.emit();
        let err = program.write_output_files(&results).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
        assert!(!out_dir.join("a.js").exists());
    }
}
