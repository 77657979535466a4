//! Compiler integration tests.
//!
//! End-to-end tests for the transform pipeline over the fixture modules in
//! `tests/fixtures`: parse -> transform, fallback, and batch emit.

use esmshim_compiler::{collect_diagnostics, transform_module, ModuleTransformer, Program};
use esmshim_options::TransformOptions;
use std::path::{Path, PathBuf};

const BASE: &str = "http://localhost:8080/fixtures/";

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Helper: read a fixture module.
fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_dir().join(name))
        .unwrap_or_else(|err| panic!("cannot read fixture {}: {}", name, err))
}

/// Helper: transform a fixture as if loaded from `BASE`.
fn transform_fixture(name: &str) -> String {
    let current_path = format!("{}{}", BASE, name);
    transform_module(&fixture(name), Some(name), Some(&current_path))
}

/// Helper: output lines that still carry a static import/export.
fn module_lines(output: &str) -> Vec<&str> {
    output
        .lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with("import ") || line.starts_with("export "))
        .collect()
}

// ============================================================================
// Fixture modules
// ============================================================================

#[test]
fn test_values_fixture() {
    assert_eq!(
        transform_fixture("values.js"),
        "\
var exports = module.exports;

const answer = 42
const settings = { mode: 'strict' }
function greet() { return 'hello' }
class Widget {
  render() { return 'widget' }
}
const left = 1
const right = 2
async function load() {
  return Promise.resolve('loaded')
}
Object.assign(exports, require('http://localhost:8080/fixtures/consumer.js'));
exports.answer = answer;
exports.settings = settings;
exports.greet = greet;
exports.Widget = Widget;
exports.renamedAnswer = answer;
exports.left = left;
exports.right = right;
exports.load = load;
const __esm_default = 'default';
exports.default = __esm_default;"
    );
}

#[test]
fn test_consumer_fixture() {
    let output = transform_fixture("consumer.js");
    let values = "require('http://localhost:8080/fixtures/values.js')";
    for expected in [
        format!("const fallbackValue = {}.default;", values),
        format!("const {{ answer, settings, greet, Widget }} = {};", values),
        format!("const {{ answer: renamed }} = {};", values),
        format!("const everything = {};", values),
        format!("const {{ left, right }} = {};", values),
        format!("const def = {}.default;\nconst {{ answer: alias }} = {};", values, values),
    ] {
        assert!(output.contains(&expected), "missing {:?} in:\n{}", expected, output);
    }
    // The exported function precedes the require bindings.
    let check = output.find("function check()").unwrap();
    let first_require = output.find("require(").unwrap();
    assert!(check < first_require);
    assert!(output.contains("}\nexports.check = check;\nconst fallbackValue"));
    assert!(module_lines(&output).is_empty());
}

#[test]
fn test_destructuring_fixture() {
    let output = transform_fixture("destructuring.js");
    assert!(output.ends_with(
        "\
const { host, port, secure: isSecure } = config
exports.host = host;
exports.port = port;
exports.isSecure = isSecure;
const original = config
exports.original = original;"
    ));
}

#[test]
fn test_generator_fixture() {
    let output = transform_fixture("generators.js");
    assert!(output.contains("function* counter() {"));
    assert!(output.contains("async function* letters() {"));
    assert!(output.ends_with("exports.counter = counter;\nexports.letters = letters;"));
}

#[test]
fn test_aggregate_fixture() {
    assert_eq!(
        transform_fixture("aggregate.js"),
        "\
var exports = module.exports;

exports.gen = require('http://localhost:8080/fixtures/generators.js');
exports.shapes = require('http://localhost:8080/fixtures/destructuring.js');
exports.counter = require('http://localhost:8080/fixtures/generators.js').counter;
exports.renamedLetters = require('http://localhost:8080/fixtures/generators.js').letters;"
    );
}

#[test]
fn test_top_level_await_fixture() {
    let output = transform_fixture("top-level-await.js");
    assert!(output.starts_with("var exports = module.exports;\n\n(async function() {\n"));
    assert!(output.contains("const ok = response.ok\nexports.ok = ok;\n})().catch(err => {"));
}

// ============================================================================
// Fallback
// ============================================================================

#[test]
fn test_broken_fixture_falls_back() {
    let output = ModuleTransformer::default().transform(&fixture("broken.js"), Some("broken.js"), None);
    assert!(output.used_fallback);
    assert!(output.diagnostics.has_errors());
    assert!(output.code.contains("// import { helper from './helper.js'"));
    assert!(output.code.contains("\nconst ready = true\n"));
    assert!(output.code.contains("exports.ready = ready;"));
    assert!(module_lines(&output.code).is_empty());
}

#[test]
fn test_strict_transform_reports_error() {
    let err = ModuleTransformer::default()
        .try_transform("export { a } from;", None, None)
        .unwrap_err();
    assert_eq!(err.code, 1141);
}

#[test]
fn test_unterminated_import_never_panics() {
    for source in ["import", "import {", "import { a } from", "export default", "export {", "/* open"] {
        let output = transform_module(source, None, None);
        assert!(output.starts_with("var exports = module.exports;"), "source: {:?}", source);
        assert!(module_lines(&output).is_empty(), "source: {:?}\n{}", source, output);
    }
}

// ============================================================================
// Batch compilation
// ============================================================================

#[test]
fn test_program_emit_in_parallel() {
    let mut program = Program::new(Vec::new(), TransformOptions::default());
    program.base_url = Some(BASE.to_string());
    for name in ["values.js", "aggregate.js", "broken.js"] {
        program.add_source(name.to_string(), fixture(name));
    }

    let results = program.emit();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].module_path, "http://localhost:8080/fixtures/values.js");
    assert!(!results[0].output.used_fallback);
    assert!(results[2].output.used_fallback);
    assert!(results.iter().all(|r| r.output_path.is_none()));

    let diagnostics = collect_diagnostics(&results);
    assert_eq!(diagnostics.error_count(), 1);
    assert_eq!(diagnostics.diagnostics()[0].file.as_deref(), Some("broken.js"));
}

#[test]
fn test_program_writes_output_files() {
    let out_dir = std::env::temp_dir().join(format!("esmshim_compiler_out_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&out_dir);

    let root_files = vec![
        fixture_dir().join("generators.js").to_string_lossy().to_string(),
        fixture_dir().join("destructuring.js").to_string_lossy().to_string(),
    ];
    let mut program = Program::new(root_files, TransformOptions::default());
    program.root_dir = Some(fixture_dir());
    program.out_dir = Some(out_dir.clone());
    program.load_root_files().unwrap();
    assert_eq!(program.source_files().len(), 2);

    let results = program.emit();
    assert_eq!(results[0].module_path, "generators.js");
    program.write_output_files(&results).unwrap();

    let written = std::fs::read_to_string(out_dir.join("generators.js")).unwrap();
    assert_eq!(written, results[0].output.code);
    assert!(out_dir.join("destructuring.js").is_file());
}
