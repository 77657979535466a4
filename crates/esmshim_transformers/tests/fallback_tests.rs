//! Fallback rewrite tests.
//!
//! The fallback never parses; these tests pin down which single-line forms
//! it rewrites and that leftover declarations are commented out.

use esmshim_transformers::fallback_transform;

/// Helper: output lines that still start with a static import/export.
fn module_lines(output: &str) -> Vec<&str> {
    output
        .lines()
        .filter(|line| {
            let line = line.trim_start();
            (line.starts_with("import ") || line.starts_with("import{") || line.starts_with("export"))
                && !line.starts_with("exports.")
        })
        .collect()
}

#[test]
fn test_rewrites_every_supported_form() {
    let source = "\
import d from './d.js';
import * as ns from \"./ns.js\";
import { a, b as c } from './ab.js';
import './side.js';
export * as all from './all.js';
export * from './star.js';
export { x, y as z } from './xy.js';
export const k = 1;
export function f() {}
export default 42;
export { k as key };
export {};
";
    let output = fallback_transform(source);

    for expected in [
        "const d = require('./d.js').default;",
        "const ns = require('./ns.js');",
        "const { a, b: c } = require('./ab.js');",
        "require('./side.js');",
        "exports.all = require('./all.js');",
        "Object.assign(exports, require('./star.js'));",
        "exports.x = require('./xy.js').x;\nexports.z = require('./xy.js').y;",
        "\nconst k = 1;\n",
        "\nfunction f() {}\n",
        "exports.default = 42;",
    ] {
        assert!(output.contains(expected), "missing {:?} in:\n{}", expected, output);
    }
    assert!(output.ends_with("exports.k = k;\nexports.f = f;\nexports.key = k;\n\nmodule.exports = exports;"));
    assert!(module_lines(&output).is_empty(), "{}", output);
}

#[test]
fn test_unterminated_import_is_commented_out() {
    let output = fallback_transform("import { a from './m.js';\nrun(a);");
    assert!(output.contains("// import { a from './m.js';\nrun(a);"));
    assert!(module_lines(&output).is_empty());
}

#[test]
fn test_mixed_import_is_commented_out() {
    let output = fallback_transform("import d, { a } from './m.js';");
    assert!(output.contains("// import d, { a } from './m.js';"));
}

#[test]
fn test_multi_line_lists() {
    let output = fallback_transform("import {\n  a,\n  b as c,\n} from './m.js';\nexport {\n  a,\n  c as d,\n};");
    assert!(output.contains("const { a, b: c } = require('./m.js');"));
    assert!(output.contains("exports.a = a;\nexports.d = c;\n"));
    assert!(module_lines(&output).is_empty());
}

#[test]
fn test_declarations_keep_modifiers() {
    let output = fallback_transform("export async function* gen() {}\nexport class Store {}\nexport let n;");
    assert!(output.contains("\nasync function* gen() {}\nclass Store {}\nlet n;\n"));
    assert!(output.contains("exports.gen = gen;\nexports.Store = Store;\nexports.n = n;"));
}

#[test]
fn test_unnamed_declarations_keep_their_bindings() {
    let output = fallback_transform(
        "export const { a, b: c } = obj;\nexport const [x, , ...rest] = list;\nexport let \u{f1} = 1;",
    );
    assert!(output.contains("\nconst { a, b: c } = obj;\nconst [x, , ...rest] = list;\nlet \u{f1} = 1;\n"));
    assert!(output.ends_with(
        "exports.a = a;\nexports.c = c;\nexports.x = x;\nexports.rest = rest;\n\nmodule.exports = exports;"
    ));
    assert!(module_lines(&output).is_empty(), "{}", output);
}

#[test]
fn test_dynamic_import_and_strings_untouched() {
    let source = "const lazy = import('./lazy.js');\nconst s = 'export default x';";
    let output = fallback_transform(source);
    assert!(output.contains(source));
}

#[test]
fn test_default_export_of_object_spanning_lines() {
    let output = fallback_transform("export default {\n  a: 1,\n};");
    assert!(output.contains("exports.default = {\n  a: 1,\n};"));
}
