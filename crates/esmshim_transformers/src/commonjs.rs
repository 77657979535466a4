//! AST-driven ES module to CommonJS transform.
//!
//! Every top-level statement is sorted into one of the output sections
//! below and the sections are concatenated in a fixed order, independent
//! of where the statements appeared in the source:
//!
//! 1. the `exports` preamble
//! 2. plain statements, verbatim
//! 3. exported declarations, each followed by its `exports.<name>` assignments
//! 4. imports as `require` bindings
//! 5. named and namespace re-exports
//! 6. `export *` aggregation
//! 7. bare `export { .. }` lists
//! 8. the default export
//!
//! Imports may instead be placed directly after the preamble
//! ([`ImportPlacement::BeforeStatements`]).

use crate::utilities::{contains_top_level_await, quote_string};
use esmshim_ast::node::*;
use esmshim_diagnostics::{messages, Diagnostic, DiagnosticCollection};
use esmshim_options::{ImportPlacement, TransformOptions};
use esmshim_path::{requires_origin, resolve_specifier};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// First line of every transformed module.
pub const EXPORTS_PREAMBLE: &str = "var exports = module.exports;";

/// Local binding synthesized for default-exported expressions.
pub const DEFAULT_BINDING: &str = "__esm_default";

/// Output sections, in emission order.
#[derive(Default)]
struct Sections {
    statements: Vec<String>,
    declarations: Vec<String>,
    imports: Vec<String>,
    reexports: Vec<String>,
    aggregates: Vec<String>,
    /// Bare named exports keyed by exported name.
    named_exports: IndexMap<String, String>,
    default_export: Vec<String>,
}

/// Rewrites a parsed module into CommonJS text.
pub struct CommonJsTransformer {
    options: TransformOptions,
    diagnostics: DiagnosticCollection,
}

impl CommonJsTransformer {
    pub fn new(options: &TransformOptions) -> Self {
        Self {
            options: options.clone(),
            diagnostics: DiagnosticCollection::new(),
        }
    }

    /// Take the notes collected while transforming.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    /// Transform `program`, parsed from `source`, into CommonJS text.
    ///
    /// `current_path` is the resolved path of the module; relative and
    /// absolute import sources are resolved against it.
    pub fn transform(&mut self, program: &Program, source: &str, current_path: Option<&str>) -> String {
        let mut emitter = ModuleEmitter {
            options: &self.options,
            source,
            current_path,
            callables: collect_callable_names(program),
            resolved: FxHashMap::default(),
            sections: Sections::default(),
            awaits: false,
            diagnostics: &mut self.diagnostics,
        };

        for statement in &program.body {
            emitter.emit_statement(statement);
        }

        let wrap = emitter.awaits && self.options.wrap_top_level_await;
        let body = emitter.finish();
        if wrap {
            debug!(
                "Wrapping {} in an async function for top-level await",
                current_path.unwrap_or("<anonymous>")
            );
            wrap_async(&body)
        } else if body.is_empty() {
            format!("{}\n", EXPORTS_PREAMBLE)
        } else {
            format!("{}\n\n{}", EXPORTS_PREAMBLE, body)
        }
    }
}

/// Names of every function and class declared at the top level.
fn collect_callable_names<'p>(program: &'p Program) -> FxHashSet<&'p str> {
    let mut names = FxHashSet::default();
    let mut add = |id: &'p Option<Identifier>| {
        if let Some(id) = id {
            names.insert(id.name.as_str());
        }
    };
    for statement in &program.body {
        match statement {
            Statement::Function(func) => add(&func.id),
            Statement::Class(class) => add(&class.id),
            Statement::ExportNamed(export) => match &export.declaration {
                Some(Declaration::Function(func)) => add(&func.id),
                Some(Declaration::Class(class)) => add(&class.id),
                _ => {}
            },
            Statement::ExportDefault(export) => match &export.declaration {
                DefaultDeclaration::Function(func) => add(&func.id),
                DefaultDeclaration::Class(class) => add(&class.id),
                DefaultDeclaration::Expression(_) => {}
            },
            _ => {}
        }
    }
    names
}

fn wrap_async(body: &str) -> String {
    format!(
        "{}\n\n(async function() {{\n{}\n}})().catch(err => {{\n  console.error('Error in async module:', err);\n  throw err;\n}});",
        EXPORTS_PREAMBLE, body
    )
}

/// Per-call emission state.
struct ModuleEmitter<'t, 's> {
    options: &'t TransformOptions,
    source: &'s str,
    current_path: Option<&'t str>,
    /// Top-level function and class names, for default export merging.
    callables: FxHashSet<&'s str>,
    /// Resolved specifiers, keyed by the raw source value.
    resolved: FxHashMap<&'s str, String>,
    sections: Sections,
    awaits: bool,
    diagnostics: &'t mut DiagnosticCollection,
}

impl<'t, 's> ModuleEmitter<'t, 's> {
    fn text(&self, range: esmshim_core::text::TextRange) -> &'s str {
        range.slice(self.source)
    }

    fn note_await(&mut self, text: &str) {
        if !self.awaits && contains_top_level_await(text) {
            self.awaits = true;
        }
    }

    fn emit_statement(&mut self, statement: &'s Statement) {
        match statement {
            Statement::Import(import) => self.emit_import(import),
            Statement::ExportNamed(export) => self.emit_export_named(export),
            Statement::ExportAll(export) => {
                let source = self.resolve(&export.source);
                self.sections
                    .aggregates
                    .push(format!("Object.assign(exports, require({}));", source));
            }
            Statement::ExportDefault(export) => self.emit_export_default(export),
            Statement::Function(_) | Statement::Class(_) => {
                let text = self.text(statement.range());
                self.sections.statements.push(text.to_string());
            }
            Statement::Variable(_) | Statement::Expression(_) => {
                let text = self.text(statement.range());
                self.note_await(text);
                self.sections.statements.push(text.to_string());
            }
        }
    }

    // ========================================================================
    // Imports
    // ========================================================================

    fn emit_import(&mut self, import: &'s ImportDeclaration) {
        let source = self.resolve(&import.source);
        if import.specifiers.is_empty() {
            self.sections.imports.push(format!("require({});", source));
            return;
        }

        let mut named = Vec::new();
        for specifier in &import.specifiers {
            match specifier {
                Specifier::ImportDefault { local } => self
                    .sections
                    .imports
                    .push(format!("const {} = require({}).default;", local.name, source)),
                Specifier::ImportNamespace { local } => self
                    .sections
                    .imports
                    .push(format!("const {} = require({});", local.name, source)),
                Specifier::Import { imported, local } => {
                    if imported.name == local.name && !self.options.explicit_import_renames {
                        named.push(local.name.clone());
                    } else {
                        named.push(format!("{}: {}", imported.name, local.name));
                    }
                }
                Specifier::Export { .. } | Specifier::ExportNamespace { .. } => {}
            }
        }

        if !named.is_empty() {
            self.sections
                .imports
                .push(format!("const {{ {} }} = require({});", named.join(", "), source));
        }
    }

    // ========================================================================
    // Named exports
    // ========================================================================

    fn emit_export_named(&mut self, export: &'s ExportNamedDeclaration) {
        if let Some(declaration) = &export.declaration {
            self.emit_exported_declaration(declaration);
            return;
        }

        if let Some(source) = &export.source {
            let source = self.resolve(source);
            for specifier in &export.specifiers {
                match specifier {
                    Specifier::Export { local, exported } => self.sections.reexports.push(format!(
                        "exports.{} = require({}).{};",
                        exported.name, source, local.name
                    )),
                    Specifier::ExportNamespace { exported } => self
                        .sections
                        .reexports
                        .push(format!("exports.{} = require({});", exported.name, source)),
                    _ => {}
                }
            }
            return;
        }

        for specifier in &export.specifiers {
            if let Specifier::Export { local, exported } = specifier {
                self.sections
                    .named_exports
                    .insert(exported.name.clone(), local.name.clone());
            }
        }
    }

    fn emit_exported_declaration(&mut self, declaration: &'s Declaration) {
        let text = self.text(declaration.range());
        if let Declaration::Variable(_) = declaration {
            self.note_await(text);
        }
        self.sections.declarations.push(text.to_string());
        for name in declaration.declared_names() {
            self.sections
                .declarations
                .push(format!("exports.{0} = {0};", name.name));
        }
    }

    // ========================================================================
    // Default export
    // ========================================================================

    fn emit_export_default(&mut self, export: &'s ExportDefaultDeclaration) {
        let (value, merge) = match &export.declaration {
            DefaultDeclaration::Expression(Expression::Identifier(id)) => {
                (id.name.clone(), self.callables.contains(id.name.as_str()))
            }
            DefaultDeclaration::Expression(expression) => {
                let text = self.text(expression.range());
                self.note_await(text);
                (self.bind_default(text), false)
            }
            DefaultDeclaration::Function(FunctionDeclaration { id: Some(id), .. })
            | DefaultDeclaration::Class(ClassDeclaration { id: Some(id), .. }) => {
                let text = self.text(export.declaration.range());
                self.sections.declarations.push(text.to_string());
                (id.name.clone(), true)
            }
            DefaultDeclaration::Function(_) | DefaultDeclaration::Class(_) => {
                let text = self.text(export.declaration.range());
                (self.bind_default(text), false)
            }
        };

        self.sections
            .default_export
            .push(format!("exports.default = {};", value));
        if merge && self.options.merge_default_exports {
            self.sections.default_export.extend([
                "if (typeof module !== 'undefined' && module.exports) {".to_string(),
                "  module.exports = Object.assign(exports.default, exports);".to_string(),
                "}".to_string(),
            ]);
        }
    }

    fn bind_default(&mut self, text: &str) -> String {
        let text = text.trim_end().trim_end_matches(';');
        self.sections
            .default_export
            .push(format!("const {} = {};", DEFAULT_BINDING, text));
        DEFAULT_BINDING.to_string()
    }

    // ========================================================================
    // Specifiers
    // ========================================================================

    /// Resolve and quote a module source.
    fn resolve(&mut self, source: &'s StringLiteral) -> String {
        let specifier = source.value.as_str();
        if let Some(resolved) = self.resolved.get(specifier) {
            return resolved.clone();
        }

        if requires_origin(specifier, self.current_path) {
            let current_path = self.current_path.unwrap_or_default();
            self.diagnostics.add(Diagnostic::with_location(
                current_path.to_string(),
                source.data.range.to_span(),
                &messages::CANNOT_RESOLVE_0_WITHOUT_AN_ORIGIN_IN_1,
                &[specifier, current_path],
            ));
        }

        let quoted = quote_string(&resolve_specifier(specifier, self.current_path));
        self.resolved.insert(specifier, quoted.clone());
        quoted
    }

    // ========================================================================
    // Assembly
    // ========================================================================

    /// Concatenate the sections (everything after the preamble).
    fn finish(self) -> String {
        let Sections {
            statements,
            declarations,
            imports,
            reexports,
            aggregates,
            named_exports,
            default_export,
        } = self.sections;

        let (early_imports, late_imports) = match self.options.import_placement {
            ImportPlacement::BeforeStatements => (imports, Vec::new()),
            ImportPlacement::AfterDeclarations => (Vec::new(), imports),
        };

        let mut lines = early_imports;
        lines.extend(statements);
        lines.extend(declarations);
        lines.extend(late_imports);
        lines.extend(reexports);
        lines.extend(aggregates);
        lines.extend(
            named_exports
                .into_iter()
                .map(|(exported, local)| format!("exports.{} = {};", exported, local)),
        );
        lines.extend(default_export);
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Identifier {
        Identifier::new(name, 0, name.len())
    }

    fn string(value: &str) -> StringLiteral {
        StringLiteral {
            data: NodeData::new(esmshim_ast::syntax_kind::SyntaxKind::StringLiteral, 0, value.len() + 2),
            value: value.to_string(),
        }
    }

    fn import(specifiers: Vec<Specifier>, source: &str) -> Statement {
        Statement::Import(ImportDeclaration {
            data: NodeData::new(esmshim_ast::syntax_kind::SyntaxKind::ImportDeclaration, 0, 0),
            specifiers,
            source: string(source),
        })
    }

    #[test]
    fn test_empty_program() {
        let mut transformer = CommonJsTransformer::new(&TransformOptions::default());
        let output = transformer.transform(&Program::new(Vec::new()), "", None);
        assert_eq!(output, "var exports = module.exports;\n");
    }

    #[test]
    fn test_mixed_import_from_nodes() {
        let program = Program::new(vec![import(
            vec![
                Specifier::ImportDefault { local: ident("def") },
                Specifier::Import { imported: ident("a"), local: ident("a") },
                Specifier::Import { imported: ident("b"), local: ident("c") },
            ],
            "./m.js",
        )]);
        let mut transformer = CommonJsTransformer::new(&TransformOptions::default());
        let output = transformer.transform(&program, "", Some("/app/main.js"));
        assert!(output.contains("const def = require('/app/m.js').default;\nconst { a, b: c } = require('/app/m.js');"));
    }

    #[test]
    fn test_explicit_renames_option() {
        let program = Program::new(vec![import(
            vec![Specifier::Import { imported: ident("a"), local: ident("a") }],
            "m",
        )]);
        let options = TransformOptions {
            explicit_import_renames: true,
            ..Default::default()
        };
        let output = CommonJsTransformer::new(&options).transform(&program, "", None);
        assert!(output.ends_with("const { a: a } = require('m');"));
    }

    #[test]
    fn test_absolute_source_without_origin_is_noted() {
        let program = Program::new(vec![
            import(Vec::new(), "/lib/a.js"),
            import(Vec::new(), "/lib/a.js"),
        ]);
        let mut transformer = CommonJsTransformer::new(&TransformOptions::default());
        let output = transformer.transform(&program, "", Some("src/main.js"));
        assert!(output.contains("require('/lib/a.js');"));

        let diagnostics = transformer.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.diagnostics()[0].code, 9001);
        assert!(!diagnostics.has_errors());
        assert!(transformer.take_diagnostics().is_empty());
    }
}
