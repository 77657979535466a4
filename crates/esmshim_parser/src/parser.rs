//! The module-level parser implementation.
//!
//! A single-pass recursive descent parser over the scanner's primitives.
//! The grammar is flat: only the statement-leading keywords below are
//! recognized, everything else becomes an opaque `ExpressionStatement` whose
//! text is reproduced byte-for-byte.

use esmshim_ast::node::*;
use esmshim_ast::syntax_kind::{SyntaxKind, STATEMENT_KEYWORDS};
use esmshim_ast::types::*;
use esmshim_core::text::TextRange;
use esmshim_diagnostics::{messages, ParseResult};
use esmshim_scanner::Scanner;

use crate::utilities::{classify_expression, collect_binding_names};

/// Keyword that selects a statement production, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementKeyword {
    Import,
    Export,
    Variable(VariableKind),
    Function,
    Class,
}

/// Parse a complete module.
pub fn parse_program(source: &str) -> ParseResult<Program> {
    Parser::new(source).parse_program()
}

/// The parser produces a `Program` from module source text.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self {
            scanner: Scanner::new(source_text),
        }
    }

    pub fn parse_program(mut self) -> ParseResult<Program> {
        self.scanner.skip_shebang();
        self.scanner.skip_space()?;
        let mut body = Vec::new();
        while !self.scanner.is_eof() {
            body.push(self.parse_statement()?);
            self.scanner.skip_space()?;
        }
        Ok(Program::new(body))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    #[inline]
    fn pos(&self) -> usize {
        self.scanner.pos()
    }

    #[inline]
    fn skip_space(&mut self) -> ParseResult<()> {
        self.scanner.skip_space()
    }

    fn node(&self, kind: SyntaxKind, start: usize) -> NodeData {
        NodeData::new(kind, start, self.pos())
    }

    /// Consume an optional `;`, leaving the cursor untouched when none follows.
    fn parse_optional_semicolon(&mut self) -> ParseResult<()> {
        let save_pos = self.pos();
        self.skip_space()?;
        if !self.scanner.match_str(";") {
            self.scanner.set_pos(save_pos);
        }
        Ok(())
    }

    /// `async function` with no line break after `async`.
    fn at_async_function(&mut self) -> bool {
        self.scanner.look_ahead(|s| {
            s.match_keyword("async")
                && matches!(s.skip_trivia(), Ok(false))
                && s.peek_keyword("function")
        })
    }

    fn at_function(&mut self) -> bool {
        self.scanner.peek_keyword("function") || self.at_async_function()
    }

    fn statement_keyword(&mut self) -> Option<StatementKeyword> {
        if self.at_async_function() {
            return Some(StatementKeyword::Function);
        }
        let kind = STATEMENT_KEYWORDS.iter().copied().find(|kind| {
            kind.keyword_text()
                .is_some_and(|kw| self.scanner.peek_keyword(kw))
        })?;
        let keyword = match kind {
            SyntaxKind::ImportKeyword => StatementKeyword::Import,
            SyntaxKind::ExportKeyword => StatementKeyword::Export,
            SyntaxKind::ConstKeyword => StatementKeyword::Variable(VariableKind::Const),
            SyntaxKind::LetKeyword => StatementKeyword::Variable(VariableKind::Let),
            SyntaxKind::VarKeyword => StatementKeyword::Variable(VariableKind::Var),
            SyntaxKind::FunctionKeyword => StatementKeyword::Function,
            SyntaxKind::ClassKeyword => StatementKeyword::Class,
            _ => return None,
        };
        let accepted = match keyword {
            // `import(...)` and `import.meta` are expressions.
            StatementKeyword::Import => self.scanner.look_ahead(|s| {
                s.match_keyword_kind(kind)
                    && s.skip_space().is_ok()
                    && !s.peek_str("(")
                    && !s.peek_str(".")
            }),
            // `let` is an ordinary identifier unless a binding follows.
            StatementKeyword::Variable(_) => self.scanner.look_ahead(|s| {
                s.match_keyword_kind(kind)
                    && s.skip_space().is_ok()
                    && (s.at_identifier_start() || s.peek_str("{") || s.peek_str("["))
            }),
            _ => true,
        };
        accepted.then_some(keyword)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.statement_keyword() {
            Some(StatementKeyword::Import) => Ok(Statement::Import(self.parse_import()?)),
            Some(StatementKeyword::Export) => self.parse_export(),
            Some(StatementKeyword::Variable(kind)) => Ok(Statement::Variable(
                self.parse_variable_declaration(kind)?,
            )),
            Some(StatementKeyword::Function) => Ok(Statement::Function(
                self.parse_function_declaration(true)?,
            )),
            Some(StatementKeyword::Class) => {
                Ok(Statement::Class(self.parse_class_declaration(true)?))
            }
            None => self.parse_opaque_statement(),
        }
    }

    fn parse_opaque_statement(&mut self) -> ParseResult<Statement> {
        let range = self.scanner.skip_statement()?;
        let literal = Literal {
            data: NodeData::new(SyntaxKind::Literal, range.pos, range.end),
            value: LiteralValue::Raw(self.scanner.text_of(range).to_string()),
        };
        Ok(Statement::Expression(ExpressionStatement {
            data: NodeData::new(SyntaxKind::ExpressionStatement, range.pos, range.end),
            expression: Expression::Literal(literal),
        }))
    }

    /// Skip an expression and classify it. An empty expression is an error.
    fn parse_expression_span(&mut self) -> ParseResult<Expression> {
        let range = self.scanner.skip_expression()?;
        if range.is_empty() {
            return Err(self.scanner.error_here(&messages::EXPRESSION_EXPECTED, &[]));
        }
        Ok(classify_expression(self.scanner.text(), range))
    }

    // ========================================================================
    // Imports
    // ========================================================================

    fn parse_import(&mut self) -> ParseResult<ImportDeclaration> {
        let start = self.pos();
        self.scanner.expect_keyword("import")?;
        self.skip_space()?;

        // Side-effect import
        if matches!(self.scanner.current(), Some('\'' | '"')) {
            let source = self.scanner.parse_string()?;
            self.parse_optional_semicolon()?;
            return Ok(ImportDeclaration {
                data: self.node(SyntaxKind::ImportDeclaration, start),
                specifiers: Vec::new(),
                source,
            });
        }

        let mut specifiers = Vec::new();
        if self.scanner.at_identifier_start() {
            let local = self.scanner.parse_identifier()?;
            specifiers.push(Specifier::ImportDefault { local });
            self.skip_space()?;
            if self.scanner.match_str(",") {
                self.skip_space()?;
                self.parse_import_bindings(&mut specifiers)?;
            }
        } else {
            self.parse_import_bindings(&mut specifiers)?;
        }

        self.skip_space()?;
        let source = self.parse_from_clause()?;
        self.parse_optional_semicolon()?;
        Ok(ImportDeclaration {
            data: self.node(SyntaxKind::ImportDeclaration, start),
            specifiers,
            source,
        })
    }

    /// `* as ns` or `{ a, b as c }`.
    fn parse_import_bindings(&mut self, specifiers: &mut Vec<Specifier>) -> ParseResult<()> {
        if self.scanner.match_str("*") {
            self.skip_space()?;
            self.scanner.expect_keyword("as")?;
            self.skip_space()?;
            let local = self.scanner.parse_identifier()?;
            specifiers.push(Specifier::ImportNamespace { local });
            return Ok(());
        }
        if !self.scanner.peek_str("{") {
            return Err(self.scanner.error_here(&messages::_0_EXPECTED, &["{"]));
        }
        for (imported, local) in self.parse_named_bindings()? {
            specifiers.push(Specifier::Import { imported, local });
        }
        Ok(())
    }

    /// A brace-delimited list of `name` or `name as alias`, allowing an empty
    /// list and a trailing comma. Returns `(name, alias)` pairs.
    fn parse_named_bindings(&mut self) -> ParseResult<Vec<(Identifier, Identifier)>> {
        self.scanner.expect_str("{")?;
        let mut pairs = Vec::new();
        loop {
            self.skip_space()?;
            if self.scanner.match_str("}") {
                break;
            }
            let name = self.scanner.parse_identifier()?;
            self.skip_space()?;
            let alias = if self.scanner.match_keyword("as") {
                self.skip_space()?;
                self.scanner.parse_identifier()?
            } else {
                name.clone()
            };
            pairs.push((name, alias));
            self.skip_space()?;
            if self.scanner.match_str(",") {
                continue;
            }
            self.scanner.expect_str("}")?;
            break;
        }
        Ok(pairs)
    }

    /// `from '<specifier>'`
    fn parse_from_clause(&mut self) -> ParseResult<StringLiteral> {
        self.scanner.expect_keyword("from")?;
        self.skip_space()?;
        self.scanner.parse_string()
    }

    // ========================================================================
    // Exports
    // ========================================================================

    fn parse_export(&mut self) -> ParseResult<Statement> {
        let start = self.pos();
        self.scanner.expect_keyword("export")?;
        self.skip_space()?;

        if self.scanner.match_keyword("default") {
            self.skip_space()?;
            let declaration = self.parse_default_declaration()?;
            return Ok(Statement::ExportDefault(ExportDefaultDeclaration {
                data: self.node(SyntaxKind::ExportDefaultDeclaration, start),
                declaration,
            }));
        }

        if self.scanner.match_str("*") {
            self.skip_space()?;
            let exported = if self.scanner.match_keyword("as") {
                self.skip_space()?;
                let exported = self.scanner.parse_identifier()?;
                self.skip_space()?;
                Some(exported)
            } else {
                None
            };
            let source = self.parse_from_clause()?;
            self.parse_optional_semicolon()?;
            return Ok(match exported {
                Some(exported) => Statement::ExportNamed(ExportNamedDeclaration {
                    data: self.node(SyntaxKind::ExportNamedDeclaration, start),
                    declaration: None,
                    specifiers: vec![Specifier::ExportNamespace { exported }],
                    source: Some(source),
                }),
                None => Statement::ExportAll(ExportAllDeclaration {
                    data: self.node(SyntaxKind::ExportAllDeclaration, start),
                    source,
                }),
            });
        }

        if self.scanner.peek_str("{") {
            let specifiers = self
                .parse_named_bindings()?
                .into_iter()
                .map(|(local, exported)| Specifier::Export { local, exported })
                .collect();
            let save_pos = self.pos();
            self.skip_space()?;
            let source = if self.scanner.peek_keyword("from") {
                Some(self.parse_from_clause()?)
            } else {
                self.scanner.set_pos(save_pos);
                None
            };
            self.parse_optional_semicolon()?;
            return Ok(Statement::ExportNamed(ExportNamedDeclaration {
                data: self.node(SyntaxKind::ExportNamedDeclaration, start),
                declaration: None,
                specifiers,
                source,
            }));
        }

        let declaration = match self.statement_keyword() {
            Some(StatementKeyword::Variable(kind)) => {
                Declaration::Variable(self.parse_variable_declaration(kind)?)
            }
            Some(StatementKeyword::Function) => {
                Declaration::Function(self.parse_function_declaration(true)?)
            }
            Some(StatementKeyword::Class) => {
                Declaration::Class(self.parse_class_declaration(true)?)
            }
            _ => {
                return Err(self
                    .scanner
                    .error_here(&messages::DECLARATION_OR_STATEMENT_EXPECTED, &[]))
            }
        };
        Ok(Statement::ExportNamed(ExportNamedDeclaration {
            data: self.node(SyntaxKind::ExportNamedDeclaration, start),
            declaration: Some(declaration),
            specifiers: Vec::new(),
            source: None,
        }))
    }

    fn parse_default_declaration(&mut self) -> ParseResult<DefaultDeclaration> {
        if self.at_function() {
            return Ok(DefaultDeclaration::Function(
                self.parse_function_declaration(false)?,
            ));
        }
        if self.scanner.peek_keyword("class") {
            return Ok(DefaultDeclaration::Class(
                self.parse_class_declaration(false)?,
            ));
        }
        let expression = self.parse_expression_span()?;
        self.parse_optional_semicolon()?;
        Ok(DefaultDeclaration::Expression(expression))
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn parse_variable_declaration(&mut self, kind: VariableKind) -> ParseResult<VariableDeclaration> {
        let start = self.pos();
        self.scanner.expect_keyword(kind.as_str())?;
        let mut declarations = Vec::new();
        loop {
            self.skip_space()?;
            declarations.push(self.parse_variable_declarator()?);
            let save_pos = self.pos();
            self.skip_space()?;
            if !self.scanner.match_str(",") {
                self.scanner.set_pos(save_pos);
                break;
            }
        }
        self.parse_optional_semicolon()?;
        Ok(VariableDeclaration {
            data: self.node(SyntaxKind::VariableDeclaration, start),
            kind,
            declarations,
        })
    }

    fn parse_variable_declarator(&mut self) -> ParseResult<VariableDeclarator> {
        let start = self.pos();
        let id = if self.scanner.peek_str("{") || self.scanner.peek_str("[") {
            let mut names = Vec::new();
            collect_binding_names(&mut self.scanner, &mut names)?;
            BindingName::Pattern(BindingPattern {
                data: self.node(SyntaxKind::BindingPattern, start),
                names,
            })
        } else {
            BindingName::Identifier(self.scanner.parse_identifier()?)
        };

        let save_pos = self.pos();
        self.skip_space()?;
        let init = if self.scanner.peek_str("=") && !self.scanner.peek_str("==") {
            self.scanner.match_str("=");
            self.skip_space()?;
            Some(self.parse_expression_span()?)
        } else {
            self.scanner.set_pos(save_pos);
            None
        };

        Ok(VariableDeclarator {
            data: self.node(SyntaxKind::VariableDeclarator, start),
            id,
            init,
        })
    }

    /// `[async] function [*] [name] (...) {...}`. The name is optional only
    /// for a default export.
    fn parse_function_declaration(&mut self, require_name: bool) -> ParseResult<FunctionDeclaration> {
        let start = self.pos();
        let mut flags = FunctionFlags::NONE;
        if self.scanner.match_keyword("async") {
            flags |= FunctionFlags::ASYNC;
            self.skip_space()?;
        }
        self.scanner.expect_keyword("function")?;
        self.skip_space()?;
        if self.scanner.match_str("*") {
            flags |= FunctionFlags::GENERATOR;
            self.skip_space()?;
        }

        let id = if self.scanner.at_identifier_start() {
            Some(self.scanner.parse_identifier()?)
        } else if require_name {
            return Err(self.scanner.error_here(&messages::FUNCTION_NAME_EXPECTED, &[]));
        } else {
            None
        };

        self.skip_space()?;
        let params = vec![self.parse_parameters()?];
        self.skip_space()?;
        self.scanner.skip_block(b'{', b'}')?;

        Ok(FunctionDeclaration {
            data: self.node(SyntaxKind::FunctionDeclaration, start),
            id,
            params,
            flags,
        })
    }

    /// A single placeholder covering the parameter list. A malformed list
    /// recovers at the next `)`.
    fn parse_parameters(&mut self) -> ParseResult<Parameter> {
        let start = self.pos();
        if !self.scanner.peek_str("(") {
            return Err(self.scanner.error_here(&messages::_0_EXPECTED, &["("]));
        }
        if self.scanner.skip_parens().is_err() {
            self.scanner.set_pos(start + 1);
            self.scanner.skip_past(b')');
        }
        Ok(Parameter {
            data: self.node(SyntaxKind::Parameter, start),
        })
    }

    /// `class [name] [extends <expr>] {...}`. The name is optional only for a
    /// default export.
    fn parse_class_declaration(&mut self, require_name: bool) -> ParseResult<ClassDeclaration> {
        let start = self.pos();
        self.scanner.expect_keyword("class")?;
        self.skip_space()?;

        let id = if self.scanner.at_identifier_start() && !self.scanner.peek_keyword("extends") {
            Some(self.scanner.parse_identifier()?)
        } else if require_name {
            return Err(self.scanner.error_here(&messages::FUNCTION_NAME_EXPECTED, &[]));
        } else {
            None
        };

        self.skip_space()?;
        let super_class = if self.scanner.match_keyword("extends") {
            self.skip_space()?;
            let range: TextRange = self.scanner.skip_to_block()?;
            if range.is_empty() {
                return Err(self.scanner.error_here(&messages::EXPRESSION_EXPECTED, &[]));
            }
            Some(classify_expression(self.scanner.text(), range))
        } else {
            None
        };

        self.skip_space()?;
        self.scanner.skip_block(b'{', b'}')?;

        Ok(ClassDeclaration {
            data: self.node(SyntaxKind::ClassDeclaration, start),
            id,
            super_class,
        })
    }
}
