//! AST node definitions for module-level ECMAScript.
//!
//! Every node except [`Program`] carries a byte range over the original
//! source. Nodes own their data; a tree is built fresh for each transform and
//! dropped afterwards, so no node is ever shared between two modules.

use crate::syntax_kind::SyntaxKind;
use crate::types::*;
use esmshim_core::text::TextRange;
use serde::Serialize;

// ============================================================================
// Core Node Wrapper
// ============================================================================

/// Common data shared by all AST nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeData {
    /// The kind of this node.
    pub kind: SyntaxKind,
    /// Source position range.
    pub range: TextRange,
}

impl NodeData {
    pub fn new(kind: SyntaxKind, pos: usize, end: usize) -> Self {
        Self {
            kind,
            range: TextRange::new(pos, end),
        }
    }
}

// ============================================================================
// Program
// ============================================================================

/// The root of a parsed module: top-level statements in source order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub body: Vec<Statement>,
}

impl Program {
    pub fn new(body: Vec<Statement>) -> Self {
        Self { body }
    }

    /// Whether the module contains any import or export declaration.
    pub fn has_module_syntax(&self) -> bool {
        self.body.iter().any(Statement::is_module_declaration)
    }
}

// ============================================================================
// Identifier & Literals
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identifier {
    pub data: NodeData,
    pub name: String,
}

impl Identifier {
    pub fn new(name: &str, pos: usize, end: usize) -> Self {
        Self {
            data: NodeData::new(SyntaxKind::Identifier, pos, end),
            name: name.to_string(),
        }
    }
}

/// A quoted module specifier. `value` is the raw text between the quotes;
/// escape sequences are preserved, not decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StringLiteral {
    pub data: NodeData,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    /// Raw string content without quotes.
    String(String),
    /// A decimal integer or fraction.
    Number(f64),
    /// An opaque span copied verbatim.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Literal {
    pub data: NodeData,
    pub value: LiteralValue,
}

/// The only expressions the module grammar distinguishes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Expression {
    Identifier(Identifier),
    Literal(Literal),
}

impl Expression {
    pub fn range(&self) -> TextRange {
        match self {
            Expression::Identifier(id) => id.data.range,
            Expression::Literal(lit) => lit.data.range,
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Statement {
    Import(ImportDeclaration),
    ExportDefault(ExportDefaultDeclaration),
    ExportNamed(ExportNamedDeclaration),
    ExportAll(ExportAllDeclaration),
    Variable(VariableDeclaration),
    Function(FunctionDeclaration),
    Class(ClassDeclaration),
    Expression(ExpressionStatement),
}

impl Statement {
    pub fn data(&self) -> &NodeData {
        match self {
            Statement::Import(n) => &n.data,
            Statement::ExportDefault(n) => &n.data,
            Statement::ExportNamed(n) => &n.data,
            Statement::ExportAll(n) => &n.data,
            Statement::Variable(n) => &n.data,
            Statement::Function(n) => &n.data,
            Statement::Class(n) => &n.data,
            Statement::Expression(n) => &n.data,
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn range(&self) -> TextRange {
        self.data().range
    }

    pub fn is_module_declaration(&self) -> bool {
        matches!(
            self,
            Statement::Import(_)
                | Statement::ExportDefault(_)
                | Statement::ExportNamed(_)
                | Statement::ExportAll(_)
        )
    }
}

/// An unrecognized top-level statement, kept as a raw literal span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpressionStatement {
    pub data: NodeData,
    pub expression: Expression,
}

// ============================================================================
// Declarations
// ============================================================================

/// A declaration that can follow `export`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Declaration {
    Variable(VariableDeclaration),
    Function(FunctionDeclaration),
    Class(ClassDeclaration),
}

impl Declaration {
    pub fn range(&self) -> TextRange {
        match self {
            Declaration::Variable(n) => n.data.range,
            Declaration::Function(n) => n.data.range,
            Declaration::Class(n) => n.data.range,
        }
    }

    /// Every binding this declaration introduces, in source order.
    pub fn declared_names(&self) -> Vec<&Identifier> {
        match self {
            Declaration::Variable(var) => var.declared_names(),
            Declaration::Function(func) => func.id.iter().collect(),
            Declaration::Class(class) => class.id.iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDeclaration {
    pub data: NodeData,
    pub kind: VariableKind,
    pub declarations: Vec<VariableDeclarator>,
}

impl VariableDeclaration {
    pub fn declared_names(&self) -> Vec<&Identifier> {
        self.declarations
            .iter()
            .flat_map(VariableDeclarator::bound_names)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDeclarator {
    pub data: NodeData,
    pub id: BindingName,
    pub init: Option<Expression>,
}

impl VariableDeclarator {
    pub fn bound_names(&self) -> Vec<&Identifier> {
        match &self.id {
            BindingName::Identifier(id) => vec![id],
            BindingName::Pattern(pattern) => pattern.names.iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum BindingName {
    Identifier(Identifier),
    Pattern(BindingPattern),
}

/// An object or array destructuring target. Only the names it binds are
/// recorded; defaults and computed keys stay in the source span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingPattern {
    pub data: NodeData,
    pub names: Vec<Identifier>,
}

/// Placeholder for a parameter list; covers the raw text between the parens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub data: NodeData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDeclaration {
    pub data: NodeData,
    /// `None` only for `export default function () {}`.
    pub id: Option<Identifier>,
    pub params: Vec<Parameter>,
    pub flags: FunctionFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDeclaration {
    pub data: NodeData,
    /// `None` only for `export default class {}`.
    pub id: Option<Identifier>,
    pub super_class: Option<Expression>,
}

// ============================================================================
// Module declarations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Specifier {
    ImportDefault { local: Identifier },
    ImportNamespace { local: Identifier },
    Import { imported: Identifier, local: Identifier },
    Export { local: Identifier, exported: Identifier },
    ExportNamespace { exported: Identifier },
}

impl Specifier {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            Specifier::ImportDefault { .. } => SyntaxKind::ImportDefaultSpecifier,
            Specifier::ImportNamespace { .. } => SyntaxKind::ImportNamespaceSpecifier,
            Specifier::Import { .. } => SyntaxKind::ImportSpecifier,
            Specifier::Export { .. } => SyntaxKind::ExportSpecifier,
            Specifier::ExportNamespace { .. } => SyntaxKind::ExportNamespaceSpecifier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportDeclaration {
    pub data: NodeData,
    /// Empty for a side-effect import.
    pub specifiers: Vec<Specifier>,
    pub source: StringLiteral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportNamedDeclaration {
    pub data: NodeData,
    pub declaration: Option<Declaration>,
    pub specifiers: Vec<Specifier>,
    pub source: Option<StringLiteral>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportAllDeclaration {
    pub data: NodeData,
    pub source: StringLiteral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DefaultDeclaration {
    Expression(Expression),
    Function(FunctionDeclaration),
    Class(ClassDeclaration),
}

impl DefaultDeclaration {
    pub fn range(&self) -> TextRange {
        match self {
            DefaultDeclaration::Expression(expr) => expr.range(),
            DefaultDeclaration::Function(func) => func.data.range,
            DefaultDeclaration::Class(class) => class.data.range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDefaultDeclaration {
    pub data: NodeData,
    pub declaration: DefaultDeclaration,
}
