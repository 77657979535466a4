//! SyntaxKind enum - the keywords the module grammar dispatches on and the
//! node kinds it produces.

use serde::Serialize;

/// The kind of a keyword or node in the AST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum SyntaxKind {
    // ========================================================================
    // Keywords
    // ========================================================================
    ImportKeyword,
    ExportKeyword,
    ConstKeyword,
    LetKeyword,
    VarKeyword,
    FunctionKeyword,
    ClassKeyword,
    AsyncKeyword,
    DefaultKeyword,
    FromKeyword,
    AsKeyword,
    ExtendsKeyword,
    AwaitKeyword,

    // ========================================================================
    // Nodes
    // ========================================================================
    Program,
    ImportDeclaration,
    ExportDefaultDeclaration,
    ExportNamedDeclaration,
    ExportAllDeclaration,
    VariableDeclaration,
    VariableDeclarator,
    FunctionDeclaration,
    ClassDeclaration,
    ExpressionStatement,
    Identifier,
    Literal,
    StringLiteral,
    BindingPattern,
    Parameter,
    ImportDefaultSpecifier,
    ImportNamespaceSpecifier,
    ImportSpecifier,
    ExportSpecifier,
    ExportNamespaceSpecifier,
}

/// Keywords that can start a top-level statement, in dispatch priority order.
pub const STATEMENT_KEYWORDS: [SyntaxKind; 7] = [
    SyntaxKind::ImportKeyword,
    SyntaxKind::ExportKeyword,
    SyntaxKind::ConstKeyword,
    SyntaxKind::LetKeyword,
    SyntaxKind::VarKeyword,
    SyntaxKind::FunctionKeyword,
    SyntaxKind::ClassKeyword,
];

impl SyntaxKind {
    /// Get the source text of a keyword kind.
    pub fn keyword_text(self) -> Option<&'static str> {
        match self {
            SyntaxKind::ImportKeyword => Some("import"),
            SyntaxKind::ExportKeyword => Some("export"),
            SyntaxKind::ConstKeyword => Some("const"),
            SyntaxKind::LetKeyword => Some("let"),
            SyntaxKind::VarKeyword => Some("var"),
            SyntaxKind::FunctionKeyword => Some("function"),
            SyntaxKind::ClassKeyword => Some("class"),
            SyntaxKind::AsyncKeyword => Some("async"),
            SyntaxKind::DefaultKeyword => Some("default"),
            SyntaxKind::FromKeyword => Some("from"),
            SyntaxKind::AsKeyword => Some("as"),
            SyntaxKind::ExtendsKeyword => Some("extends"),
            SyntaxKind::AwaitKeyword => Some("await"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_text() {
        assert_eq!(SyntaxKind::ImportKeyword.keyword_text(), Some("import"));
        assert_eq!(SyntaxKind::ExtendsKeyword.keyword_text(), Some("extends"));
        assert_eq!(SyntaxKind::Program.keyword_text(), None);
        assert_eq!(SyntaxKind::Identifier.keyword_text(), None);
    }

    #[test]
    fn test_statement_keyword_priority() {
        assert_eq!(STATEMENT_KEYWORDS[0], SyntaxKind::ImportKeyword);
        assert_eq!(STATEMENT_KEYWORDS[1], SyntaxKind::ExportKeyword);
        assert_eq!(
            STATEMENT_KEYWORDS[2..5],
            [SyntaxKind::ConstKeyword, SyntaxKind::LetKeyword, SyntaxKind::VarKeyword]
        );
        assert_eq!(STATEMENT_KEYWORDS[6], SyntaxKind::ClassKeyword);
    }
}
