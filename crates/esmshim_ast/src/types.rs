//! Flag types and small enums attached to AST nodes.

use serde::Serialize;
use std::fmt;

bitflags::bitflags! {
    /// Flags inferred from the keywords surrounding a function declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct FunctionFlags: u8 {
        const NONE      = 0;
        const ASYNC     = 1 << 0;
        const GENERATOR = 1 << 1;
    }
}

/// The keyword that introduced a variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

impl VariableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VariableKind::Var => "var",
            VariableKind::Let => "let",
            VariableKind::Const => "const",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
