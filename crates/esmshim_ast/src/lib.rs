//! esmshim_ast: Abstract Syntax Tree definitions for module-level ECMAScript.
//!
//! The tree is deliberately flat: a [`Program`] is an ordered list of
//! top-level statements, and anything the module grammar does not model is
//! kept as an opaque span of the original source.

pub mod node;
pub mod syntax_kind;
pub mod types;

// Re-export key types
pub use node::*;
pub use syntax_kind::SyntaxKind;
pub use types::*;
