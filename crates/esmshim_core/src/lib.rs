//! esmshim_core: Core utilities shared by every esmshim crate.
//!
//! Provides byte-offset text ranges and line maps used to locate AST nodes
//! and diagnostics in module source text.

pub mod text;

// Re-export commonly used types
pub use text::{LineAndColumn, LineMap, TextPos, TextRange, TextSpan};
