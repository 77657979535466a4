//! esmshim_parser: Recursive descent parser for module-level ECMAScript.
//!
//! Recognizes imports, exports and top-level declarations. Function and
//! class bodies, initializers and every other statement are recorded as
//! opaque source spans, never parsed into sub-trees.

mod parser;
mod utilities;

pub use parser::{parse_program, Parser};
