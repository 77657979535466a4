//! esmshim_scanner: Character-level primitives for module-level parsing.
//!
//! Unlike a full tokenizer, the scanner exposes a cursor over the source text
//! with matching and skipping primitives:
//! - whitespace and comment skipping
//! - atomic literal and keyword matching
//! - identifier, string and number reading
//! - span skipping for blocks, expressions and opaque statements that steps
//!   over strings, templates, comments and regular expression literals

pub mod char_codes;
mod scanner;

pub use scanner::Scanner;
