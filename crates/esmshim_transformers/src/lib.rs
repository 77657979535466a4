//! esmshim_transformers: ES module to CommonJS rewriting.
//!
//! Two independent paths produce classic-script output:
//! - [`CommonJsTransformer`] rewrites a parsed [`Program`](esmshim_ast::node::Program)
//!   into `require` bindings and `exports` assignments, reordering the
//!   module-level pieces and copying every opaque span verbatim.
//! - [`fallback_transform`] is a lossy line-oriented rewrite used when the
//!   source cannot be parsed.

mod commonjs;
mod fallback;
mod utilities;

pub use commonjs::{CommonJsTransformer, DEFAULT_BINDING, EXPORTS_PREAMBLE};
pub use fallback::fallback_transform;
pub use utilities::{contains_top_level_await, quote_string};
