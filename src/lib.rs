//! Sindarin grammar for tree-sitter
//!
//! This crate makes the compiled Sindarin grammar discoverable by name. It does
//! not parse anything itself: a host reads the grammar's `name` and opaque
//! `language` handle from an exports table and hands the handle to tree-sitter.
//!
//! * [`registrar`]: module registration (`register`, `init`, `MODULE`)
//! * [`highlight`]: highlight configuration built from the bundled queries
//!
//! The generated parse tables are linked only with the `parser` feature, which
//! compiles `src/parser.c` and exposes `LANGUAGE`, `language()`, `init` and
//! `MODULE`:
//!
//! ```ignore
//! let mut parser = tree_sitter::Parser::new();
//! parser.set_language(&tree_sitter_sindarin::language())?;
//! let tree = parser.parse("fn main(): int =>\n  return 0\n", None);
//! ```
//!
//! `src/parser.c` is not checked in. Run `tree-sitter generate` before enabling
//! the feature, or the build fails. Without it, hosts register the grammar
//! through [`register`] or [`init_with`] with a factory they resolve themselves.

use std::path::Path;

pub mod highlight;
pub mod registrar;

#[cfg(feature = "parser")]
pub use registrar::{init, MODULE};
pub use registrar::{
    init_with, register, register_into, Env, EnvId, ExportValue, Exports, External,
    GrammarHandle, InitFn, ModuleDef, EXPORT_LANGUAGE, EXPORT_NAME, MODULE_ENTRY_POINT,
};

/// Name under which the grammar is published to hosts.
pub const NAME: &str = "sindarin";

/// File extensions handled by this grammar.
pub const FILE_EXTENSIONS: &[&str] = &["sn"];

/// Syntax highlighting query.
pub const HIGHLIGHTS_QUERY: &str = include_str!("../queries/highlights.scm");

#[cfg(feature = "parser")]
extern "C" {
    fn tree_sitter_sindarin() -> *const ();
}

/// The tree-sitter [`LanguageFn`](tree_sitter_language::LanguageFn) for this grammar.
#[cfg(feature = "parser")]
pub const LANGUAGE: tree_sitter_language::LanguageFn =
    unsafe { tree_sitter_language::LanguageFn::from_raw(tree_sitter_sindarin) };

/// The grammar as a [`tree_sitter::Language`].
#[cfg(feature = "parser")]
pub fn language() -> tree_sitter::Language {
    tree_sitter::Language::new(LANGUAGE)
}

/// Look up a bundled query by name (`"highlights"`).
///
/// Unknown names yield an empty query rather than an error, so callers can
/// feed the result straight into a query constructor.
pub fn query(name: &str) -> &'static str {
    match name {
        "highlights" => HIGHLIGHTS_QUERY,
        _ => "",
    }
}

/// Whether `path` looks like a Sindarin source file.
pub fn is_sindarin_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FILE_EXTENSIONS.contains(&ext))
}
