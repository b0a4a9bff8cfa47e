//! Grammars loaded from shared libraries at runtime.
//!
//! A grammar library exports one factory, `tree_sitter_<name>`, taking no
//! arguments and returning a pointer to the compiled tables. Only that exact
//! symbol is resolved; there is no fallback lookup.

use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use tree_sitter_language::LanguageFn;

use crate::LoadError;

type LanguageFactory = unsafe extern "C" fn() -> *const ();

/// Factory symbol exported by the grammar called `name`.
pub fn grammar_symbol(name: &str) -> String {
    format!("tree_sitter_{}", name.replace('-', "_"))
}

/// Library file names a grammar called `name` may be installed under.
pub fn library_candidates(name: &str) -> Vec<String> {
    let prefix = std::env::consts::DLL_PREFIX;
    let ext = std::env::consts::DLL_EXTENSION;
    let mut candidates = vec![
        format!("{name}.{ext}"),
        format!("{prefix}{name}.{ext}"),
        format!("tree-sitter-{name}.{ext}"),
        format!("{prefix}tree-sitter-{name}.{ext}"),
    ];
    candidates.dedup();
    candidates
}

/// Search `dirs` in order for the first library file matching `name`.
pub fn find_library(dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
    let candidates = library_candidates(name);
    for dir in dirs {
        for candidate in &candidates {
            let path = dir.join(candidate);
            tracing::trace!("Grammar lookup: trying {}", path.display());
            if path.is_file() {
                tracing::debug!("Found grammar {} at {}", name, path.display());
                return Some(path);
            }
        }
    }
    None
}

/// A grammar library together with its resolved factory.
///
/// The factory pointer is only valid while `library` stays loaded, so whoever
/// publishes handles from it must keep this value alive.
pub struct DynamicGrammar {
    library: Library,
    factory: LanguageFactory,
    path: PathBuf,
    symbol: String,
}

impl DynamicGrammar {
    /// Open the library at `path` and resolve the factory for `name`.
    pub fn open(path: &Path, name: &str) -> Result<Self, LoadError> {
        let symbol = grammar_symbol(name);

        // SAFETY: grammar libraries are plain C objects generated by
        // tree-sitter; loading them runs no initialisers beyond the C runtime's.
        let library = unsafe { Library::new(path) }.map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        // SAFETY: the symbol has the factory signature every generated parser exports.
        let factory = unsafe {
            let factory: Symbol<LanguageFactory> =
                library
                    .get(symbol.as_bytes())
                    .map_err(|source| LoadError::MissingSymbol {
                        path: path.to_path_buf(),
                        symbol: symbol.clone(),
                        source,
                    })?;
            *factory
        };

        tracing::debug!("Resolved {} in {}", symbol, path.display());

        Ok(Self {
            library,
            factory,
            path: path.to_path_buf(),
            symbol,
        })
    }

    pub fn language_fn(&self) -> LanguageFn {
        // SAFETY: `factory` was resolved from a grammar library under the
        // factory signature and `self.library` keeps it mapped.
        unsafe { LanguageFn::from_raw(self.factory) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub(crate) fn into_library(self) -> Library {
        self.library
    }
}

impl std::fmt::Debug for DynamicGrammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicGrammar")
            .field("path", &self.path)
            .field("symbol", &self.symbol)
            .finish_non_exhaustive()
    }
}
