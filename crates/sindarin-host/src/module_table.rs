//! Process-wide table of loaded grammar modules.
//!
//! The table upholds the loader invariants hosts rely on when several grammars
//! share a process:
//! - a module's initializer runs at most once; later loads return the cached entry
//! - an entry is published only after its exports validate
//! - grammar names are unique across modules
//! - a shared library that published a grammar is never unloaded
//!
//! Initializers run while the write lock is held, so grammar factories are never
//! called concurrently through this table.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use anyhow::Result as AnyhowResult;
use libloading::Library;
use once_cell::sync::Lazy;
use tree_sitter_sindarin::{register, Env, Exports, GrammarHandle, ModuleDef};

use crate::config::HostConfig;
use crate::dylib::{find_library, DynamicGrammar};
use crate::LoadError;

static GLOBAL: Lazy<ModuleTable> = Lazy::new(ModuleTable::new);

/// A grammar published by a successfully loaded module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarEntry {
    pub name: String,
    pub entry_point: String,
    pub handle: GrammarHandle,
    pub exports: Exports,
}

struct LoadedModule {
    entry: GrammarEntry,
    // Leaked once published: handles point into it and outlive the table.
    _library: Option<&'static Library>,
}

#[derive(Default)]
struct TableState {
    modules: HashMap<String, LoadedModule>,
    /// Grammar name -> entry point that registered it
    names: HashMap<String, String>,
}

/// Outcome of loading every grammar named in a [`HostConfig`].
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<GrammarEntry>,
    pub failed: Vec<(String, LoadError)>,
}

/// Loaded grammar modules, keyed by entry point, with a unique-name index.
pub struct ModuleTable {
    env: Env,
    state: RwLock<TableState>,
}

impl ModuleTable {
    /// An empty table with its own [`Env`].
    pub fn new() -> Self {
        Self {
            env: Env::new(),
            state: RwLock::new(TableState::default()),
        }
    }

    /// The table shared by the whole process.
    pub fn global() -> &'static ModuleTable {
        &GLOBAL
    }

    /// The environment handed to every initializer run by this table.
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Load a module, running its initializer if it has not run before.
    pub fn load(&self, def: &ModuleDef) -> Result<GrammarEntry, LoadError> {
        self.load_with(def.entry_point, None, |env| (def.init)(env, Exports::new()))
    }

    /// Load the grammar `name` from the shared library at `path`.
    ///
    /// A library that publishes a grammar stays loaded for the rest of the
    /// process, even after this table is dropped. A library whose load fails
    /// is closed again.
    pub fn load_library(&self, path: &Path, name: &str) -> Result<GrammarEntry, LoadError> {
        let entry_point = format!("{}#{}", path.display(), name);
        if let Some(entry) = self.cached(&entry_point) {
            return Ok(entry);
        }

        let grammar = DynamicGrammar::open(path, name)?;
        let factory = grammar.language_fn();
        self.load_with(&entry_point, Some(grammar.into_library()), |env| {
            register(env, name, factory)
        })
    }

    /// Find and load each grammar listed in `config`.
    ///
    /// A failing grammar is logged and reported; it does not stop the others.
    pub fn load_configured(&self, config: &HostConfig) -> LoadReport {
        let mut report = LoadReport::default();
        for name in &config.grammars {
            let result = match find_library(&config.grammar_dirs, name) {
                Some(path) => self.load_library(&path, name),
                None => Err(LoadError::NotFound {
                    name: name.clone(),
                    searched: config.grammar_dirs.clone(),
                }),
            };
            match result {
                Ok(entry) => report.loaded.push(entry),
                Err(e) => {
                    tracing::warn!("Failed to load grammar {}: {}", name, e);
                    report.failed.push((name.clone(), e));
                }
            }
        }
        report
    }

    /// Look up a loaded grammar by name.
    pub fn get(&self, name: &str) -> Option<GrammarEntry> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let entry_point = state.names.get(name)?;
        state.modules.get(entry_point).map(|m| m.entry.clone())
    }

    /// Names of all loaded grammars, sorted.
    pub fn names(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = state.names.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of loaded modules.
    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .modules
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, entry_point: &str) -> Option<GrammarEntry> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.modules.get(entry_point).map(|m| m.entry.clone())
    }

    fn load_with(
        &self,
        entry_point: &str,
        library: Option<Library>,
        init: impl FnOnce(&Env) -> AnyhowResult<Exports>,
    ) -> Result<GrammarEntry, LoadError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(loaded) = state.modules.get(entry_point) {
            tracing::debug!("Module {} already loaded", entry_point);
            return Ok(loaded.entry.clone());
        }

        let exports = init(&self.env).map_err(|e| LoadError::Init {
            entry_point: entry_point.to_string(),
            message: format!("{e:#}"),
        })?;
        let (name, handle) = validate_exports(entry_point, &exports)?;

        if let Some(existing) = state.names.get(&name) {
            return Err(LoadError::DuplicateName {
                name,
                entry_point: entry_point.to_string(),
                existing: existing.clone(),
            });
        }

        let entry = GrammarEntry {
            name: name.clone(),
            entry_point: entry_point.to_string(),
            handle,
            exports,
        };
        let library: Option<&'static Library> = library.map(|lib| &*Box::leak(Box::new(lib)));
        state.names.insert(name, entry_point.to_string());
        state.modules.insert(
            entry_point.to_string(),
            LoadedModule {
                entry: entry.clone(),
                _library: library,
            },
        );

        tracing::info!("Loaded grammar {} from {}", entry.name, entry_point);
        Ok(entry)
    }
}

impl Default for ModuleTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that `exports` holds exactly a string `name` and an external `language`.
fn validate_exports(
    entry_point: &str,
    exports: &Exports,
) -> Result<(String, GrammarHandle), LoadError> {
    let malformed = |reason: String| LoadError::MalformedExports {
        entry_point: entry_point.to_string(),
        reason,
    };

    let name = exports
        .name()
        .ok_or_else(|| malformed("missing string `name`".to_string()))?;
    if name.is_empty() {
        return Err(malformed("empty `name`".to_string()));
    }
    let handle = exports
        .language()
        .ok_or_else(|| malformed("missing external `language`".to_string()))?;
    if exports.len() != 2 {
        return Err(malformed(format!("unexpected keys {:?}", exports.keys())));
    }

    Ok((name.to_string(), handle))
}
