//! Grammar module registration.
//!
//! A grammar module publishes exactly two values into the exports table its
//! host hands it: the grammar's `name` and an external `language` value that
//! wraps the compiled parse tables. The tables are static data owned by the
//! grammar artifact; this module only forwards a reference to them and never
//! frees or mutates what it points at.
//!
//! [`register`] is the host-independent form used by tests and by hosts that
//! load grammars dynamically. [`init_with`] is the module's initializer for a
//! given factory. `init` binds it to the linked `tree_sitter_sindarin` factory
//! and is exposed as `MODULE`; both exist only with the `parser` feature, which
//! needs the generated `src/parser.c`.

use std::collections::HashMap;
use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{bail, Result};
use tree_sitter_language::LanguageFn;

/// Exports key holding the grammar identifier.
pub const EXPORT_NAME: &str = "name";

/// Exports key holding the external grammar handle.
pub const EXPORT_LANGUAGE: &str = "language";

/// Entry-point name hosts use to find this module's initializer.
pub const MODULE_ENTRY_POINT: &str = "tree_sitter_sindarin_binding";

static NEXT_ENV_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies the [`Env`] that created an external value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvId(u64);

/// Execution environment supplied by the host when a module initializes.
///
/// Values written to an exports table are created through the environment, the
/// same way a host runtime wraps native data for its own consumers.
#[derive(Debug)]
pub struct Env {
    id: EnvId,
}

impl Env {
    /// A fresh environment with its own [`EnvId`].
    pub fn new() -> Self {
        Self {
            id: EnvId(NEXT_ENV_ID.fetch_add(1, Ordering::Relaxed)),
        }
    }

    /// Identifier stamped on every external value this environment creates.
    pub fn id(&self) -> EnvId {
        self.id
    }

    /// Wrap a string for the exports table.
    pub fn create_string(&self, value: &str) -> ExportValue {
        ExportValue::String(value.to_string())
    }

    /// Wrap a grammar handle as an opaque external value owned by this environment.
    pub fn create_external(&self, handle: GrammarHandle) -> ExportValue {
        ExportValue::External(External {
            env: self.id,
            handle,
        })
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque reference to a grammar's compiled parse tables.
///
/// The pointer is borrowed for the life of the process. Two handles are equal
/// when they point at the same tables.
#[derive(Clone, Copy)]
pub struct GrammarHandle {
    factory: unsafe extern "C" fn() -> *const (),
    tables: NonNull<()>,
}

// SAFETY: the tables are immutable static data produced by the grammar
// generator, and the handle never writes through the pointer.
unsafe impl Send for GrammarHandle {}
unsafe impl Sync for GrammarHandle {}

impl GrammarHandle {
    /// Call `factory` and keep the table pointer it returns.
    ///
    /// Returns `None` if the factory yields null.
    pub fn from_factory(factory: LanguageFn) -> Option<Self> {
        let factory = factory.into_raw();
        // SAFETY: grammar factories take no arguments and return a pointer to
        // static tables (or null), which is all a `LanguageFn` may wrap.
        let raw = unsafe { factory() };
        NonNull::new(raw.cast_mut()).map(|tables| Self { factory, tables })
    }

    /// Address of the parse tables.
    pub fn as_ptr(&self) -> *const () {
        self.tables.as_ptr().cast_const()
    }

    /// The factory this handle was produced from.
    pub fn language_fn(&self) -> LanguageFn {
        // SAFETY: `factory` came out of a `LanguageFn` in `from_factory`.
        unsafe { LanguageFn::from_raw(self.factory) }
    }

    /// The handle as a tree-sitter language, ready for `Parser::set_language`.
    pub fn language(&self) -> tree_sitter::Language {
        tree_sitter::Language::new(self.language_fn())
    }
}

impl PartialEq for GrammarHandle {
    fn eq(&self, other: &Self) -> bool {
        self.tables == other.tables
    }
}

impl Eq for GrammarHandle {}

impl fmt::Debug for GrammarHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GrammarHandle").field(&self.tables).finish()
    }
}

/// A host-opaque external value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct External {
    env: EnvId,
    handle: GrammarHandle,
}

impl External {
    /// The environment that created this value.
    pub fn env(&self) -> EnvId {
        self.env
    }

    /// The wrapped grammar handle.
    pub fn handle(&self) -> GrammarHandle {
        self.handle
    }
}

/// A value stored in an exports table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportValue {
    String(String),
    External(External),
}

impl ExportValue {
    /// The string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::External(_) => None,
        }
    }

    /// The external payload, if this is an external value.
    pub fn as_external(&self) -> Option<&External> {
        match self {
            Self::External(external) => Some(external),
            Self::String(_) => None,
        }
    }
}

/// Key/value table a host passes to a module initializer and reads afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exports {
    entries: HashMap<String, ExportValue>,
}

impl Exports {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`, returning the previous value if any.
    pub fn set(&mut self, key: impl Into<String>, value: ExportValue) -> Option<ExportValue> {
        self.entries.insert(key.into(), value)
    }

    /// The value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&ExportValue> {
        self.entries.get(key)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Number of keys in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The published grammar name, if present and a string.
    pub fn name(&self) -> Option<&str> {
        self.get(EXPORT_NAME).and_then(ExportValue::as_str)
    }

    /// The published grammar handle, if present and external.
    pub fn language(&self) -> Option<GrammarHandle> {
        self.get(EXPORT_LANGUAGE)
            .and_then(ExportValue::as_external)
            .map(External::handle)
    }
}

/// Signature of a module initializer.
pub type InitFn = fn(&Env, Exports) -> Result<Exports>;

/// A module as the host's loader sees it: an entry-point name and its initializer.
#[derive(Clone, Copy)]
pub struct ModuleDef {
    pub entry_point: &'static str,
    pub init: InitFn,
}

impl fmt::Debug for ModuleDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDef")
            .field("entry_point", &self.entry_point)
            .finish_non_exhaustive()
    }
}

/// Publish `name` and the handle produced by `factory` into `exports`.
///
/// Only the `name` and `language` keys are written. If the factory yields a
/// null pointer the table is dropped and an error is returned; the host must
/// treat that as a failed module load.
pub fn register_into(
    env: &Env,
    mut exports: Exports,
    name: &str,
    factory: LanguageFn,
) -> Result<Exports> {
    exports.set(EXPORT_NAME, env.create_string(name));

    let Some(handle) = GrammarHandle::from_factory(factory) else {
        bail!("grammar factory for {name} returned a null language");
    };
    exports.set(EXPORT_LANGUAGE, env.create_external(handle));

    tracing::debug!("Registered grammar {} at {:p}", name, handle.as_ptr());
    Ok(exports)
}

/// Build a fresh exports table holding `name` and the handle produced by `factory`.
pub fn register(env: &Env, name: &str, factory: LanguageFn) -> Result<Exports> {
    register_into(env, Exports::new(), name, factory)
}

/// Publish [`NAME`](crate::NAME) and the grammar produced by `factory`.
///
/// This is the body of `init`, for hosts and tests that supply the factory
/// themselves.
pub fn init_with(env: &Env, exports: Exports, factory: LanguageFn) -> Result<Exports> {
    register_into(env, exports, crate::NAME, factory)
}

/// The module initializer: publishes [`NAME`](crate::NAME) and the linked grammar.
///
/// Requires the `parser` feature and the generated `src/parser.c`.
#[cfg(feature = "parser")]
pub fn init(env: &Env, exports: Exports) -> Result<Exports> {
    init_with(env, exports, crate::LANGUAGE)
}

/// This module, as registered with a host loader.
///
/// Requires the `parser` feature and the generated `src/parser.c`.
#[cfg(feature = "parser")]
pub const MODULE: ModuleDef = ModuleDef {
    entry_point: MODULE_ENTRY_POINT,
    init,
};
