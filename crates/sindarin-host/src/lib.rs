//! Host side of grammar module registration.
//!
//! A host discovers grammars by name and keeps the opaque handle each one
//! publishes, to hand to tree-sitter whenever it parses a buffer.
//!
//! * [`module_table`]: runs module initializers once and indexes grammars by name
//! * [`dylib`]: resolves `tree_sitter_<name>` factories from shared libraries
//! * [`config`]: grammar directories and the grammars to load
//! * [`tracing_setup`]: log subscriber for hosts

pub mod config;
pub mod dylib;
mod error;
pub mod module_table;
pub mod tracing_setup;

pub use config::HostConfig;
pub use dylib::{find_library, grammar_symbol, DynamicGrammar};
pub use error::LoadError;
pub use module_table::{GrammarEntry, LoadReport, ModuleTable};

/// Load the statically linked Sindarin grammar into the process-wide table.
#[cfg(feature = "parser")]
pub fn load_builtin() -> Result<GrammarEntry, LoadError> {
    ModuleTable::global().load(&tree_sitter_sindarin::MODULE)
}
