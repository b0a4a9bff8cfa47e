// Loading grammars from real shared libraries
#![cfg(target_os = "linux")]

mod common;

use common::grammar_lib::{build_grammar_library, first_table_word, TABLES_MAGIC};
use sindarin_host::{DynamicGrammar, HostConfig, LoadError, ModuleTable};
use tree_sitter_language::LanguageFn;
use tree_sitter_sindarin::{
    register_into, Env, Exports, GrammarHandle, ModuleDef, EXPORT_LANGUAGE, EXPORT_NAME,
};

static BUILTIN_TABLES: [u64; 4] = [7; 4];

unsafe extern "C" fn builtin_elvish() -> *const () {
    BUILTIN_TABLES.as_ptr().cast()
}

fn init_builtin_elvish(env: &Env, exports: Exports) -> anyhow::Result<Exports> {
    register_into(env, exports, "elvish", unsafe {
        LanguageFn::from_raw(builtin_elvish)
    })
}

const BUILTIN_ELVISH: ModuleDef = ModuleDef {
    entry_point: "tree_sitter_elvish_binding",
    init: init_builtin_elvish,
};

/// Opening a library resolves its `tree_sitter_<name>` factory
#[test]
fn test_open_resolves_factory() {
    common::tracing::init_tracing_from_env();

    let dir = tempfile::tempdir().unwrap();
    let path = build_grammar_library(dir.path(), "elvish");

    let grammar = DynamicGrammar::open(&path, "elvish").unwrap();
    assert_eq!(grammar.symbol(), "tree_sitter_elvish");
    assert_eq!(grammar.path(), path.as_path());

    let handle = GrammarHandle::from_factory(grammar.language_fn()).unwrap();
    assert_eq!(first_table_word(handle), TABLES_MAGIC);
}

/// A library load publishes the grammar under its name
#[test]
fn test_load_library_publishes_grammar() {
    common::tracing::init_tracing_from_env();

    let dir = tempfile::tempdir().unwrap();
    let path = build_grammar_library(dir.path(), "elvish");

    let table = ModuleTable::new();
    let entry = table.load_library(&path, "elvish").unwrap();

    assert_eq!(entry.name, "elvish");
    assert_eq!(entry.entry_point, format!("{}#elvish", path.display()));
    assert_eq!(entry.exports.keys(), vec![EXPORT_LANGUAGE, EXPORT_NAME]);
    assert_eq!(entry.exports.name(), Some("elvish"));
    assert_eq!(entry.exports.language(), Some(entry.handle));
    assert_eq!(first_table_word(entry.handle), TABLES_MAGIC);
    assert_eq!(table.get("elvish"), Some(entry));
}

/// Loading the same library twice returns the cached entry
#[test]
fn test_library_reload_is_cached() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_grammar_library(dir.path(), "elvish");

    let table = ModuleTable::new();
    let first = table.load_library(&path, "elvish").unwrap();
    let second = table.load_library(&path, "elvish").unwrap();

    assert_eq!(first, second);
    assert_eq!(table.len(), 1);
    assert_eq!(table.names(), vec!["elvish"]);
}

/// Handles stay usable after the table that loaded them is gone
#[test]
fn test_handles_outlive_their_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_grammar_library(dir.path(), "elvish");

    let entry = {
        let table = ModuleTable::new();
        table.load_library(&path, "elvish").unwrap()
    };

    assert_eq!(first_table_word(entry.handle), TABLES_MAGIC);
    let again = GrammarHandle::from_factory(entry.handle.language_fn()).unwrap();
    assert_eq!(again, entry.handle);
    assert_eq!(first_table_word(again), TABLES_MAGIC);
}

/// A library cannot take a name a built-in module already holds
#[test]
fn test_library_name_clash_with_builtin_module() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_grammar_library(dir.path(), "elvish");

    let table = ModuleTable::new();
    let builtin = table.load(&BUILTIN_ELVISH).unwrap();
    let err = table.load_library(&path, "elvish").unwrap_err();

    match err {
        LoadError::DuplicateName {
            name,
            entry_point,
            existing,
        } => {
            assert_eq!(name, "elvish");
            assert_eq!(entry_point, format!("{}#elvish", path.display()));
            assert_eq!(existing, "tree_sitter_elvish_binding");
        }
        other => panic!("expected DuplicateName, got {other:?}"),
    }
    assert_eq!(first_table_word(builtin.handle), 7);
    assert_eq!(table.get("elvish"), Some(builtin));
    assert_eq!(table.len(), 1);
}

/// Configured grammars are found in the search dirs and loaded
#[test]
fn test_load_configured_finds_libraries() {
    let empty = tempfile::tempdir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    build_grammar_library(dir.path(), "elvish");
    build_grammar_library(dir.path(), "entish");

    let config = HostConfig {
        grammar_dirs: vec![empty.path().to_path_buf(), dir.path().to_path_buf()],
        grammars: vec!["elvish".to_string(), "entish".to_string()],
    };
    let table = ModuleTable::new();
    let report = table.load_configured(&config);

    assert!(report.failed.is_empty(), "{:?}", report.failed);
    let loaded: Vec<&str> = report.loaded.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(loaded, vec!["elvish", "entish"]);
    assert_ne!(report.loaded[0].handle, report.loaded[1].handle);
    assert_eq!(table.names(), vec!["elvish", "entish"]);
}
