//! Grammar shared libraries compiled at test time.

use std::path::{Path, PathBuf};

use sindarin_host::grammar_symbol;
use tree_sitter_sindarin::GrammarHandle;

/// First word of the tables every built library returns.
pub const TABLES_MAGIC: u64 = 42;

/// Compile `lib<name>.so` into `dir`, exporting the factory `tree_sitter_<name>`.
///
/// The factory returns static tables whose first word is [`TABLES_MAGIC`].
pub fn build_grammar_library(dir: &Path, name: &str) -> PathBuf {
    let symbol = grammar_symbol(name);
    let source = dir.join(format!("{symbol}.c"));
    std::fs::write(
        &source,
        format!(
            "static const unsigned long long tables[4] = {{{TABLES_MAGIC}ULL, 0, 0, 0}};\n\
             const void *{symbol}(void) {{ return tables; }}\n"
        ),
    )
    .unwrap();

    let library = dir.join(format!(
        "{}{}.{}",
        std::env::consts::DLL_PREFIX,
        name,
        std::env::consts::DLL_EXTENSION
    ));

    let target = env!("SINDARIN_HOST_TARGET");
    let compiler = cc::Build::new()
        .cargo_metadata(false)
        .opt_level(0)
        .debug(false)
        .warnings(false)
        .host(target)
        .target(target)
        .get_compiler();
    let output = compiler
        .to_command()
        .arg("-shared")
        .arg("-fPIC")
        .arg("-o")
        .arg(&library)
        .arg(&source)
        .output()
        .expect("failed to run the C compiler");
    assert!(
        output.status.success(),
        "compiling {} failed: {}",
        source.display(),
        String::from_utf8_lossy(&output.stderr)
    );

    library
}

/// Read the first word of the tables behind `handle`.
pub fn first_table_word(handle: GrammarHandle) -> u64 {
    // SAFETY: every library from `build_grammar_library` returns at least
    // four aligned u64 words.
    unsafe { *handle.as_ptr().cast::<u64>() }
}
