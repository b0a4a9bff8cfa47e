use std::path::Path;

fn main() {
    // The generated tables are only compiled when a host asks for the real grammar.
    if std::env::var_os("CARGO_FEATURE_PARSER").is_none() {
        return;
    }

    let src_dir = Path::new("src");
    let parser_path = src_dir.join("parser.c");
    if !parser_path.exists() {
        panic!(
            "feature `parser` requires {}; run `tree-sitter generate` first",
            parser_path.display()
        );
    }

    let mut c_config = cc::Build::new();
    c_config.std("c11").include(src_dir);

    if std::env::var("CARGO_CFG_TARGET_ENV").as_deref() == Ok("msvc") {
        c_config.flag("-utf-8");
    }

    c_config.file(&parser_path);
    println!("cargo:rerun-if-changed={}", parser_path.display());

    let scanner_path = src_dir.join("scanner.c");
    if scanner_path.exists() {
        c_config.file(&scanner_path);
        println!("cargo:rerun-if-changed={}", scanner_path.display());
    }

    c_config.compile("tree-sitter-sindarin");
}
