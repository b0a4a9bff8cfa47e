fn main() {
    // Grammar libraries built by the tests target the same triple as the crate.
    if let Ok(target) = std::env::var("TARGET") {
        println!("cargo:rustc-env=SINDARIN_HOST_TARGET={target}");
    }
    println!("cargo:rerun-if-changed=build.rs");
}
