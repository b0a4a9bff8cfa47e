#[cfg(target_os = "linux")]
#[allow(dead_code)]
pub mod grammar_lib;
pub mod tracing;
