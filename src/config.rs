use std::path::PathBuf;

/// Crate-level constants
pub const ENGINE_NAME: &str = "Veridate";
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "veridate=info".to_string()
}

/// Default rules directory, relative to the working directory. The rule
/// loader degrades to built-in defaults when it does not exist.
pub fn default_rules_dir() -> PathBuf {
    PathBuf::from("rules")
}
