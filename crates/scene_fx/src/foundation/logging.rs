//! Logging setup
//!
//! The crate logs through the `log` facade; binaries pick the backend.

/// Initialize `env_logger` from `RUST_LOG`, showing warnings when it is unset
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    init_with_default_filter("warn");
}

/// Initialize `env_logger` from `RUST_LOG`, falling back to `filter`
pub fn init_with_default_filter(filter: &str) {
    let env = env_logger::Env::default().default_filter_or(filter);
    if env_logger::Builder::from_env(env).try_init().is_ok() {
        log::debug!("Logging initialized");
    }
}
